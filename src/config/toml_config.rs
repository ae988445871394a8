use crate::adapters::xrpc::DEFAULT_SERVICE;
use crate::core::{AccountRole, ConfigProvider, ListMetadata, ListReference, Pacing};
use crate::domain::model::{ListPurpose, MAX_LIST_DESCRIPTION_CHARS, MAX_LIST_NAME_CHARS};
use crate::utils::error::{MigrateError, Result};
use crate::utils::validation::{
    validate_max_chars, validate_non_empty_string, validate_range, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// 不會出現在 Debug 輸出裡的字串 (App Password)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"<redacted>\"")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub service: Option<String>,
    pub handle: Option<String>,
    pub app_password: Option<SecretString>,
    pub list: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub service: Option<String>,
    pub handle: Option<String>,
    pub app_password: Option<SecretString>,
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_success_delay_ms")]
    pub success_delay_ms: u64,
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_page_delay_ms() -> u64 {
    100
}

fn default_success_delay_ms() -> u64 {
    200
}

fn default_failure_delay_ms() -> u64 {
    1000
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            success_delay_ms: default_success_delay_ms(),
            failure_delay_ms: default_failure_delay_ms(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MigrateError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MigrateError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SOURCE_APP_PASSWORD})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MigrateError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn account_fields(
        &self,
        role: AccountRole,
    ) -> (&Option<String>, &Option<String>, &Option<SecretString>) {
        match role {
            AccountRole::Source => (
                &self.source.service,
                &self.source.handle,
                &self.source.app_password,
            ),
            AccountRole::Destination => (
                &self.destination.service,
                &self.destination.handle,
                &self.destination.app_password,
            ),
        }
    }

    fn validate_account(&self, role: AccountRole) -> Result<()> {
        let prefix = match role {
            AccountRole::Source => "source",
            AccountRole::Destination => "destination",
        };
        let (service, handle, password) = self.account_fields(role);

        if let Some(service) = service {
            validate_url(&format!("{}.service", prefix), service)?;
        }

        let handle_field = format!("{}.handle", prefix);
        let handle = validate_required_field(&handle_field, handle)?;
        validate_non_empty_string(&handle_field, handle)?;

        let password_field = format!("{}.app_password", prefix);
        let password = validate_required_field(&password_field, password)?;
        validate_non_empty_string(&password_field, password.expose())?;
        if password.expose().starts_with("${") {
            // 環境變數沒設定，替換後仍是佔位字串
            return Err(MigrateError::MissingConfigError {
                field: format!("{} (environment variable {})", password_field, password.expose()),
            });
        }

        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.validate_account(AccountRole::Source)?;
        self.validate_account(AccountRole::Destination)?;

        let list = validate_required_field("source.list", &self.source.list)?;
        validate_non_empty_string("source.list", list)?;
        list.parse::<ListReference>()
            .map_err(|e| MigrateError::InvalidConfigValueError {
                field: "source.list".to_string(),
                value: list.clone(),
                reason: e.to_string(),
            })?;

        let name = validate_required_field("destination.list.name", &self.destination.list.name)?;
        validate_non_empty_string("destination.list.name", name)?;
        validate_max_chars("destination.list.name", name, MAX_LIST_NAME_CHARS)?;

        if let Some(description) = &self.destination.list.description {
            validate_max_chars(
                "destination.list.description",
                description,
                MAX_LIST_DESCRIPTION_CHARS,
            )?;
        }

        if let Some(purpose) = &self.destination.list.purpose {
            purpose.parse::<ListPurpose>()?;
        }

        validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 600)?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn service_url(&self, role: AccountRole) -> &str {
        self.account_fields(role).0.as_deref().unwrap_or(DEFAULT_SERVICE)
    }

    fn handle(&self, role: AccountRole) -> &str {
        self.account_fields(role).1.as_deref().unwrap_or_default()
    }

    fn app_password(&self, role: AccountRole) -> &str {
        self.account_fields(role)
            .2
            .as_ref()
            .map(SecretString::expose)
            .unwrap_or_default()
    }

    fn source_list(&self) -> &str {
        self.source.list.as_deref().unwrap_or_default()
    }

    fn list_metadata(&self) -> ListMetadata {
        let list = &self.destination.list;
        ListMetadata::new(
            list.name.clone().unwrap_or_default(),
            list.description.clone().unwrap_or_default(),
            list.purpose
                .clone()
                .unwrap_or_else(|| ListPurpose::default().to_string()),
        )
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            page_delay: Duration::from_millis(self.pacing.page_delay_ms),
            success_delay: Duration::from_millis(self.pacing.success_delay_ms),
            failure_delay: Duration::from_millis(self.pacing.failure_delay_ms),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
