use crate::domain::model::{AccountRole, Stage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("XRPC call failed with status {status}: {}", xrpc_detail(.error, .message))]
    XrpcError {
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid list reference '{value}': {reason}")]
    InvalidListReference { value: String, reason: String },

    #[error("No active session, login first")]
    SessionMissing,

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Login failed for {account}: {source}")]
    AuthenticationError {
        account: AccountRole,
        #[source]
        source: Box<MigrateError>,
    },

    #[error("Error fetching list members from {list}: {source}")]
    FetchError {
        list: String,
        #[source]
        source: Box<MigrateError>,
    },

    #[error("Error creating new list '{name}': {source}")]
    CreateError {
        name: String,
        #[source]
        source: Box<MigrateError>,
    },

    #[error("Failed to add member {did}: {source}")]
    MemberAddError {
        did: String,
        #[source]
        source: Box<MigrateError>,
    },
}

pub type Result<T> = std::result::Result<T, MigrateError>;

fn xrpc_detail<'a>(error: &'a Option<String>, message: &'a Option<String>) -> &'a str {
    message
        .as_deref()
        .or(error.as_deref())
        .unwrap_or("no error body")
}

impl MigrateError {
    /// 包裝成登入錯誤，保留是哪個帳號失敗
    pub fn authentication(account: AccountRole, source: MigrateError) -> Self {
        Self::AuthenticationError {
            account,
            source: Box::new(source),
        }
    }

    pub fn fetch(list: impl Into<String>, source: MigrateError) -> Self {
        Self::FetchError {
            list: list.into(),
            source: Box::new(source),
        }
    }

    pub fn create(name: impl Into<String>, source: MigrateError) -> Self {
        Self::CreateError {
            name: name.into(),
            source: Box::new(source),
        }
    }

    pub fn member_add(did: impl Into<String>, source: MigrateError) -> Self {
        Self::MemberAddError {
            did: did.into(),
            source: Box::new(source),
        }
    }

    /// 伺服器回報 access token 已過期
    pub fn is_expired_token(&self) -> bool {
        matches!(self, Self::XrpcError { error: Some(error), .. } if error == "ExpiredToken")
    }

    /// 錯誤發生在哪個遷移階段 (設定錯誤則為 None)
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::AuthenticationError { account, .. } => Some(match account {
                AccountRole::Source => Stage::SourceLogin,
                AccountRole::Destination => Stage::DestinationLogin,
            }),
            Self::FetchError { .. } | Self::InvalidListReference { .. } => {
                Some(Stage::FetchMembers)
            }
            Self::CreateError { .. } => Some(Stage::CreateList),
            Self::MemberAddError { .. } => Some(Stage::AddMembers),
            _ => None,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigValidationError { .. }
                | Self::InvalidConfigValueError { .. }
                | Self::MissingConfigError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self.stage() {
            Some(stage) => format!("{} failed: {}", stage, self),
            None if self.is_config_error() => format!("Invalid input: {}", self),
            None => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AuthenticationError { .. } => {
                "Check the handle and use an App Password from Settings -> App Passwords, never the main password"
            }
            Self::FetchError { .. } | Self::InvalidListReference { .. } => {
                "Make sure the source list is an at:// URI or a bsky.app list URL the source account can see"
            }
            Self::CreateError { .. } => {
                "Check the list name and description limits, then retry; nothing was added yet"
            }
            Self::MemberAddError { .. } => "The member was skipped, add it manually if needed",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Fix the flag or the config file value and run again"
            }
            Self::HttpError(_) => "Check the network connection and the service URL",
            _ => "Run again with --verbose for more details",
        }
    }

    /// 依失敗階段決定行程結束碼
    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() {
            return 2;
        }
        match self.stage() {
            Some(Stage::SourceLogin) | Some(Stage::DestinationLogin) => 3,
            Some(Stage::FetchMembers) => 4,
            Some(Stage::CreateList) => 5,
            _ => 1,
        }
    }
}
