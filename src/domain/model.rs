use crate::utils::error::{MigrateError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const LIST_COLLECTION: &str = "app.bsky.graph.list";
pub const LIST_ITEM_COLLECTION: &str = "app.bsky.graph.listitem";
pub const PURPOSE_NAMESPACE: &str = "app.bsky.graph.defs#";

pub const MAX_LIST_NAME_CHARS: usize = 64;
pub const MAX_LIST_DESCRIPTION_CHARS: usize = 300;

/// 登入後取得的帳號身分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub handle: String,
    pub did: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Source,
    Destination,
}

impl AccountRole {
    pub fn label(&self) -> &'static str {
        match self {
            AccountRole::Source => "Source Account",
            AccountRole::Destination => "Destination Account",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 遷移流程的各個階段，依執行順序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SourceLogin,
    FetchMembers,
    DestinationLogin,
    CreateList,
    AddMembers,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::SourceLogin => "Source Account login",
            Stage::FetchMembers => "Fetch source list members",
            Stage::DestinationLogin => "Destination Account login",
            Stage::CreateList => "Create destination list",
            Stage::AddMembers => "Add members",
        }
    }

    pub fn login_for(role: AccountRole) -> Self {
        match role {
            AccountRole::Source => Stage::SourceLogin,
            AccountRole::Destination => Stage::DestinationLogin,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `at://<authority>/<collection>/<rkey>` 形式的 record 參照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtUri {
    authority: String,
    collection: String,
    rkey: String,
}

impl AtUri {
    pub fn new(
        authority: impl Into<String>,
        collection: impl Into<String>,
        rkey: impl Into<String>,
    ) -> Self {
        Self {
            authority: authority.into(),
            collection: collection.into(),
            rkey: rkey.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn rkey(&self) -> &str {
        &self.rkey
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.authority, self.collection, self.rkey)
    }
}

impl FromStr for AtUri {
    type Err = MigrateError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason: &str| MigrateError::InvalidListReference {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let rest = value
            .trim()
            .strip_prefix("at://")
            .ok_or_else(|| invalid("expected an at:// URI"))?;

        let parts: Vec<&str> = rest.split('/').collect();
        match parts.as_slice() {
            [authority, collection, rkey]
                if !authority.is_empty() && !collection.is_empty() && !rkey.is_empty() =>
            {
                Ok(Self::new(*authority, *collection, *rkey))
            }
            _ => Err(invalid("expected at://<authority>/<collection>/<rkey>")),
        }
    }
}

impl Serialize for AtUri {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AtUri {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 使用者提供的來源清單：AT URI 或 bsky.app 網頁網址
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListReference {
    AtUri(AtUri),
    /// 網頁網址裡的 authority 可能是 handle，需要再解析成 DID
    Web { authority: String, rkey: String },
}

impl ListReference {
    /// 若 authority 已是 DID 則不需要網路請求
    pub fn as_at_uri(&self) -> Option<AtUri> {
        match self {
            ListReference::AtUri(uri) => Some(uri.clone()),
            ListReference::Web { authority, rkey } if authority.starts_with("did:") => {
                Some(AtUri::new(authority.as_str(), LIST_COLLECTION, rkey.as_str()))
            }
            ListReference::Web { .. } => None,
        }
    }
}

impl fmt::Display for ListReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListReference::AtUri(uri) => write!(f, "{}", uri),
            ListReference::Web { authority, rkey } => {
                write!(f, "https://bsky.app/profile/{}/lists/{}", authority, rkey)
            }
        }
    }
}

impl FromStr for ListReference {
    type Err = MigrateError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.starts_with("at://") {
            return Ok(ListReference::AtUri(trimmed.parse()?));
        }

        let re = Regex::new(r"^https?://(?:www\.)?bsky\.app/profile/([^/]+)/lists/([^/?#]+)/?(?:[?#].*)?$")
            .map_err(|e| MigrateError::InvalidListReference {
                value: value.to_string(),
                reason: e.to_string(),
            })?;

        match re.captures(trimmed) {
            Some(caps) => Ok(ListReference::Web {
                authority: caps[1].to_string(),
                rkey: caps[2].to_string(),
            }),
            None => Err(MigrateError::InvalidListReference {
                value: value.to_string(),
                reason: "expected an at:// URI or a https://bsky.app/profile/<handle>/lists/<id> URL"
                    .to_string(),
            }),
        }
    }
}

/// 清單用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ListPurpose {
    #[default]
    #[cfg_attr(feature = "cli", value(name = "curatelist"))]
    Curatelist,
    #[cfg_attr(feature = "cli", value(name = "modlist"))]
    Modlist,
    #[cfg_attr(feature = "cli", value(name = "referencelist"))]
    Referencelist,
}

impl ListPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListPurpose::Curatelist => "curatelist",
            ListPurpose::Modlist => "modlist",
            ListPurpose::Referencelist => "referencelist",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ListPurpose::Curatelist => "Curation List",
            ListPurpose::Modlist => "Moderation List",
            ListPurpose::Referencelist => "Reference List",
        }
    }
}

impl fmt::Display for ListPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListPurpose {
    type Err = MigrateError;

    fn from_str(value: &str) -> Result<Self> {
        let tag = value.trim();
        match tag.strip_prefix(PURPOSE_NAMESPACE).unwrap_or(tag) {
            "curatelist" => Ok(ListPurpose::Curatelist),
            "modlist" => Ok(ListPurpose::Modlist),
            "referencelist" => Ok(ListPurpose::Referencelist),
            _ => Err(MigrateError::InvalidConfigValueError {
                field: "destination.list.purpose".to_string(),
                value: value.to_string(),
                reason: "Expected one of: curatelist, modlist, referencelist".to_string(),
            }),
        }
    }
}

/// 補上 `app.bsky.graph.defs#` 命名空間；已帶前綴者原樣回傳
pub fn normalize_purpose(raw: &str) -> String {
    if raw.starts_with(PURPOSE_NAMESPACE) {
        raw.to_string()
    } else {
        format!("{}{}", PURPOSE_NAMESPACE, raw)
    }
}

/// 目的地清單的名稱、描述與用途，建立後不再變動
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMetadata {
    pub name: String,
    pub description: String,
    pub purpose: String,
}

impl ListMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            purpose: purpose.into(),
        }
    }
}

/// `app.bsky.graph.list` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub name: String,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
}

impl ListRecord {
    pub fn new(metadata: &ListMetadata, created_at: String) -> Self {
        Self {
            record_type: LIST_COLLECTION.to_string(),
            name: metadata.name.clone(),
            purpose: normalize_purpose(&metadata.purpose),
            description: Some(metadata.description.clone()).filter(|d| !d.is_empty()),
            created_at,
        }
    }
}

/// `app.bsky.graph.listitem` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub subject: String,
    pub list: AtUri,
    pub created_at: String,
}

impl ListItemRecord {
    pub fn new(subject: impl Into<String>, list: &AtUri, created_at: String) -> Self {
        Self {
            record_type: LIST_ITEM_COLLECTION.to_string(),
            subject: subject.into(),
            list: list.clone(),
            created_at,
        }
    }
}

/// getList 的一頁結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub members: Vec<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRecord {
    pub uri: AtUri,
    pub cid: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationResult {
    pub added: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub found: usize,
    pub added: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub failed: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Adding members ({}/{})... {} failed.",
            self.processed, self.total, self.failed
        )
    }
}

/// 推送給輸出端 (CLI、log、UI) 的遷移事件
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    StageStarted { stage: Stage, detail: String },
    StageSucceeded { stage: Stage, detail: String },
    StageFailed { stage: Stage, message: String },
    MemberFailed { did: String, message: String },
    Progress(Progress),
    NothingToAdd,
    Finished(MigrationOutcome),
}

/// 固定間隔的節流設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub page_delay: Duration,
    pub success_delay: Duration,
    pub failure_delay: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            page_delay: Duration::ZERO,
            success_delay: Duration::ZERO,
            failure_delay: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(100),
            success_delay: Duration::from_millis(200),
            failure_delay: Duration::from_millis(1000),
        }
    }
}
