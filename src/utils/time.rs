use chrono::{DateTime, SecondsFormat, Utc};

/// 產生 record 用的 createdAt：UTC、不含小數秒、以 `Z` 結尾
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_now_timestamp() -> String {
    format_timestamp(Utc::now())
}
