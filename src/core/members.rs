use crate::core::{AtUri, ListReference, RecordApi};
use crate::domain::model::LIST_COLLECTION;
use crate::utils::error::{MigrateError, Result};
use std::time::Duration;

/// getList 每頁最多筆數
pub const PAGE_LIMIT: u32 = 100;

/// 將使用者給的清單參照轉成 AT URI；網頁網址中的 handle 透過 resolveHandle 換成 DID
pub async fn resolve_list_reference<A: RecordApi + ?Sized>(
    api: &A,
    reference: &ListReference,
) -> Result<AtUri> {
    if let Some(uri) = reference.as_at_uri() {
        return Ok(uri);
    }

    match reference {
        ListReference::Web { authority, rkey } => {
            tracing::debug!("Resolving handle {} for list {}", authority, rkey);
            let did = api
                .resolve_handle(authority)
                .await
                .map_err(|e| MigrateError::fetch(reference.to_string(), e))?;
            Ok(AtUri::new(did, LIST_COLLECTION, rkey.as_str()))
        }
        ListReference::AtUri(uri) => Ok(uri.clone()),
    }
}

/// 以 cursor 分頁讀完整份清單，依伺服器回傳順序累積成員 DID。
///
/// 沒有 cursor 或拿到空頁即停止；任何一頁失敗都會放棄整份結果。
pub async fn list_members<A: RecordApi + ?Sized>(
    api: &A,
    list: &AtUri,
    page_delay: Duration,
) -> Result<Vec<String>> {
    let mut members = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = api
            .get_list_page(list, cursor.as_deref(), PAGE_LIMIT)
            .await
            .map_err(|e| MigrateError::fetch(list.to_string(), e))?;
        pages += 1;

        if page.members.is_empty() {
            break;
        }

        tracing::debug!(
            "Page {} returned {} members (cursor: {:?})",
            pages,
            page.members.len(),
            page.cursor
        );
        members.extend(page.members);

        match page.cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }

        // 對 API 客氣一點
        if !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }
    }

    tracing::info!("📋 Found {} members in {} page(s)", members.len(), pages);
    Ok(members)
}
