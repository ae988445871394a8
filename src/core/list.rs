use crate::core::{AtUri, Identity, ListMetadata, RecordApi};
use crate::domain::model::{ListRecord, LIST_COLLECTION};
use crate::utils::error::{MigrateError, Result};
use crate::utils::time::utc_now_timestamp;

/// 在目的地帳號的 repo 建立一筆新的清單 record，回傳其 AT URI
pub async fn create_list<A: RecordApi + ?Sized>(
    api: &A,
    owner: &Identity,
    metadata: &ListMetadata,
) -> Result<AtUri> {
    let record = ListRecord::new(metadata, utc_now_timestamp());
    tracing::debug!(
        "Creating list '{}' ({}) in repo {}",
        record.name,
        record.purpose,
        owner.did
    );

    let payload = serde_json::to_value(&record)
        .map_err(|e| MigrateError::create(metadata.name.as_str(), e.into()))?;

    let created = api
        .create_record(&owner.did, LIST_COLLECTION, payload)
        .await
        .map_err(|e| MigrateError::create(metadata.name.as_str(), e))?;

    tracing::info!("✅ Successfully created new list: {}", created.uri);
    Ok(created.uri)
}
