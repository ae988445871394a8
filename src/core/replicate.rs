use crate::core::{AtUri, EventSink, Identity, MigrationEvent, Pacing, RecordApi, ReplicationResult};
use crate::domain::model::{ListItemRecord, Progress, LIST_ITEM_COLLECTION};
use crate::utils::error::{MigrateError, Result};
use crate::utils::time::utc_now_timestamp;
use std::time::Duration;

/// 逐一把成員加入目的地清單。
///
/// 單筆失敗只記警告並計數，不重試也不中斷；每處理完一筆就回報進度。
/// 回傳值的 `added + failed` 必等於 `members.len()`。
pub async fn add_members<A: RecordApi + ?Sized>(
    api: &A,
    owner: &Identity,
    list: &AtUri,
    members: &[String],
    pacing: &Pacing,
    sink: &mut dyn EventSink,
) -> ReplicationResult {
    let total = members.len();
    let mut result = ReplicationResult::default();

    tracing::info!(
        "🚀 Starting to add {} members to {}. This may take a while...",
        total,
        list
    );

    for (index, did) in members.iter().enumerate() {
        match add_member(api, owner, list, did).await {
            Ok(()) => {
                result.added += 1;
                pause(pacing.success_delay).await;
            }
            Err(e) => {
                result.failed += 1;
                let err = MigrateError::member_add(did.as_str(), e);
                tracing::warn!("⚠️ {}", err);
                sink.emit(MigrationEvent::MemberFailed {
                    did: did.clone(),
                    message: err.to_string(),
                });
                // 失敗多半是被限流，等久一點
                pause(pacing.failure_delay).await;
            }
        }

        sink.emit(MigrationEvent::Progress(Progress {
            processed: index + 1,
            total,
            failed: result.failed,
        }));
    }

    result
}

async fn add_member<A: RecordApi + ?Sized>(
    api: &A,
    owner: &Identity,
    list: &AtUri,
    did: &str,
) -> Result<()> {
    let record = ListItemRecord::new(did, list, utc_now_timestamp());
    let payload = serde_json::to_value(&record)?;
    let created = api
        .create_record(&owner.did, LIST_ITEM_COLLECTION, payload)
        .await?;
    tracing::debug!("Added {} as {}", did, created.uri);
    Ok(())
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
