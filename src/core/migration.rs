use crate::core::auth::authenticate;
use crate::core::list::create_list;
use crate::core::members::{list_members, resolve_list_reference};
use crate::core::replicate::add_members;
use crate::core::{
    AccountRole, AtUri, ConfigProvider, EventSink, Identity, ListMetadata, ListReference,
    MigrationEvent, MigrationOutcome, Pacing, RecordApi, Stage,
};
use crate::utils::error::Result;
use std::fmt;
use std::future::Future;

/// 一個帳號的登入資訊
#[derive(Clone)]
pub struct Credentials {
    pub handle: String,
    pub app_password: String,
}

impl Credentials {
    pub fn new(handle: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            app_password: app_password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("handle", &self.handle)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// 一次遷移所需的全部輸入
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub source: Credentials,
    pub source_list: ListReference,
    pub destination: Credentials,
    pub metadata: ListMetadata,
}

impl MigrationRequest {
    /// 從已驗證的設定組出請求
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self {
            source: Credentials::new(
                config.handle(AccountRole::Source),
                config.app_password(AccountRole::Source),
            ),
            source_list: config.source_list().parse()?,
            destination: Credentials::new(
                config.handle(AccountRole::Destination),
                config.app_password(AccountRole::Destination),
            ),
            metadata: config.list_metadata(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    pub source: Identity,
    pub destination: Identity,
    pub list: AtUri,
}

/// 依序執行：來源登入 → 讀取成員 → 目的地登入 → 建立清單 → 加入成員
pub struct MigrationEngine<A: RecordApi> {
    source: A,
    destination: A,
    pacing: Pacing,
}

impl<A: RecordApi> MigrationEngine<A> {
    pub fn new(source: A, destination: A) -> Self {
        Self {
            source,
            destination,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn destination(&self) -> &A {
        &self.destination
    }

    pub async fn run(
        &self,
        request: &MigrationRequest,
        sink: &mut dyn EventSink,
    ) -> Result<MigrationReport> {
        tracing::info!("Starting list migration...");

        // 1. 登入來源帳號
        let source = run_stage(
            sink,
            Stage::SourceLogin,
            format!("Attempting login for {}...", request.source.handle),
            authenticate(
                &self.source,
                AccountRole::Source,
                &request.source.handle,
                &request.source.app_password,
            ),
            |identity: &Identity| format!("Logged in as {} ({})", identity.handle, identity.did),
        )
        .await?;

        // 2. 讀取來源清單成員
        let members = run_stage(
            sink,
            Stage::FetchMembers,
            format!("Fetching members from list {}...", request.source_list),
            async {
                let list = resolve_list_reference(&self.source, &request.source_list).await?;
                list_members(&self.source, &list, self.pacing.page_delay).await
            },
            |members: &Vec<String>| format!("Found {} members in the source list.", members.len()),
        )
        .await?;

        // 3. 登入目的地帳號
        let destination = run_stage(
            sink,
            Stage::DestinationLogin,
            format!("Attempting login for {}...", request.destination.handle),
            authenticate(
                &self.destination,
                AccountRole::Destination,
                &request.destination.handle,
                &request.destination.app_password,
            ),
            |identity: &Identity| format!("Logged in as {} ({})", identity.handle, identity.did),
        )
        .await?;

        // 4. 在目的地建立新清單
        let list = run_stage(
            sink,
            Stage::CreateList,
            format!(
                "Creating new list '{}' on {}...",
                request.metadata.name, destination.handle
            ),
            create_list(&self.destination, &destination, &request.metadata),
            |uri: &AtUri| format!("New list created with URI: {}", uri),
        )
        .await?;

        // 5. 逐一加入成員
        let mut outcome = MigrationOutcome {
            found: members.len(),
            ..MigrationOutcome::default()
        };

        if members.is_empty() {
            tracing::warn!("No members found in the source list. Nothing to add.");
            sink.emit(MigrationEvent::NothingToAdd);
        } else {
            sink.emit(MigrationEvent::StageStarted {
                stage: Stage::AddMembers,
                detail: format!(
                    "Starting to add {} members to the new list. This may take a while...",
                    members.len()
                ),
            });
            let result = add_members(
                &self.destination,
                &destination,
                &list,
                &members,
                &self.pacing,
                sink,
            )
            .await;
            outcome.added = result.added;
            outcome.failed = result.failed;
            sink.emit(MigrationEvent::StageSucceeded {
                stage: Stage::AddMembers,
                detail: format!(
                    "Finished adding members. Successfully added: {}, Failed: {}",
                    result.added, result.failed
                ),
            });
        }

        sink.emit(MigrationEvent::Finished(outcome));
        tracing::info!(
            "🏁 Migration finished: {} found, {} added, {} failed",
            outcome.found,
            outcome.added,
            outcome.failed
        );

        Ok(MigrationReport {
            outcome,
            source,
            destination,
            list,
        })
    }
}

/// 包住單一階段：送出開始事件，再依結果送出成功或失敗事件
async fn run_stage<T, Fut, D>(
    sink: &mut dyn EventSink,
    stage: Stage,
    detail: String,
    work: Fut,
    describe: D,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
    D: FnOnce(&T) -> String,
{
    sink.emit(MigrationEvent::StageStarted { stage, detail });

    match work.await {
        Ok(value) => {
            sink.emit(MigrationEvent::StageSucceeded {
                stage,
                detail: describe(&value),
            });
            Ok(value)
        }
        Err(e) => {
            sink.emit(MigrationEvent::StageFailed {
                stage,
                message: e.to_string(),
            });
            Err(e)
        }
    }
}
