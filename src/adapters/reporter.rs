use crate::domain::model::MigrationEvent;
use crate::domain::ports::EventSink;

/// 把遷移事件寫進 tracing log 的輸出端 (CLI 用)
#[derive(Debug, Default)]
pub struct TracingReporter {
    warnings: usize,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 執行期間發出的非致命警告數
    pub fn warnings(&self) -> usize {
        self.warnings
    }
}

impl EventSink for TracingReporter {
    fn emit(&mut self, event: MigrationEvent) {
        match event {
            MigrationEvent::StageStarted { stage, detail } => {
                tracing::info!("⏳ {}: {}", stage, detail);
            }
            MigrationEvent::StageSucceeded { stage, detail } => {
                tracing::info!("✅ {} successful! {}", stage, detail);
            }
            MigrationEvent::StageFailed { stage, message } => {
                tracing::error!("❌ {} failed! {}", stage, message);
            }
            MigrationEvent::MemberFailed { did, message } => {
                self.warnings += 1;
                tracing::warn!("⚠️ Skipped {}: {}", did, message);
            }
            MigrationEvent::Progress(progress) => {
                tracing::info!("📈 [{:>3.0}%] {}", progress.fraction() * 100.0, progress);
            }
            MigrationEvent::NothingToAdd => {
                self.warnings += 1;
                tracing::warn!("⚠️ No members found in the source list. Nothing to add.");
            }
            MigrationEvent::Finished(outcome) => {
                tracing::info!(
                    "🏁 Members found: {}, added: {}, failed: {}",
                    outcome.found,
                    outcome.added,
                    outcome.failed
                );
            }
        }
    }
}
