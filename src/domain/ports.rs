use crate::domain::model::{
    AccountRole, AtUri, CreatedRecord, Identity, ListMetadata, ListPage, MigrationEvent, Pacing,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 遠端 record API 的最小介面：登入、分頁讀取清單、建立 record、解析 handle。
///
/// 每個實例綁定一個帳號的 session；`login` 成功之後其餘呼叫才有效。
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn login(&self, identifier: &str, password: &str) -> Result<Identity>;

    async fn get_list_page(
        &self,
        list: &AtUri,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<ListPage>;

    async fn create_record(
        &self,
        repo: &str,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<CreatedRecord>;

    async fn resolve_handle(&self, handle: &str) -> Result<String>;
}

/// 遷移事件的接收端，由前端決定如何呈現
pub trait EventSink: Send {
    fn emit(&mut self, event: MigrationEvent);
}

impl EventSink for Vec<MigrationEvent> {
    fn emit(&mut self, event: MigrationEvent) {
        self.push(event);
    }
}

pub trait ConfigProvider: Send + Sync {
    fn service_url(&self, role: AccountRole) -> &str;
    fn handle(&self, role: AccountRole) -> &str;
    fn app_password(&self, role: AccountRole) -> &str;
    fn source_list(&self) -> &str;
    fn list_metadata(&self) -> ListMetadata;
    fn pacing(&self) -> Pacing;
    fn request_timeout(&self) -> Duration;
}
