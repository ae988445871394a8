use crate::domain::model::{AtUri, CreatedRecord, Identity, ListPage, LIST_ITEM_COLLECTION};
use crate::domain::ports::RecordApi;
use crate::utils::error::{MigrateError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// 記憶體內的 RecordApi，模擬單一帳號的 session 與 repo
pub(crate) struct FakeRecordApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, (String, String)>,
    handles: HashMap<String, String>,
    session: Option<Identity>,
    pages: HashMap<Option<String>, ListPage>,
    failing_pages: HashSet<Option<String>>,
    failing_subjects: HashMap<String, usize>,
    fail_create_list: bool,
    records: Vec<(String, String, serde_json::Value)>,
    calls: Vec<String>,
}

fn rejected(status: u16, error: &str, message: &str) -> MigrateError {
    MigrateError::XrpcError {
        status,
        error: Some(error.to_string()),
        message: Some(message.to_string()),
    }
}

impl FakeRecordApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_account(self, handle: &str, password: &str, did: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(handle.to_string(), (password.to_string(), did.to_string()));
        self
    }

    pub fn with_handle(self, handle: &str, did: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .handles
            .insert(handle.to_string(), did.to_string());
        self
    }

    /// 以 cursor 為鍵登記一頁成員
    pub fn with_page(self, cursor: Option<&str>, members: &[&str], next: Option<&str>) -> Self {
        self.state.lock().unwrap().pages.insert(
            cursor.map(str::to_string),
            ListPage {
                members: members.iter().map(|m| m.to_string()).collect(),
                cursor: next.map(str::to_string),
            },
        );
        self
    }

    pub fn with_failing_page(self, cursor: Option<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_pages
            .insert(cursor.map(str::to_string));
        self
    }

    pub fn with_failing_subject(self, did: &str, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_subjects
            .insert(did.to_string(), times);
        self
    }

    pub fn with_failing_list_creation(self) -> Self {
        self.state.lock().unwrap().fail_create_list = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn records(&self, collection: &str) -> Vec<(String, serde_json::Value)> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(_, c, _)| c == collection)
            .map(|(repo, _, record)| (repo.clone(), record.clone()))
            .collect()
    }

    pub fn list_item_subjects(&self) -> Vec<String> {
        self.records(LIST_ITEM_COLLECTION)
            .into_iter()
            .filter_map(|(_, record)| record["subject"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl RecordApi for FakeRecordApi {
    async fn login(&self, identifier: &str, password: &str) -> Result<Identity> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("login:{}", identifier));

        match state.accounts.get(identifier).cloned() {
            Some((expected, did)) if expected == password => {
                let identity = Identity {
                    handle: identifier.to_string(),
                    did,
                };
                state.session = Some(identity.clone());
                Ok(identity)
            }
            _ => Err(rejected(
                401,
                "AuthenticationRequired",
                "Invalid identifier or password",
            )),
        }
    }

    async fn get_list_page(
        &self,
        list: &AtUri,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<ListPage> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("getList:{}:{}:{}", list, cursor.unwrap_or("-"), limit));

        if state.session.is_none() {
            return Err(MigrateError::SessionMissing);
        }
        let key = cursor.map(str::to_string);
        if state.failing_pages.contains(&key) {
            return Err(rejected(502, "UpstreamFailure", "Upstream service failed"));
        }
        Ok(state.pages.get(&key).cloned().unwrap_or_default())
    }

    async fn create_record(
        &self,
        repo: &str,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<CreatedRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("createRecord:{}", collection));

        let owner = state.session.clone().ok_or(MigrateError::SessionMissing)?;
        if owner.did != repo {
            return Err(rejected(400, "InvalidRequest", "Repo does not match session"));
        }

        if collection == LIST_ITEM_COLLECTION {
            let subject = record["subject"].as_str().unwrap_or_default().to_string();
            if let Some(remaining) = state.failing_subjects.get_mut(&subject) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(rejected(429, "RateLimitExceeded", "Rate Limit Exceeded"));
                }
            }
        } else if state.fail_create_list {
            return Err(rejected(400, "InvalidRequest", "Invalid list record"));
        }

        let rkey = format!("rkey{}", state.records.len() + 1);
        state
            .records
            .push((repo.to_string(), collection.to_string(), record));

        Ok(CreatedRecord {
            uri: AtUri::new(repo, collection, rkey),
            cid: "bafyreifake".to_string(),
        })
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("resolveHandle:{}", handle));
        state
            .handles
            .get(handle)
            .cloned()
            .ok_or_else(|| rejected(400, "InvalidRequest", "Unable to resolve handle"))
    }
}
