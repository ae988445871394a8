use crate::domain::model::{AtUri, CreatedRecord, Identity, ListPage};
use crate::domain::ports::RecordApi;
use crate::utils::error::{MigrateError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_SERVICE: &str = "https://bsky.social";

const CREATE_SESSION: &str = "com.atproto.server.createSession";
const REFRESH_SESSION: &str = "com.atproto.server.refreshSession";
const GET_LIST: &str = "app.bsky.graph.getList";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";
const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";

#[derive(Clone)]
struct Session {
    identity: Identity,
    access_jwt: String,
    refresh_jwt: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("access_jwt", &"<redacted>")
            .field("refresh_jwt", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_jwt: String,
    refresh_jwt: String,
    handle: String,
    did: String,
}

impl From<SessionResponse> for Session {
    fn from(response: SessionResponse) -> Self {
        Self {
            identity: Identity {
                handle: response.handle,
                did: response.did,
            },
            access_jwt: response.access_jwt,
            refresh_jwt: response.refresh_jwt,
        }
    }
}

#[derive(Deserialize)]
struct GetListResponse {
    #[serde(default)]
    items: Vec<ListItemView>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct ListItemView {
    subject: ProfileView,
}

#[derive(Deserialize)]
struct ProfileView {
    did: String,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: AtUri,
    cid: String,
}

#[derive(Deserialize)]
struct ResolveHandleResponse {
    did: String,
}

#[derive(Deserialize, Default)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// 綁定單一帳號 session 的 XRPC 客戶端
pub struct XrpcClient {
    client: Client,
    service: String,
    session: RwLock<Option<Session>>,
}

impl XrpcClient {
    pub fn new(service: &str, timeout: Duration) -> Result<Self> {
        crate::utils::validation::validate_url("service", service)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bsky-list-migrator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            service: service.trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{}", self.service, nsid)
    }

    /// 非 2xx 回應轉成 XrpcError，盡量保留伺服器給的 error/message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: XrpcErrorBody = serde_json::from_str(&body).unwrap_or_default();
        tracing::debug!("XRPC error {}: {}", status, body);

        Err(MigrateError::XrpcError {
            status: status.as_u16(),
            error: parsed.error,
            message: parsed.message,
        })
    }

    async fn access_token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_jwt.clone())
            .ok_or(MigrateError::SessionMissing)
    }

    async fn refresh_session(&self) -> Result<()> {
        let refresh_jwt = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_jwt.clone())
            .ok_or(MigrateError::SessionMissing)?;

        tracing::info!("🔄 Access token expired, refreshing session");
        let response = self
            .client
            .post(self.endpoint(REFRESH_SESSION))
            .bearer_auth(refresh_jwt)
            .send()
            .await?;
        let session: SessionResponse = Self::check(response).await?.json().await?;

        *self.session.write().await = Some(session.into());
        Ok(())
    }

    /// 帶 access token 送出請求；token 過期時刷新 session 後重送一次
    async fn send_authed<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let token = self.access_token().await?;
        let response = build().bearer_auth(token).send().await?;

        match Self::check(response).await {
            Err(e) if e.is_expired_token() => {
                self.refresh_session().await?;
                let token = self.access_token().await?;
                let response = build().bearer_auth(token).send().await?;
                Self::check(response).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl RecordApi for XrpcClient {
    async fn login(&self, identifier: &str, password: &str) -> Result<Identity> {
        tracing::debug!("Creating session for {} at {}", identifier, self.service);

        let response = self
            .client
            .post(self.endpoint(CREATE_SESSION))
            .json(&CreateSessionRequest {
                identifier,
                password,
            })
            .send()
            .await?;
        let session: Session = Self::check(response)
            .await?
            .json::<SessionResponse>()
            .await?
            .into();

        let identity = session.identity.clone();
        *self.session.write().await = Some(session);
        Ok(identity)
    }

    async fn get_list_page(
        &self,
        list: &AtUri,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<ListPage> {
        let list = list.to_string();
        let limit = limit.to_string();
        let url = self.endpoint(GET_LIST);

        let response = self
            .send_authed(|| {
                let mut query = vec![("list", list.as_str()), ("limit", limit.as_str())];
                if let Some(cursor) = cursor {
                    query.push(("cursor", cursor));
                }
                self.client.get(&url).query(&query)
            })
            .await?;

        let page: GetListResponse = response.json().await?;
        Ok(ListPage {
            members: page.items.into_iter().map(|item| item.subject.did).collect(),
            cursor: page.cursor,
        })
    }

    async fn create_record(
        &self,
        repo: &str,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<CreatedRecord> {
        let url = self.endpoint(CREATE_RECORD);
        let body = CreateRecordRequest {
            repo,
            collection,
            record: &record,
        };

        let response = self
            .send_authed(|| self.client.post(&url).json(&body))
            .await?;

        let created: CreateRecordResponse = response.json().await?;
        Ok(CreatedRecord {
            uri: created.uri,
            cid: created.cid,
        })
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint(RESOLVE_HANDLE))
            .query(&[("handle", handle)])
            .send()
            .await?;
        let resolved: ResolveHandleResponse = Self::check(response).await?.json().await?;
        Ok(resolved.did)
    }
}
