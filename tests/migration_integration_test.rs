use anyhow::Result;
use bsky_list_migrator::core::Stage;
use bsky_list_migrator::{
    Credentials, ListMetadata, MigrationEngine, MigrationEvent, MigrationOutcome,
    MigrationRequest, Pacing, XrpcClient,
};
use httpmock::prelude::*;
use httpmock::Mock;
use std::time::Duration;

const SOURCE_LIST: &str = "at://did:plc:alice/app.bsky.graph.list/3ksrc";
const NEW_LIST: &str = "at://did:plc:bob/app.bsky.graph.list/3knew";

fn mock_login<'a>(server: &'a MockServer, handle: &str, did: &str, token: &str) -> Mock<'a> {
    let body = serde_json::json!({
        "accessJwt": token,
        "refreshJwt": format!("{}-refresh", token),
        "handle": handle,
        "did": did
    });
    let handle = handle.to_string();
    server.mock(move |when, then| {
        when.method(POST)
            .path("/xrpc/com.atproto.server.createSession")
            .json_body_partial(format!(r#"{{"identifier":"{}"}}"#, handle));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(body);
    })
}

fn mock_members<'a>(server: &'a MockServer, members: &[&str]) -> Mock<'a> {
    let items: Vec<serde_json::Value> = members
        .iter()
        .enumerate()
        .map(|(i, did)| {
            serde_json::json!({
                "uri": format!("at://did:plc:alice/app.bsky.graph.listitem/{}", i),
                "subject": {"did": did, "handle": format!("member{}.test", i)}
            })
        })
        .collect();

    server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/app.bsky.graph.getList")
            .query_param("list", SOURCE_LIST)
            .query_param("limit", "100")
            .header("Authorization", "Bearer source-token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "list": {"uri": SOURCE_LIST, "name": "Friends"},
                "items": items
            }));
    })
}

fn mock_create_list(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/xrpc/com.atproto.repo.createRecord")
            .header("Authorization", "Bearer dest-token")
            .json_body_partial(
                r#"{
                    "repo": "did:plc:bob",
                    "collection": "app.bsky.graph.list",
                    "record": {"name": "Copied", "purpose": "app.bsky.graph.defs#curatelist"}
                }"#,
            );
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"uri": NEW_LIST, "cid": "bafyreilist"}));
    })
}

fn mock_add_member<'a>(server: &'a MockServer, did: &str, status: u16) -> Mock<'a> {
    let partial = serde_json::json!({
        "repo": "did:plc:bob",
        "collection": "app.bsky.graph.listitem",
        "record": {"subject": did, "list": NEW_LIST}
    })
    .to_string();
    let did = did.to_string();

    server.mock(move |when, then| {
        when.method(POST)
            .path("/xrpc/com.atproto.repo.createRecord")
            .json_body_partial(partial);
        if status == 200 {
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "uri": format!("at://did:plc:bob/app.bsky.graph.listitem/{}", did.replace(':', "")),
                    "cid": "bafyreiitem"
                }));
        } else {
            then.status(status)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "error": "InvalidRequest",
                    "message": format!("Could not add {}", did)
                }));
        }
    })
}

fn engine(source: &MockServer, destination: &MockServer) -> MigrationEngine<XrpcClient> {
    let timeout = Duration::from_secs(5);
    MigrationEngine::new(
        XrpcClient::new(&source.base_url(), timeout).unwrap(),
        XrpcClient::new(&destination.base_url(), timeout).unwrap(),
    )
    .with_pacing(Pacing::none())
}

fn request() -> MigrationRequest {
    MigrationRequest {
        source: Credentials::new("alice.bsky.social", "source-pass"),
        source_list: SOURCE_LIST.parse().unwrap(),
        destination: Credentials::new("bob.bsky.social", "dest-pass"),
        metadata: ListMetadata::new("Copied", "Copied from alice", "curatelist"),
    }
}

/// 三個成員，其中 D2 加入失敗：結果應為成功 2、失敗 1
#[tokio::test]
async fn test_end_to_end_migration_with_one_failed_member() -> Result<()> {
    let source_server = MockServer::start();
    let dest_server = MockServer::start();

    mock_login(&source_server, "alice.bsky.social", "did:plc:alice", "source-token");
    let members_mock = mock_members(&source_server, &["did:plc:d1", "did:plc:d2", "did:plc:d3"]);
    mock_login(&dest_server, "bob.bsky.social", "did:plc:bob", "dest-token");
    let create_list_mock = mock_create_list(&dest_server);
    let d1 = mock_add_member(&dest_server, "did:plc:d1", 200);
    let d2 = mock_add_member(&dest_server, "did:plc:d2", 400);
    let d3 = mock_add_member(&dest_server, "did:plc:d3", 200);

    let engine = engine(&source_server, &dest_server);
    let mut events: Vec<MigrationEvent> = Vec::new();
    let report = engine.run(&request(), &mut events).await?;

    members_mock.assert();
    create_list_mock.assert();
    d1.assert_hits(1);
    d2.assert_hits(1);
    d3.assert_hits(1);

    assert_eq!(
        report.outcome,
        MigrationOutcome {
            found: 3,
            added: 2,
            failed: 1
        }
    );
    assert_eq!(report.list.to_string(), NEW_LIST);
    assert_eq!(report.destination.did, "did:plc:bob");

    let warnings: Vec<&MigrationEvent> = events
        .iter()
        .filter(|e| matches!(e, MigrationEvent::MemberFailed { .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
    match warnings[0] {
        MigrationEvent::MemberFailed { did, message } => {
            assert_eq!(did, "did:plc:d2");
            assert!(message.contains("Could not add did:plc:d2"));
        }
        _ => unreachable!(),
    }

    Ok(())
}

/// 來源清單是空的：仍會建立清單，但不會呼叫任何加入成員的 API
#[tokio::test]
async fn test_end_to_end_empty_source_list() -> Result<()> {
    let source_server = MockServer::start();
    let dest_server = MockServer::start();

    mock_login(&source_server, "alice.bsky.social", "did:plc:alice", "source-token");
    let members_mock = mock_members(&source_server, &[]);
    mock_login(&dest_server, "bob.bsky.social", "did:plc:bob", "dest-token");
    let create_list_mock = mock_create_list(&dest_server);
    let any_member = dest_server.mock(|when, then| {
        when.method(POST)
            .path("/xrpc/com.atproto.repo.createRecord")
            .json_body_partial(r#"{"collection": "app.bsky.graph.listitem"}"#);
        then.status(200);
    });

    let engine = engine(&source_server, &dest_server);
    let mut events: Vec<MigrationEvent> = Vec::new();
    let report = engine.run(&request(), &mut events).await?;

    members_mock.assert();
    create_list_mock.assert();
    any_member.assert_hits(0);
    assert_eq!(report.outcome, MigrationOutcome::default());
    assert!(events.contains(&MigrationEvent::NothingToAdd));

    Ok(())
}

/// 目的地登入失敗：不建立清單也不加入成員
#[tokio::test]
async fn test_end_to_end_destination_login_failure() -> Result<()> {
    let source_server = MockServer::start();
    let dest_server = MockServer::start();

    mock_login(&source_server, "alice.bsky.social", "did:plc:alice", "source-token");
    mock_members(&source_server, &["did:plc:d1"]);
    let dest_login = dest_server.mock(|when, then| {
        when.method(POST).path("/xrpc/com.atproto.server.createSession");
        then.status(401)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "error": "AuthenticationRequired",
                "message": "Invalid identifier or password"
            }));
    });
    let any_create = dest_server.mock(|when, then| {
        when.method(POST).path("/xrpc/com.atproto.repo.createRecord");
        then.status(200);
    });

    let engine = engine(&source_server, &dest_server);
    let mut events: Vec<MigrationEvent> = Vec::new();
    let err = engine
        .run(&request(), &mut events)
        .await
        .expect_err("destination login should fail");

    dest_login.assert();
    any_create.assert_hits(0);
    assert_eq!(err.stage(), Some(Stage::DestinationLogin));
    assert_eq!(
        err.stage().map(|s| s.label()),
        Some("Destination Account login")
    );
    assert!(err.to_string().contains("Destination Account"));
    assert!(events.contains(&MigrationEvent::StageFailed {
        stage: Stage::DestinationLogin,
        message: err.to_string(),
    }));

    Ok(())
}

/// 來源清單讀取失敗：不登入目的地帳號
#[tokio::test]
async fn test_end_to_end_fetch_failure() -> Result<()> {
    let source_server = MockServer::start();
    let dest_server = MockServer::start();

    mock_login(&source_server, "alice.bsky.social", "did:plc:alice", "source-token");
    source_server.mock(|when, then| {
        when.method(GET).path("/xrpc/app.bsky.graph.getList");
        then.status(400)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "error": "InvalidRequest",
                "message": "List not found"
            }));
    });
    let dest_login = mock_login(&dest_server, "bob.bsky.social", "did:plc:bob", "dest-token");

    let engine = engine(&source_server, &dest_server);
    let mut events: Vec<MigrationEvent> = Vec::new();
    let err = engine
        .run(&request(), &mut events)
        .await
        .expect_err("fetch should fail");

    dest_login.assert_hits(0);
    assert_eq!(err.stage(), Some(Stage::FetchMembers));
    assert!(err.to_string().contains("List not found"));
    assert_eq!(err.exit_code(), 4);

    Ok(())
}

/// 以 bsky.app 網址指定來源清單，handle 先解析成 DID
#[tokio::test]
async fn test_end_to_end_with_web_list_url() -> Result<()> {
    let source_server = MockServer::start();
    let dest_server = MockServer::start();

    mock_login(&source_server, "alice.bsky.social", "did:plc:alice", "source-token");
    let resolve_mock = source_server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/com.atproto.identity.resolveHandle")
            .query_param("handle", "alice.bsky.social");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"did": "did:plc:alice"}));
    });
    let members_mock = mock_members(&source_server, &["did:plc:d1"]);
    mock_login(&dest_server, "bob.bsky.social", "did:plc:bob", "dest-token");
    mock_create_list(&dest_server);
    let d1 = mock_add_member(&dest_server, "did:plc:d1", 200);

    let mut request = request();
    request.source_list = "https://bsky.app/profile/alice.bsky.social/lists/3ksrc".parse()?;

    let engine = engine(&source_server, &dest_server);
    let mut events: Vec<MigrationEvent> = Vec::new();
    let report = engine.run(&request, &mut events).await?;

    resolve_mock.assert();
    members_mock.assert();
    d1.assert();
    assert_eq!(report.outcome.added, 1);

    Ok(())
}
