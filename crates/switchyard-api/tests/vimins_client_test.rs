#![allow(clippy::unwrap_used)]
// Integration tests for `ViminsClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use switchyard_api::{DeviceSessionClient, Error, ViminsClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ViminsClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ViminsClient::with_client(
        reqwest::Client::new(),
        base_url,
        "admin".into(),
        SecretString::from("test-password".to_owned()),
    );
    (server, client)
}

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "ok", "data": data }))
}

/// Mount the full successful login handshake.
async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_info"))
        .respond_with(ok_envelope(json!({})))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=login"))
        .respond_with(ok_envelope(json!({})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_status"))
        .respond_with(ok_envelope(json!({ "status": "ok" })))
        .mount(server)
        .await;
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn login_succeeds_when_status_confirms() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    client.authenticate().await.unwrap();
}

#[tokio::test]
async fn login_polls_until_status_flips() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_info"))
        .respond_with(ok_envelope(json!({ "nonce": "n-42" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=login"))
        .and(body_string_contains("nonce=n-42"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    // Two pending polls, then confirmation.
    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_status"))
        .respond_with(ok_envelope(json!({ "status": "pending" })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_status"))
        .respond_with(ok_envelope(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
}

#[tokio::test]
async fn login_fails_after_poll_exhaustion() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_info"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_status"))
        .respond_with(ok_envelope(json!({ "status": "pending" })))
        .mount(&server)
        .await;

    let result = client.authenticate().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn login_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_info"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 13, "msg": "bad credentials" })),
        )
        .mount(&server)
        .await;

    match client.authenticate().await {
        Err(Error::Authentication { message }) => {
            assert!(message.contains("bad credentials"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn ensure_session_authenticates_at_most_once() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_info"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    // The credential submit must happen exactly once across both calls.
    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=login"))
        .respond_with(ok_envelope(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_status"))
        .respond_with(ok_envelope(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    client.ensure_session().await.unwrap();
    client.ensure_session().await.unwrap();
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn vlan_config_merges_list_and_membership() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "vlan_list"))
        .respond_with(ok_envelope(json!({
            "vlans": [
                { "vid": 1, "name": "default" },
                { "vid": 100, "name": "BACKUP", "desc": "backup net" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "vlan_membership"))
        .respond_with(ok_envelope(json!({
            "entries": [
                { "vid": 100, "port": "7", "tagged": true },
                { "vid": 100, "port": "1", "tagged": false, "pvid": 100 }
            ]
        })))
        .mount(&server)
        .await;

    let report = client.get_vlan_config().await.unwrap();

    assert!(report.partial_errors.is_empty());
    assert_eq!(report.vlans.len(), 2);

    let backup = report.vlans.iter().find(|v| v.vlan_id == 100).unwrap();
    assert_eq!(backup.name.as_deref(), Some("BACKUP"));
    assert_eq!(backup.members.len(), 2);
    assert!(backup.members.iter().any(|m| m.port_id == "7" && m.tagged));
}

#[tokio::test]
async fn partial_read_survives_failed_subquery() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "sys_info"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "sys_status"))
        .respond_with(ok_envelope(json!({ "uptime": "12 days" })))
        .mount(&server)
        .await;

    let info = client.get_system_info().await.unwrap();

    assert_eq!(info.uptime.as_deref(), Some("12 days"));
    assert!(info.model.is_none());
    assert_eq!(info.partial_errors.len(), 1);
    assert!(info.partial_errors[0].contains("sys_info"));
}

// ── Writes & session invalidation ───────────────────────────────────

#[tokio::test]
async fn create_vlan_posts_command() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=vlan_add"))
        .and(body_string_contains("vid=100"))
        .and(body_string_contains("name=BACKUP"))
        .respond_with(ok_envelope(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.create_vlan(100, "BACKUP", "backup net").await.unwrap();
}

#[tokio::test]
async fn vendor_rejection_surfaces_as_protocol_error() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=vlan_add"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 7, "msg": "vid already exists" })),
        )
        .mount(&server)
        .await;

    match client.create_vlan(100, "BACKUP", "").await {
        Err(Error::Protocol { message }) => {
            assert!(message.contains("already exists"), "got: {message}");
        }
        other => panic!("expected Protocol error, got: {other:?}"),
    }
}

#[tokio::test]
async fn http_401_invalidates_session_and_next_call_relogs_in() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_info"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    // Login must run twice: initial session, then again after the 401.
    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=login"))
        .respond_with(ok_envelope(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "login_status"))
        .respond_with(ok_envelope(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    // First delete hits an expired device session.
    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=vlan_del"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let result = client.delete_vlan(100).await;
    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );

    // Second attempt: fresh login, then success.
    Mock::given(method("POST"))
        .and(path("/cgi/set"))
        .and(body_string_contains("cmd=vlan_del"))
        .respond_with(ok_envelope(json!({})))
        .mount(&server)
        .await;

    client.delete_vlan(100).await.unwrap();
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_never_errors() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "sys_info"))
        .respond_with(ok_envelope(json!({ "model": "VM-2428G" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "sys_status"))
        .respond_with(ok_envelope(json!({ "uptime": "1 day" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "port_status"))
        .respond_with(ok_envelope(json!({ "ports": [] })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi/get"))
        .and(query_param("cmd", "port_config"))
        .respond_with(ok_envelope(json!({ "ports": [] })))
        .mount(&server)
        .await;

    let report = client.health_check().await;
    assert!(report.authenticated);
    assert!(report.reachable);
    assert!(report.is_healthy(), "report: {report:?}");
}
