#![allow(clippy::unwrap_used)]
// Integration tests for `SessionClient` and the firmware backends using
// wiremock.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eoc_api::backend::v2::V2;
use eoc_api::backend::v3::V3;
use eoc_api::model::{PortNumber, Presence};
use eoc_api::{Backend, Credentials, Error, Sample, SessionClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const V2_COOKIE: &str = "sessionId=0123abcd";
const V3_COOKIE: &str = "session=f00dfeed";

fn credentials() -> Credentials {
    Credentials::new("admin", SecretString::from("s3cret")).unwrap()
}

async fn setup() -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let client = SessionClient::new(Url::parse(&server.uri()).unwrap(), credentials()).unwrap();
    (server, client)
}

async fn setup_pinned(backend: Arc<dyn Backend>) -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let client = SessionClient::builder(Url::parse(&server.uri()).unwrap(), credentials())
        .backend(backend)
        .build()
        .unwrap();
    (server, client)
}

/// Client with a short request timeout, optionally pinned to `backend`.
async fn setup_impatient(backend: Option<Arc<dyn Backend>>) -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let mut builder = SessionClient::builder(Url::parse(&server.uri()).unwrap(), credentials())
        .transport(TransportConfig::default().with_timeout(Duration::from_millis(200)));
    if let Some(backend) = backend {
        builder = builder.backend(backend);
    }
    (server, builder.build().unwrap())
}

fn fixture(name: &str) -> ResponseTemplate {
    let body = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/json")
        .set_body_string(body)
}

async fn mount_v2_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .and(body_json(json!({"username": "admin", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cookie": V2_COOKIE})))
        .mount(server)
        .await;
}

async fn mount_v2_status(server: &MockServer) {
    for (route, file) in [
        ("/api/system/board", "v2/board.json"),
        ("/api/system/info", "v2/info.json"),
        ("/api/config/system/eoc", "v2/eoc.json"),
        ("/api/ghn/status", "v2/ghn.json"),
        ("/api/node/status/", "v2/nodes.json"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("cookie", V2_COOKIE))
            .respond_with(fixture(file))
            .mount(server)
            .await;
    }
}

fn v3_login_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("{V3_COOKIE}; Path=/; HttpOnly").as_str())
        .set_body_json(json!({"level": 1, "status": true, "errorCode": 0, "message": ""}))
}

async fn mount_v3_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .and(header("cookie", V3_COOKIE))
        .respond_with(fixture("v3/capabilities.json"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi.lua/status"))
        .and(query_param("type", "system,ghn,ethernet,remote"))
        .and(header("cookie", V3_COOKIE))
        .respond_with(fixture("v3/status.json"))
        .mount(server)
        .await;
}

async fn mount_not_found(server: &MockServer, route: &str) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(server)
        .await;
}

fn names(samples: &[Sample]) -> Vec<&'static str> {
    samples.iter().map(|s| s.desc.name).collect()
}

// ── Negotiation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_negotiates_v2_and_collects() {
    let (server, client) = setup().await;
    mount_v2_login(&server).await;
    mount_v2_status(&server).await;

    let mut samples = Vec::new();
    client.collect(&mut samples).await.unwrap();

    assert_eq!(client.backend_name().await, Some("v2"));
    assert!(client.negotiation_failures().await.is_empty());

    let all = names(&samples);
    assert!(all.contains(&"triax_eoc_controller_info"));
    assert!(all.contains(&"triax_eoc_controller_mem_buffered"));
    assert!(all.contains(&"triax_eoc_endpoint_offline_since"));
    assert!(!all.contains(&"triax_eoc_controller_up"));
}

#[tokio::test]
async fn test_negotiation_falls_back_to_v3() {
    let (server, client) = setup().await;
    mount_not_found(&server, "/api/login/").await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok())
        .expect(1)
        .mount(&server)
        .await;
    mount_v3_status(&server).await;

    let metrics = client.metrics().await.unwrap();
    assert_eq!(metrics.controller.version, "3.2.1");
    assert_eq!(client.backend_name().await, Some("v3"));

    let failures = client.negotiation_failures().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "v2");
    assert!(failures[0].1.contains("404"), "{}", failures[0].1);

    // Sticky: the second collection does not negotiate again.
    client.metrics().await.unwrap();
}

#[tokio::test]
async fn test_no_backend_lists_every_failure() {
    let (server, client) = setup().await;
    mount_not_found(&server, "/api/login/").await;
    mount_not_found(&server, "/cgi.lua/login").await;

    let mut samples = Vec::new();
    let err = client.collect(&mut samples).await.unwrap_err();

    match err {
        Error::NoBackend { failures } => {
            let backends: Vec<_> = failures.iter().map(|f| f.backend).collect();
            assert_eq!(backends, vec!["v2", "v3"]);
            assert!(failures.iter().all(|f| f.error.status() == Some(404)));
        }
        other => panic!("expected NoBackend, got {other:?}"),
    }
    assert!(samples.is_empty());
    assert_eq!(client.backend_name().await, None);
    assert_eq!(client.negotiation_failures().await.len(), 2);
}

#[tokio::test]
async fn test_timed_out_logins_never_bind() {
    let (server, client) = setup_impatient(None).await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cookie": V2_COOKIE}))
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok().set_delay(Duration::from_secs(1)))
        .mount(&server)
        .await;

    let err = client.metrics().await.unwrap_err();
    match err {
        Error::NoBackend { failures } => {
            let backends: Vec<_> = failures.iter().map(|f| f.backend).collect();
            assert_eq!(backends, vec!["v2", "v3"]);
            assert!(
                failures.iter().all(|f| matches!(*f.error, Error::Transport(_))),
                "{failures:?}"
            );
        }
        other => panic!("expected NoBackend, got {other:?}"),
    }
    assert_eq!(client.backend_name().await, None);
}

// ── Session expiry ──────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_session_relogs_once_and_retries() {
    let (server, client) = setup_pinned(Arc::new(V3)).await;

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok())
        .expect(1)
        .mount(&server)
        .await;
    mount_v3_status(&server).await;

    let metrics = client.metrics().await.unwrap();
    assert_eq!(metrics.endpoints.len(), 2);
    assert_eq!(client.backend_name().await, Some("v3"));
}

#[tokio::test]
async fn test_second_401_is_surfaced() {
    let (server, client) = setup_pinned(Arc::new(V3)).await;

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401).set_body_string("session expired"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok())
        .expect(1)
        .mount(&server)
        .await;

    let err = client.metrics().await.unwrap_err();
    match err {
        Error::UnexpectedStatus {
            method, status, body, ..
        } => {
            assert_eq!(method, "GET");
            assert_eq!(status, 401);
            assert_eq!(body, "session expired");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_relogin_keeps_backend_bound() {
    let (server, client) = setup_pinned(Arc::new(V3)).await;

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": false, "message": "Invalid password"})),
        )
        .mount(&server)
        .await;

    let err = client.metrics().await.unwrap_err();
    assert!(
        matches!(&err, Error::Authentication { message } if message == "Invalid password"),
        "{err:?}"
    );
    assert_eq!(client.backend_name().await, Some("v3"));
}

#[tokio::test]
async fn test_renegotiates_after_threshold() {
    let server = MockServer::start().await;
    let client = SessionClient::builder(Url::parse(&server.uri()).unwrap(), credentials())
        .backend(Arc::new(V3))
        .renegotiate_after(2)
        .build()
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": false})))
        .mount(&server)
        .await;

    client.metrics().await.unwrap_err();
    assert_eq!(client.backend_name().await, Some("v3"));
    client.metrics().await.unwrap_err();
    assert_eq!(client.backend_name().await, None);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_login() {
    let (server, client) = setup_pinned(Arc::new(V3)).await;

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok())
        .expect(1)
        .mount(&server)
        .await;
    mount_v3_status(&server).await;

    let (a, b) = tokio::join!(
        client.get::<Value>("cgi.lua/capabilities"),
        client.get::<Value>("cgi.lua/capabilities"),
    );
    assert_eq!(a.unwrap()["product"]["serial"], "EOC-3000-4711");
    assert_eq!(b.unwrap()["product"]["serial"], "EOC-3000-4711");
}

#[tokio::test]
async fn test_timed_out_relogin_is_not_a_success() {
    let (server, client) = setup_impatient(Some(Arc::new(V3))).await;

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok().set_delay(Duration::from_secs(1)))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.metrics().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err:?}");
    assert_eq!(client.backend_name().await, Some("v3"));
}

#[tokio::test]
async fn test_queued_relogin_skips_unbound_backend() {
    let server = MockServer::start().await;
    let client = SessionClient::builder(Url::parse(&server.uri()).unwrap(), credentials())
        .backend(Arc::new(V3))
        .renegotiate_after(1)
        .build()
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/cgi.lua/capabilities"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": false})))
        .expect(1)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(
        client.get::<Value>("cgi.lua/capabilities"),
        client.get::<Value>("cgi.lua/capabilities"),
    );
    let errors = [a.unwrap_err(), b.unwrap_err()];
    assert_eq!(
        errors
            .iter()
            .filter(|e| matches!(e, Error::Authentication { .. }))
            .count(),
        1,
        "{errors:?}"
    );
    assert_eq!(client.backend_name().await, None);
}

// ── Login handshakes ────────────────────────────────────────────────

#[tokio::test]
async fn test_v2_login_installs_body_cookie() {
    let (server, client) = setup().await;
    mount_v2_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/system/board"))
        .and(header("cookie", V2_COOKIE))
        .respond_with(fixture("v2/board.json"))
        .expect(1)
        .mount(&server)
        .await;

    V2.login(&client).await.unwrap();
    let raw = client
        .request_raw(Method::GET, "api/system/board", None)
        .await
        .unwrap();
    assert_eq!(raw.status, 200);
}

#[tokio::test]
async fn test_v2_login_rejection_is_authentication_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = V2.login(&client).await.unwrap_err();
    assert!(
        matches!(&err, Error::Authentication { message } if message == "invalid credentials"),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_v2_login_message_without_cookie() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "wrong password"})))
        .mount(&server)
        .await;

    let err = V2.login(&client).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "{err:?}");
}

#[tokio::test]
async fn test_v2_login_without_token_is_protocol_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = V2.login(&client).await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");
}

#[tokio::test]
async fn test_v3_login_without_set_cookie_is_protocol_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .mount(&server)
        .await;

    let err = V3.login(&client).await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");
}

#[tokio::test]
async fn test_v3_login_refused() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": false, "errorCode": 3, "message": "Login failed"})),
        )
        .mount(&server)
        .await;

    let err = V3.login(&client).await.unwrap_err();
    assert!(
        matches!(&err, Error::Authentication { message } if message == "Login failed"),
        "{err:?}"
    );
}

// ── Collection edge cases ───────────────────────────────────────────

#[tokio::test]
async fn test_malformed_regts_is_parse_error() {
    let (server, client) = setup_pinned(Arc::new(V2)).await;
    client.set_cookie(V2_COOKIE).unwrap();

    for (route, file) in [
        ("/api/system/board", "v2/board.json"),
        ("/api/system/info", "v2/info.json"),
        ("/api/config/system/eoc", "v2/eoc.json"),
        ("/api/ghn/status", "v2/ghn.json"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(fixture(file))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/node/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "00_1f_a3_aa_00_01": {"name": "flat-101", "mac": "00:1f:a3:aa:00:01", "regts": "12x"}
        })))
        .mount(&server)
        .await;

    let mut samples = Vec::new();
    let err = client.collect(&mut samples).await.unwrap_err();
    assert!(
        matches!(&err, Error::Parse { field: "regts", value, .. } if value == "12x"),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_empty_tables_yield_empty_metrics() {
    let (server, client) = setup_pinned(Arc::new(V2)).await;

    for (route, file) in [
        ("/api/system/board", "v2/board.json"),
        ("/api/system/info", "v2/info.json"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(fixture(file))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/config/system/eoc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"macaddr": ""})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ghn/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/node/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let metrics = client.metrics().await.unwrap();
    assert!(metrics.endpoints.is_empty());
    assert!(metrics.ghn_ports.is_empty());
}

#[tokio::test]
async fn test_v3_port_numbers_and_presence() {
    let (server, client) = setup_pinned(Arc::new(V3)).await;
    client.set_cookie(V3_COOKIE).unwrap();
    mount_v3_status(&server).await;

    let metrics = client.metrics().await.unwrap();
    let room = &metrics.endpoints[0];
    assert_eq!(room.presence, Presence::Online { uptime: 3600 });
    assert_eq!(room.ghn_port.as_ref().unwrap().number, PortNumber::Known(2));
}

// ── Request shape ───────────────────────────────────────────────────

#[tokio::test]
async fn test_content_type_only_with_body() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/system/board"))
        .and(header("accept", "application/json"))
        .respond_with(fixture("v2/board.json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/echo"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    client
        .request_raw(Method::GET, "api/system/board", None)
        .await
        .unwrap();
    client
        .request_raw(Method::POST, "api/echo", Some(&json!({"a": 1})))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].headers.contains_key("content-type"));
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_redirect_is_unexpected_status_with_location() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login.html"))
        .mount(&server)
        .await;

    let err = client
        .request_raw(Method::GET, "api/system/info", None)
        .await
        .unwrap_err();
    match err {
        Error::UnexpectedStatus {
            status, location, ..
        } => {
            assert_eq!(status, 302);
            assert_eq!(location.as_deref(), Some("/login.html"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_registry_order() {
    let server = MockServer::start().await;
    let mut registry = eoc_api::Registry::empty();
    registry.register(|| Arc::new(V3));
    let client = SessionClient::builder(Url::parse(&server.uri()).unwrap(), credentials())
        .registry(registry)
        .build()
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cookie": V2_COOKIE})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok())
        .mount(&server)
        .await;
    mount_v3_status(&server).await;

    client.metrics().await.unwrap();
    assert_eq!(client.backend_name().await, Some("v3"));
}

#[tokio::test]
async fn test_empty_registry_never_binds() {
    let server = MockServer::start().await;
    let client = SessionClient::builder(Url::parse(&server.uri()).unwrap(), credentials())
        .registry(eoc_api::Registry::empty())
        .build()
        .unwrap();

    let err = client.metrics().await.unwrap_err();
    assert!(matches!(&err, Error::NoBackend { failures } if failures.is_empty()));
    assert!(err.to_string().contains("no backends registered"));
}

// ── API passthrough ─────────────────────────────────────────────────

#[tokio::test]
async fn test_api_get_is_rooted_at_backend_api() {
    let (server, client) = setup().await;
    mount_v2_login(&server).await;
    mount_v2_status(&server).await;

    let nodes: Value = client.api_get("/node/status/").await.unwrap();
    assert_eq!(nodes["00_1f_a3_aa_00_01"]["name"], "flat-101");
    assert_eq!(client.backend_name().await, Some("v2"));
}

#[tokio::test]
async fn test_api_get_on_v3_uses_cgi_root() {
    let (server, client) = setup().await;
    mount_not_found(&server, "/api/login/").await;
    Mock::given(method("POST"))
        .and(path("/cgi.lua/login"))
        .respond_with(v3_login_ok())
        .mount(&server)
        .await;
    mount_v3_status(&server).await;

    let caps = client.api_get("capabilities").await.unwrap();
    assert_eq!(caps["product"]["serial"], "EOC-3000-4711");
}

// ── Cookie isolation ────────────────────────────────────────────────

async fn mount_board_behind(server: &MockServer, cookie: &str, serial: &str) {
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cookie": cookie})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/system/board"))
        .and(header("cookie", cookie))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serial": serial})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_clients_keep_separate_cookies() {
    let (first, first_client) = setup().await;
    let (second, second_client) = setup().await;
    mount_board_behind(&first, "sessionId=aaaa1111", "S-FIRST").await;
    mount_board_behind(&second, "sessionId=bbbb2222", "S-SECOND").await;

    let board: Value = first_client.get("api/system/board").await.unwrap();
    assert_eq!(board["serial"], "S-FIRST");
    let board: Value = second_client.get("api/system/board").await.unwrap();
    assert_eq!(board["serial"], "S-SECOND");

    // Both servers share 127.0.0.1; the second login must not replace the
    // first client's cookie.
    let board: Value = first_client.get("api/system/board").await.unwrap();
    assert_eq!(board["serial"], "S-FIRST");
}
