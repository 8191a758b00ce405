//! Failed exchanges map onto the error taxonomy; 401 tears the session down.

mod common;

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use carehub_core::api::ErrorKind;
use carehub_core::session::SessionScope;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client, user, RecordingObserver};

async fn respond(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn not_found_uses_fixed_message() {
    let server = MockServer::start().await;
    respond(&server, "/orphans/404", ResponseTemplate::new(404).set_body_json(json!({}))).await;

    let api = client(&server.uri(), RecordingObserver::at("/orphans"));
    let err = api.get::<serde_json::Value>("/orphans/404").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert_eq!(err.friendly_message(), "The requested resource was not found.");
    assert_eq!(err.api_message(), None);
}

#[tokio::test]
async fn forbidden_prefers_api_message() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/volunteers",
        ResponseTemplate::new(403).set_body_json(json!({"message": "no access"})),
    )
    .await;

    let api = client(&server.uri(), RecordingObserver::at("/volunteers"));
    api.session().set("abc123", user("amina@carehub.org")).unwrap();
    let err = api.get::<serde_json::Value>("/volunteers").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.api_message(), Some("no access"));
    assert_eq!(err.friendly_message(), "no access");
    // Only 401 touches the session.
    assert!(api.session().get().is_some());
}

#[tokio::test]
async fn server_error_falls_back_to_error_field() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/reports/monthly",
        ResponseTemplate::new(502).set_body_json(json!({"errorMessage": "upstream down", "error": "Bad Gateway"})),
    )
    .await;

    let api = client(&server.uri(), RecordingObserver::at("/reports"));
    let err = api.get::<serde_json::Value>("/reports/monthly").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.friendly_message(), "Bad Gateway");
}

#[tokio::test]
async fn unmapped_status_is_unknown() {
    let server = MockServer::start().await;
    respond(&server, "/inventory", ResponseTemplate::new(422)).await;

    let api = client(&server.uri(), RecordingObserver::at("/inventory"));
    let err = api.get::<serde_json::Value>("/inventory").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.friendly_message(), "An unexpected error occurred.");
}

#[tokio::test]
async fn connection_failure_is_network_error() {
    // Nothing listens on the discard port.
    let api = client("http://127.0.0.1:9", RecordingObserver::at("/"));
    let err = api.get::<serde_json::Value>("/orphans").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(
        err.friendly_message(),
        "Unable to connect to the server. Please check your internet connection."
    );
    assert!(err.status().is_none());
}

#[tokio::test]
async fn aborted_exchange_is_timeout_not_network_error() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/reports/annual",
        ResponseTemplate::new(200).set_delay(Duration::from_millis(800)),
    )
    .await;

    let api = client(&server.uri(), RecordingObserver::at("/reports"))
        .with_timeout(Duration::from_millis(100));
    let err = api.get::<serde_json::Value>("/reports/annual").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_once() {
    let server = MockServer::start().await;
    respond(&server, "/orphans", ResponseTemplate::new(401)).await;

    let observer = RecordingObserver::at("/orphans");
    let api = client(&server.uri(), observer.clone());
    api.session().set("abc123", user("amina@carehub.org")).unwrap();
    api.set_auth_header("abc123").unwrap();

    let err = api.get::<serde_json::Value>("/orphans").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.friendly_message(), "Your session has expired. Please log in again.");
    assert!(api.session().get().is_none());
    assert!(!api.clear_auth_header(), "teardown should have removed the cached header");
    assert_eq!(observer.redirects(), vec!["/login?expired=true".to_string()]);
}

#[tokio::test]
async fn unauthorized_on_login_page_does_not_navigate() {
    let server = MockServer::start().await;
    respond(&server, "/auth/me", ResponseTemplate::new(401)).await;

    let observer = RecordingObserver::at("/login");
    let api = client(&server.uri(), observer.clone());
    api.session().set("abc123", user("amina@carehub.org")).unwrap();

    api.get::<serde_json::Value>("/auth/me").await.unwrap_err();

    assert!(api.session().get().is_none());
    assert!(observer.redirects().is_empty());
}

#[tokio::test]
async fn unauthorized_in_superuser_area_does_not_navigate() {
    let server = MockServer::start().await;
    respond(&server, "/superuser/branches", ResponseTemplate::new(401)).await;

    let observer = RecordingObserver::at("/superuser/branches");
    let api = client(&server.uri(), observer.clone());
    api.session()
        .set_scoped(SessionScope::Superuser, "root", user("root@carehub.org"))
        .unwrap();

    let superuser = api.for_scope(SessionScope::Superuser);
    superuser
        .get::<serde_json::Value>("/superuser/branches")
        .await
        .unwrap_err();

    assert!(api.session().get_scoped(SessionScope::Superuser).is_none());
    assert!(observer.redirects().is_empty());
    let events = observer.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].scope, SessionScope::Superuser);
}

#[tokio::test]
async fn superuser_unauthorized_clears_primary_session_too() {
    let server = MockServer::start().await;
    respond(&server, "/superuser/audit", ResponseTemplate::new(401)).await;

    let observer = RecordingObserver::at("/superuser/audit");
    let api = client(&server.uri(), observer.clone());
    api.session().set("abc123", user("amina@carehub.org")).unwrap();
    api.set_auth_header("abc123").unwrap();
    api.session()
        .set_scoped(SessionScope::Superuser, "root", user("root@carehub.org"))
        .unwrap();

    let err = api
        .for_scope(SessionScope::Superuser)
        .get::<serde_json::Value>("/superuser/audit")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(api.session().get().is_none());
    assert!(api.session().get_scoped(SessionScope::Superuser).is_none());
    assert!(!api.clear_auth_header());
    assert_eq!(observer.events()[0].scope, SessionScope::Superuser);
}

/// Serve one response whose body is cut short of its Content-Length.
fn truncated_response_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{{\"message\":"
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn unauthorized_with_unreadable_body_still_tears_down() {
    let base = truncated_response_server("HTTP/1.1 401 Unauthorized");

    let observer = RecordingObserver::at("/orphans");
    let api = client(&base, observer.clone());
    api.session().set("abc123", user("amina@carehub.org")).unwrap();

    let err = api.get::<serde_json::Value>("/orphans").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert!(api.session().get().is_none());
    assert_eq!(observer.redirects(), vec!["/login?expired=true".to_string()]);
}

#[tokio::test]
async fn server_error_with_unreadable_body_keeps_its_status() {
    let base = truncated_response_server("HTTP/1.1 503 Service Unavailable");

    let api = client(&base, RecordingObserver::at("/reports"));
    let err = api.get::<serde_json::Value>("/reports").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
}

#[tokio::test]
async fn each_unauthorized_exchange_fires_its_own_event() {
    let server = MockServer::start().await;
    respond(&server, "/orphans", ResponseTemplate::new(401)).await;

    let observer = RecordingObserver::at("/orphans");
    let api = client(&server.uri(), observer.clone());

    api.get::<serde_json::Value>("/orphans").await.unwrap_err();
    observer.navigate("/login");
    api.get::<serde_json::Value>("/orphans").await.unwrap_err();

    assert_eq!(observer.events().len(), 2);
    assert_eq!(observer.redirects().len(), 1);
}
