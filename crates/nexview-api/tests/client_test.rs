// Integration tests for `ApiClient` and `WeatherClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nexview_api::{ApiClient, Error, WeatherClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base);
    (server, client)
}

fn token(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .and(body_json(json!({
            "username": "admin",
            "type": "login",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let issued = client.login("admin", &token("hunter2")).await.unwrap();
    assert_eq!(issued.expose_secret(), "abc");
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad password"))
        .mount(&server)
        .await;

    let err = client.login("admin", &token("nope")).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
    assert!(err.is_auth_expired());
}

// ── Socket bootstrap ────────────────────────────────────────────────

#[tokio::test]
async fn test_socket_ticket_sends_bearer() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/websocket"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "websocket",
            "data": { "token": "tkt1", "socket": "ws://10.0.0.5:9384/ws" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ticket = client.socket_ticket(&token("abc")).await.unwrap();
    assert_eq!(ticket.ticket(), "tkt1");
    assert_eq!(ticket.socket(), "ws://10.0.0.5:9384/ws");
}

#[tokio::test]
async fn test_socket_ticket_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/websocket"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.socket_ticket(&token("stale")).await.unwrap_err();
    assert!(matches!(err, Error::SessionExpired), "got {err:?}");
}

#[tokio::test]
async fn test_socket_ticket_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/websocket"))
        .respond_with(ResponseTemplate::new(503).set_body_string("booting"))
        .mount(&server)
        .await;

    let err = client.socket_ticket(&token("abc")).await.unwrap_err();
    match err {
        Error::Http { status, ref body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "booting");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_socket_ticket_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/websocket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "socket": 42 } })))
        .mount(&server)
        .await;

    let err = client.socket_ticket(&token("abc")).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

// ── Weather ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_weather_current() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "52.5"))
        .and(query_param("longitude", "13.4"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_weather": { "temperature": 18.3, "is_day": 1, "windspeed": 7.2 }
        })))
        .mount(&server)
        .await;

    let base = Url::parse(&format!("{}/", server.uri())).unwrap();
    let weather = WeatherClient::with_client(reqwest::Client::new(), base);
    let info = weather.current(52.5, 13.4).await.unwrap();

    assert!((info.temperature - 18.3).abs() < f64::EPSILON);
    assert!(info.is_day);
}
