// Streaming-socket TLS against a local wss:// server with a self-signed
// certificate. The `TlsMode` handed to `StreamLink::open` decides whether
// the handshake succeeds.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rcgen::CertifiedKey;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use nexview_api::{Error, LinkEvent, StreamLink, TlsMode};

const WAIT: Duration = Duration::from_secs(5);
const HELLO: &str = r#"{"event":"hello","args":[]}"#;

// ── Helpers ─────────────────────────────────────────────────────────

/// Serve `wss://localhost:<port>/ws` with a fresh self-signed certificate.
/// Each connection gets one `hello` frame. Returns the URL and the PEM.
async fn self_signed_server() -> (Url, String) {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![cert.der().clone()], key)
    .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let Ok(mut ws) = tokio_tungstenite::accept_async(tls).await else {
                    return;
                };
                let _ = ws.send(Message::text(HELLO)).await;
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    let url = Url::parse(&format!("wss://localhost:{port}/ws")).unwrap();
    (url, cert.pem())
}

async fn first_message(url: &Url, tls: &TlsMode) -> Result<String, Error> {
    let mut link = StreamLink::open(url, tls, WAIT).await?;
    match link.next_event().await {
        LinkEvent::Message(text) => Ok(text),
        other => panic!("expected a message, got {other:?}"),
    }
}

// ── Verification modes ──────────────────────────────────────────────

#[tokio::test]
async fn test_system_roots_reject_self_signed_server() {
    let (url, _) = self_signed_server().await;
    let err = first_message(&url, &TlsMode::System).await.unwrap_err();
    assert!(matches!(err, Error::WebSocketConnect(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_accept_invalid_connects_to_self_signed_server() {
    let (url, _) = self_signed_server().await;
    let text = first_message(&url, &TlsMode::DangerAcceptInvalid).await.unwrap();
    assert_eq!(text, HELLO);
}

#[tokio::test]
async fn test_custom_ca_trusts_server_certificate() {
    let (url, pem) = self_signed_server().await;
    let dir = tempfile::tempdir().unwrap();
    let ca = dir.path().join("ca.pem");
    std::fs::write(&ca, pem).unwrap();

    let text = first_message(&url, &TlsMode::CustomCa(ca)).await.unwrap();
    assert_eq!(text, HELLO);
}

#[tokio::test]
async fn test_unreadable_ca_fails_before_connecting() {
    let (url, _) = self_signed_server().await;
    let missing = TlsMode::CustomCa("/nonexistent/ca.pem".into());
    let err = first_message(&url, &missing).await.unwrap_err();
    assert!(matches!(err, Error::Tls(_)), "unexpected error: {err:?}");
}
