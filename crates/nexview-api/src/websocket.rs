//! Streaming socket transport.
//!
//! A [`StreamLink`] is one live WebSocket connection to the telemetry
//! server. It is opened, read event-by-event, and closed; it is never
//! reused across reconnects. Reconnection policy lives in `nexview-core`.
//!
//! # Example
//!
//! ```rust,ignore
//! use nexview_api::frame::{Frame, close_code};
//! use nexview_api::websocket::{LinkEvent, StreamLink};
//! use nexview_api::TlsMode;
//!
//! let mut link = StreamLink::open(&socket_url, &TlsMode::System, Duration::from_secs(10)).await?;
//! link.send(&Frame::auth(ticket.ticket())).await?;
//!
//! while let LinkEvent::Message(text) = link.next_event().await {
//!     println!("{text}");
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;
use crate::frame::Frame;
use crate::tls;
use crate::transport::TlsMode;

/// Something that happened on a live link.
#[derive(Debug)]
pub enum LinkEvent {
    /// A text message arrived.
    Message(String),
    /// The server closed the connection. `code` is absent when the
    /// stream ended without a close frame.
    Closing { code: Option<u16>, reason: String },
    /// The transport failed.
    Failure(Error),
}

/// One live streaming connection.
pub struct StreamLink {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl StreamLink {
    /// Open a connection to `url`, failing after `timeout`.
    ///
    /// `wss://` URLs are verified according to `tls_mode`.
    pub async fn open(url: &Url, tls_mode: &TlsMode, timeout: Duration) -> Result<Self, Error> {
        tracing::info!(url = %url, "Connecting to WebSocket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let request = ClientRequestBuilder::new(uri);

        let connector = if url.scheme() == "wss" {
            Some(Connector::Rustls(Arc::new(tls::client_config(tls_mode)?)))
        } else {
            None
        };
        let connect =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector);

        let (ws, _response) = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: timeout.as_secs(),
            })?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("WebSocket connected");
        Ok(Self { ws })
    }

    /// Serialize and send a frame.
    pub async fn send(&mut self, frame: &Frame) -> Result<(), Error> {
        let text = frame.encode()?;
        self.ws
            .send(tungstenite::Message::text(text))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))
    }

    /// Wait for the next meaningful event. Pings, pongs, and binary
    /// messages are consumed silently.
    ///
    /// Cancel-safe: dropping the future loses no text message.
    pub async fn next_event(&mut self) -> LinkEvent {
        loop {
            match self.ws.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return LinkEvent::Message(text.as_str().to_owned());
                }
                Some(Ok(tungstenite::Message::Ping(_))) => {
                    // tungstenite queues the pong; it goes out with the next write/flush
                    tracing::trace!("WebSocket ping");
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    return match frame {
                        Some(cf) => {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                            LinkEvent::Closing {
                                code: Some(u16::from(cf.code)),
                                reason: cf.reason.as_str().to_owned(),
                            }
                        }
                        None => {
                            tracing::info!("WebSocket close frame received (no payload)");
                            LinkEvent::Closing {
                                code: None,
                                reason: String::new(),
                            }
                        }
                    };
                }
                Some(Err(e)) => {
                    return LinkEvent::Failure(Error::WebSocketConnect(e.to_string()));
                }
                None => {
                    tracing::info!("WebSocket stream ended");
                    return LinkEvent::Closing {
                        code: None,
                        reason: "stream ended".into(),
                    };
                }
                Some(Ok(_)) => {
                    // Binary, Pong, Frame -- ignore
                }
            }
        }
    }

    /// Send a close frame with `code` and drop the connection.
    ///
    /// Errors are logged, not returned: the link is going away regardless.
    pub async fn close(mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_owned().into(),
        };
        if let Err(e) = self.ws.close(Some(frame)).await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn local_server() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
        (listener, url)
    }

    #[tokio::test]
    async fn sends_frames_and_reports_close_code() {
        let (listener, url) = local_server().await;

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let first = ws.next().await.unwrap().unwrap();
            ws.send(tungstenite::Message::text(r#"{"event":"hello","args":[]}"#))
                .await
                .unwrap();
            ws.close(Some(CloseFrame {
                code: CloseCode::from(4004),
                reason: "expired".into(),
            }))
            .await
            .unwrap();
            first.into_text().unwrap().as_str().to_owned()
        });

        let mut link = StreamLink::open(&url, &TlsMode::System, Duration::from_secs(5)).await.unwrap();
        link.send(&Frame::auth("tkt1")).await.unwrap();

        match link.next_event().await {
            LinkEvent::Message(text) => assert_eq!(text, r#"{"event":"hello","args":[]}"#),
            other => panic!("expected message, got {other:?}"),
        }
        match link.next_event().await {
            LinkEvent::Closing { code, reason } => {
                assert_eq!(code, Some(4004));
                assert_eq!(reason, "expired");
            }
            other => panic!("expected close, got {other:?}"),
        }

        let received = server.await.unwrap();
        assert_eq!(received, r#"{"event":"auth","args":["tkt1"]}"#);
    }

    #[tokio::test]
    async fn open_fails_when_nothing_listens() {
        let (listener, url) = local_server().await;
        drop(listener);

        let err = StreamLink::open(&url, &TlsMode::System, Duration::from_secs(5)).await.err().unwrap();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
