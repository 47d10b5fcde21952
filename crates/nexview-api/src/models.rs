// Request/response bodies for the HTTP side of the telemetry server.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub password: &'a str,
}

impl<'a> LoginRequest<'a> {
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            kind: "login",
            password,
        }
    }
}

/// Response of `POST /v1/login`: the long-lived bearer token.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Response of `GET /v1/websocket`.
#[derive(Debug, Deserialize)]
pub struct SocketResponse {
    pub data: SocketTicket,
}

/// Streaming-channel details: where to connect and the one-time ticket
/// to present in the auth frame.
#[derive(Clone, Deserialize)]
pub struct SocketTicket {
    #[serde(rename = "token")]
    ticket: String,
    socket: String,
}

impl SocketTicket {
    pub fn new(ticket: impl Into<String>, socket: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            socket: socket.into(),
        }
    }

    /// The one-time ticket. Single use; never log it.
    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    /// The streaming socket URL as sent by the server.
    pub fn socket(&self) -> &str {
        &self.socket
    }
}

impl fmt::Debug for SocketTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketTicket")
            .field("ticket", &"[REDACTED]")
            .field("socket", &self.socket)
            .finish()
    }
}
