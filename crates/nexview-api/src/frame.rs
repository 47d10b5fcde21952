//! Streaming-socket envelope.
//!
//! Every message on the socket, in both directions, is a JSON object of
//! the shape `{ "event": "<name>", "args": ["<string>", ...] }`.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Outbound handshake event carrying the one-time ticket.
pub const EVENT_AUTH: &str = "auth";

/// Inbound telemetry event; `args[0]` is a JSON-encoded snapshot.
pub const EVENT_STATS: &str = "stats";

/// Substring the server puts in the event name shortly before the
/// bearer token stops being valid.
pub const SESSION_EXPIRING_MARKER: &str = "session expiring";

/// Close codes used by the server.
pub mod close_code {
    /// Normal closure. Sent by the client on logout and teardown.
    pub const NORMAL: u16 = 1000;
    /// The auth frame or token was rejected.
    pub const SESSION_INVALID: u16 = 4001;
    /// The session expired server-side.
    pub const SESSION_EXPIRED: u16 = 4004;

    /// Whether a close code means the client must run the handshake again.
    pub fn requires_reauth(code: u16) -> bool {
        matches!(code, SESSION_INVALID | SESSION_EXPIRED)
    }
}

/// A single socket message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Frame {
    pub fn new(event: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }

    /// The handshake frame: `{"event":"auth","args":[ticket]}`.
    pub fn auth(ticket: &str) -> Self {
        Self::new(EVENT_AUTH, vec![ticket.to_owned()])
    }

    /// A command frame: `{"event":verb,"args":[target]}`.
    pub fn command(verb: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(verb, vec![target.into()])
    }

    /// First argument, if any.
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })
    }

    pub fn decode(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn auth_frame_wire_shape() {
        let json = Frame::auth("tkt1").encode().unwrap();
        assert_eq!(json, r#"{"event":"auth","args":["tkt1"]}"#);
    }

    #[test]
    fn command_frame_wire_shape() {
        let json = Frame::command("audio-play-pause", "spotify").encode().unwrap();
        assert_eq!(json, r#"{"event":"audio-play-pause","args":["spotify"]}"#);
    }

    #[test]
    fn decode_tolerates_missing_args() {
        let frame = Frame::decode(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(frame.event, "ping");
        assert!(frame.args.is_empty());
        assert_eq!(frame.first_arg(), None);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Frame::decode("not json").unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reauth_codes() {
        assert!(close_code::requires_reauth(4001));
        assert!(close_code::requires_reauth(4004));
        assert!(!close_code::requires_reauth(1000));
        assert!(!close_code::requires_reauth(1006));
    }
}
