// ── Frame classification ──
//
// Pure, stateless: text in, classified message out. The session task
// decides what to do with the result; nothing here touches state.

use nexview_api::frame::{EVENT_STATS, Frame, SESSION_EXPIRING_MARKER};
use thiserror::Error;

use crate::model::TelemetrySnapshot;

/// What an inbound frame means to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A fresh telemetry snapshot.
    Stats(TelemetrySnapshot),
    /// The server warned the bearer token is about to expire.
    SessionExpiring,
    /// Anything else, by event name. Unknown events are not errors.
    Ignored(String),
}

/// A single frame could not be understood. The frame is dropped; the
/// session carries on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not a valid envelope: {0}")]
    Envelope(#[source] nexview_api::Error),

    #[error("'{event}' frame has no payload argument")]
    MissingPayload { event: String },

    #[error("snapshot payload is malformed: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Classify one text message from the socket.
pub fn decode_frame(text: &str) -> Result<Inbound, DecodeError> {
    let frame = Frame::decode(text).map_err(DecodeError::Envelope)?;
    classify(frame)
}

/// Classify an already-parsed envelope.
pub fn classify(frame: Frame) -> Result<Inbound, DecodeError> {
    if frame.event == EVENT_STATS {
        let payload = frame
            .first_arg()
            .ok_or_else(|| DecodeError::MissingPayload {
                event: frame.event.clone(),
            })?;
        return decode_snapshot(payload).map(Inbound::Stats);
    }

    if frame.event.contains(SESSION_EXPIRING_MARKER) {
        return Ok(Inbound::SessionExpiring);
    }

    Ok(Inbound::Ignored(frame.event))
}

/// Decode the JSON snapshot carried in a `stats` frame.
pub fn decode_snapshot(payload: &str) -> Result<TelemetrySnapshot, DecodeError> {
    serde_json::from_str(payload).map_err(DecodeError::Payload)
}

/// Encode a snapshot the way the server embeds it in a `stats` frame.
pub fn encode_stats_frame(snapshot: &TelemetrySnapshot) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(snapshot)?;
    serde_json::to_string(&Frame::new(EVENT_STATS, vec![payload]))
}
