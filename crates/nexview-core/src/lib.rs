//! Session manager and telemetry model between `nexview-api` and consumers.
//!
//! - **[`Session`]**: Owns one streaming connection lineage: socket
//!   bootstrap, the auth handshake, frame dispatch, fixed-delay
//!   reconnection, and best-effort command sends. A single background task
//!   drives the state machine; handles talk to it over a channel.
//!
//! - **[`SessionState`]**: `Idle`, `Connecting`, `Authenticating`,
//!   `Streaming`, `Reconnecting`. Observable through [`Session::state`].
//!
//! - **[`SnapshotStream`]**: Subscription to the latest
//!   [`TelemetrySnapshot`], with `current()` / `latest()` / `next()`.
//!
//! - **[`oneshot`]**: Login and the weather lookup, single requests that
//!   need no session.
//!
//! - **Domain model** ([`model`]): Decoded snapshot shapes with the
//!   server's missing/null fields already defaulted, and [`MediaCommand`]
//!   for the player controls.

pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod oneshot;
pub mod reconnect;
pub mod session;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Endpoint, SessionConfig, TlsVerification};
pub use decode::{DecodeError, Inbound};
pub use error::CoreError;
pub use reconnect::{DEFAULT_RECONNECT_DELAY, ReconnectPolicy};
pub use session::{Session, SessionState};
pub use stream::{SharedSnapshot, SnapshotStream, SnapshotWatchStream};

pub use nexview_api::WeatherInfo;
pub use nexview_api::weather::DEFAULT_WEATHER_URL;

pub use model::{
    BatteryStatus, MediaCommand, MediaPlayer, NetworkCounters, TelemetrySnapshot, WifiStatus,
};
