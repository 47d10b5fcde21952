// ── Domain model ──
//
// Types consumers see. Wire details (frame envelope, close codes) stay in
// nexview-api; these are the decoded, defaulted shapes.

pub mod command;
pub mod snapshot;

pub use command::MediaCommand;
pub use snapshot::{BatteryStatus, MediaPlayer, NetworkCounters, TelemetrySnapshot, WifiStatus};
