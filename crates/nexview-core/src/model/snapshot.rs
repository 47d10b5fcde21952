// ── Telemetry snapshot ──
//
// The decoded system state pushed by the server on every `stats` event.
// Every field has a defined default so a sparse or partially-null payload
// still yields a usable snapshot: numbers fall back to zero, lists to
// empty, optional sections to `None`.

use bytesize::ByteSize;
use serde::{Deserialize, Deserializer, Serialize};

/// Map an explicit JSON `null` to the type's default.
///
/// `#[serde(default)]` only covers *absent* fields; the server also sends
/// `null` for values it could not read.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Latest system state of the monitored host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySnapshot {
    /// Memory in use, bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub memory_bytes: u64,

    /// CPU load, percent.
    #[serde(deserialize_with = "null_as_default")]
    pub cpu_absolute: f64,

    #[serde(deserialize_with = "null_as_default")]
    pub network: NetworkCounters,

    /// Host uptime, seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub uptime: u64,

    /// Disk space in use, bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub disk_bytes: u64,

    /// Media players known to the host. Replaced wholesale each update.
    #[serde(rename = "audio", deserialize_with = "null_as_default")]
    pub players: Vec<MediaPlayer>,

    pub wifi: Option<WifiStatus>,

    pub battery: Option<BatteryStatus>,

    /// Output volume level.
    #[serde(deserialize_with = "null_as_default")]
    pub volume: i32,

    /// Display backlight level.
    #[serde(deserialize_with = "null_as_default")]
    pub backlight: i32,
}

impl TelemetrySnapshot {
    pub fn player(&self, id: &str) -> Option<&MediaPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The first player currently playing, if any.
    pub fn active_player(&self) -> Option<&MediaPlayer> {
        self.players.iter().find(|p| p.playing)
    }

    pub fn memory(&self) -> ByteSize {
        ByteSize::b(self.memory_bytes)
    }

    pub fn disk(&self) -> ByteSize {
        ByteSize::b(self.disk_bytes)
    }

    pub fn uptime(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.uptime)
    }
}

/// Cumulative network counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkCounters {
    #[serde(deserialize_with = "null_as_default")]
    pub rx_bytes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tx_bytes: u64,
}

/// One media player on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPlayer {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub playing: bool,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub art_url: Option<String>,
    /// Elapsed playback position.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: u64,
    /// Track length, same unit as `timestamp`.
    #[serde(deserialize_with = "null_as_default")]
    pub duration: u64,
}

impl MediaPlayer {
    /// Playback progress in `0.0..=1.0`, or `None` when the duration is unknown.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn progress(&self) -> Option<f64> {
        if self.duration == 0 {
            return None;
        }
        Some((self.timestamp as f64 / self.duration as f64).clamp(0.0, 1.0))
    }

    /// "Artist - Title", falling back to whichever is present.
    pub fn track_label(&self) -> Option<String> {
        match (self.artist.as_deref(), self.title.as_deref()) {
            (Some(a), Some(t)) => Some(format!("{a} - {t}")),
            (None, Some(t)) => Some(t.to_owned()),
            (Some(a), None) => Some(a.to_owned()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub ssid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub connected: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub percentage: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub plugged_in: bool,
}
