//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use bytesize::ByteSize;
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use nexview_core::{MediaPlayer, TelemetrySnapshot, WeatherInfo};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Bold label when color is on.
fn label(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// the `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

// ── Domain views ─────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct PlayerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: &'static str,
    #[tabled(rename = "Track")]
    track: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

pub fn player_row(p: &MediaPlayer) -> PlayerRow {
    PlayerRow {
        id: p.id.clone(),
        name: p.name.clone(),
        state: if p.playing { "playing" } else { "paused" },
        track: p.track_label().unwrap_or_default(),
        progress: p.progress().map(percent).unwrap_or_default(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round() as i64)
}

/// Multi-line detail view of one snapshot.
pub fn snapshot_detail(snap: &TelemetrySnapshot, color: bool) -> String {
    let mut lines = vec![
        (
            "CPU",
            format!("{:.1}%", snap.cpu_absolute),
        ),
        ("Memory", snap.memory().to_string()),
        ("Disk", snap.disk().to_string()),
        ("Uptime", uptime(snap.uptime())),
        (
            "Network",
            format!(
                "rx {} / tx {}",
                ByteSize::b(snap.network.rx_bytes),
                ByteSize::b(snap.network.tx_bytes)
            ),
        ),
        ("Volume", snap.volume.to_string()),
        ("Backlight", snap.backlight.to_string()),
    ];

    if let Some(wifi) = &snap.wifi {
        let status = if wifi.connected { "connected" } else { "disconnected" };
        lines.push(("WiFi", format!("{} ({status})", wifi.ssid)));
    }
    if let Some(battery) = snap.battery {
        let plug = if battery.plugged_in { ", plugged in" } else { "" };
        lines.push(("Battery", format!("{}%{plug}", battery.percentage)));
    }

    let playing = snap.players.iter().filter(|p| p.playing).count();
    lines.push((
        "Players",
        format!("{} ({playing} playing)", snap.players.len()),
    ));
    if let Some(track) = snap.active_player().and_then(MediaPlayer::track_label) {
        lines.push(("Now playing", track));
    }

    lines
        .into_iter()
        .map(|(k, v)| format!("{}  {v}", label(&format!("{k:<11}"), color)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary used by `watch`.
pub fn snapshot_line(snap: &TelemetrySnapshot, color: bool) -> String {
    let time = chrono::Local::now().format("%H:%M:%S").to_string();
    let mut line = format!(
        "{}  cpu {:>5.1}%  mem {}  rx {}  tx {}",
        if color { time.dimmed().to_string() } else { time },
        snap.cpu_absolute,
        snap.memory(),
        ByteSize::b(snap.network.rx_bytes),
        ByteSize::b(snap.network.tx_bytes),
    );
    if let Some(track) = snap.active_player().and_then(MediaPlayer::track_label) {
        line.push_str("  > ");
        line.push_str(&track);
    }
    line
}

pub fn weather_detail(info: &WeatherInfo, color: bool) -> String {
    format!(
        "{}  {:.1} °C\n{}  {}",
        label("Temperature", color),
        info.temperature,
        label("Daylight   ", color),
        if info.is_day { "day" } else { "night" }
    )
}

fn uptime(d: Duration) -> String {
    humantime::format_duration(d).to_string()
}
