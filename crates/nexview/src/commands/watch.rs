//! Telemetry command handlers: `watch`, `stats`, `players`.

use nexview_core::SessionState;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::commands::Connected;
use crate::error::CliError;
use crate::output;

pub async fn stats(global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connected::start(global)?;
    let result = conn.first_snapshot(global.quiet).await;
    conn.finish().await;
    let snap = result?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &*snap,
        |s| output::snapshot_detail(s, color),
        |s| format!("{:.1}", s.cpu_absolute),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn players(global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connected::start(global)?;
    let result = conn.first_snapshot(global.quiet).await;
    conn.finish().await;
    let snap = result?;

    let out = output::render_list(
        &global.output,
        &snap.players,
        output::player_row,
        |p| p.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print every snapshot as it arrives until Ctrl-C or `--count` is reached.
///
/// Connection trouble is reported on stderr; the session keeps retrying.
pub async fn watch(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connected::start(global)?;
    let color = output::should_color(&global.color);
    let mut snapshots = conn.session.snapshots();
    let mut state = conn.session.state();
    let mut seen = 0_usize;

    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", conn.endpoint);
    }

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            snap = snapshots.next() => {
                let Some(snap) = snap else { break };
                let out = match global.output {
                    OutputFormat::Table => output::snapshot_line(&snap, color),
                    // one document per line so the stream stays parseable
                    _ => output::render_single(
                        &OutputFormat::JsonCompact,
                        &*snap,
                        |_| String::new(),
                        |_| String::new(),
                    ),
                };
                output::print_output(&out, global.quiet);
                seen += 1;
                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if !global.quiet {
                    if let SessionState::Reconnecting { attempt } = current {
                        eprintln!("connection lost, retrying (attempt {attempt})");
                    }
                }
                tracing::info!(state = %current, "session state");
            }
        }
    }

    conn.finish().await;
    Ok(())
}
