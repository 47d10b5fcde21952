//! `player <id> <action>`: send a media command to one player.

use crate::cli::{GlobalOpts, PlayerArgs};
use crate::commands::Connected;
use crate::error::CliError;

pub async fn handle(args: PlayerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connected::start(global)?;

    // The first snapshot proves the link is streaming and lists the players.
    let snap = match conn.first_snapshot(global.quiet).await {
        Ok(snap) => snap,
        Err(e) => {
            conn.finish().await;
            return Err(e);
        }
    };

    let Some(player) = snap.player(&args.id) else {
        conn.finish().await;
        return Err(CliError::NotFound {
            resource_type: "player".into(),
            identifier: args.id,
            list_command: "players".into(),
        });
    };

    tracing::debug!(player = %player.id, verb = args.action.verb(), "sending media command");
    conn.session.send_command(&player.id, args.action.verb());
    let name = if player.name.is_empty() {
        player.id.clone()
    } else {
        player.name.clone()
    };

    // Commands queue ahead of the disconnect, so the frame is written first.
    conn.finish().await;

    if !global.quiet {
        eprintln!("Sent {} to {name}", args.action);
    }
    Ok(())
}
