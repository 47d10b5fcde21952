//! Command dispatch: bridges CLI args -> session / one-shot calls -> output.

pub mod auth;
pub mod config_cmd;
pub mod player;
pub mod watch;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use nexview_config::Config;
use nexview_core::{Endpoint, Session, SessionConfig, TelemetrySnapshot, TlsVerification};

use crate::cli::{Cli, Command, CompletionsArgs, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(args, global).await,
        Command::Logout => auth::logout(global),
        Command::Watch(args) => watch::watch(args, global).await,
        Command::Stats => watch::stats(global).await,
        Command::Players => watch::players(global).await,
        Command::Player(args) => player::handle(args, global).await,
        Command::Weather(args) => weather::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            completions(&args);
            Ok(())
        }
    }
}

fn completions(args: &CompletionsArgs) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "nexview", &mut std::io::stdout());
}

// ── Shared setup ────────────────────────────────────────────────────

/// Load the config file with `--host` / `--port` applied on top.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = nexview_config::load_config()?;
    if let Some(ref host) = global.host {
        cfg.server.host = Some(host.clone());
    }
    if let Some(port) = global.port {
        cfg.server.port = port;
    }
    Ok(cfg)
}

/// Build the session configuration, applying `--timeout` and `--insecure`.
pub fn session_config(cfg: &Config, global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let mut sc = nexview_config::to_session_config(cfg)?;
    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        sc.timeout = Duration::from_secs(secs);
    }
    if global.insecure {
        sc.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(sc)
}

/// A session that has been asked to connect.
pub struct Connected {
    pub session: Session,
    pub endpoint: Endpoint,
    /// How long to wait for the first snapshot.
    pub wait: Duration,
}

impl Connected {
    /// Resolve endpoint and token from config, then start connecting.
    pub fn start(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = load_config(global)?;
        let endpoint = nexview_config::endpoint(&cfg)?;
        let token: SecretString = nexview_config::resolve_token(&cfg)?;
        let sc = session_config(&cfg, global)?;
        let wait = sc.timeout;

        tracing::debug!(endpoint = %endpoint, "starting session");
        let session = Session::new(sc);
        session.connect(endpoint.clone(), token)?;
        Ok(Self {
            session,
            endpoint,
            wait,
        })
    }

    /// Wait for the first snapshot, with a spinner on interactive stderr.
    pub async fn first_snapshot(&self, quiet: bool) -> Result<Arc<TelemetrySnapshot>, CliError> {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("Waiting for telemetry from {}", self.endpoint));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };

        let mut snapshots = self.session.snapshots();
        if let Some(snap) = snapshots.current() {
            spinner.finish_and_clear();
            return Ok(Arc::clone(snap));
        }
        let result = tokio::time::timeout(self.wait, snapshots.next()).await;
        spinner.finish_and_clear();

        match result {
            Ok(Some(snap)) => Ok(snap),
            Ok(None) | Err(_) => Err(CliError::NoTelemetry {
                endpoint: self.endpoint.to_string(),
                state: self.session.current_state().to_string(),
                seconds: self.wait.as_secs(),
            }),
        }
    }

    /// Log out of the live link and stop the session task.
    pub async fn finish(self) {
        self.session.disconnect().await;
        self.session.shutdown();
    }
}
