// ── Session manager ──
//
// Owns the lifecycle of the streaming connection to one telemetry
// server: socket bootstrap, auth handshake, frame dispatch, reconnection,
// and the command send path.
//
// A single background task drives the state machine. `Session` handles
// talk to it over an mpsc queue; it publishes connection state and the
// latest snapshot through `watch` channels. Only the task ever touches
// the live link, the held credentials, or the retry timer, so at most
// one of each exists at any instant.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, IntoStaticStr};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use nexview_api::frame::{Frame, close_code};
use nexview_api::TransportConfig;
use nexview_api::{ApiClient, LinkEvent, SocketTicket, StreamLink};

use crate::config::{Endpoint, SessionConfig};
use crate::decode::{self, Inbound};
use crate::error::CoreError;
use crate::stream::{SharedSnapshot, SnapshotStream};

// ── SessionState ─────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum SessionState {
    /// No credentials held, nothing in flight.
    Idle,
    /// Requesting the socket address and one-time ticket.
    Connecting,
    /// Socket opening; auth frame not yet sent.
    Authenticating,
    /// Authenticated; snapshots flow and commands are transmitted.
    Streaming,
    /// Waiting out the retry delay. `attempt` counts consecutive failures.
    Reconnecting { attempt: u32 },
}

// ── Control messages ─────────────────────────────────────────────

enum Control {
    Connect {
        endpoint: Endpoint,
        token: SecretString,
    },
    Disconnect {
        done: oneshot::Sender<()>,
    },
    Send(Frame),
}

// ── Session ──────────────────────────────────────────────────────

/// Handle to a session manager.
///
/// Cheaply cloneable via `Arc<SessionInner>`. The background task lives
/// until [`shutdown`](Self::shutdown) is called or the last handle drops.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    control_tx: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<SessionState>,
    snapshot: watch::Receiver<SharedSnapshot>,
    cancel: CancellationToken,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Session {
    /// Create a session and spawn its driver task. Starts `Idle`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: SessionConfig) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SessionState::Idle);
        let (snapshot_tx, snapshot) = watch::channel(None);
        let cancel = CancellationToken::new();

        let driver = Driver {
            transport: config.transport(),
            config,
            control_rx,
            state_tx,
            snapshot_tx,
            cancel: cancel.clone(),
            credentials: None,
            failures: 0,
        };
        tokio::spawn(driver.run());

        Self {
            inner: Arc::new(SessionInner {
                control_tx,
                state,
                snapshot,
                cancel,
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start a connection lineage for `endpoint` using `token`.
    ///
    /// Returns immediately; progress is observable via [`state`](Self::state).
    /// A no-op when the session is already past `Idle`: call
    /// [`disconnect`](Self::disconnect) first to switch endpoints.
    pub fn connect(&self, endpoint: Endpoint, token: SecretString) -> Result<(), CoreError> {
        if token.expose_secret().is_empty() {
            return Err(CoreError::AuthenticationFailed {
                message: "empty session token".into(),
            });
        }
        self.inner
            .control_tx
            .send(Control::Connect { endpoint, token })
            .map_err(|_| CoreError::SessionClosed)
    }

    /// Tear down the connection, forget the token, cancel any pending
    /// retry, and clear the snapshot.
    ///
    /// When this returns the session is `Idle` and stays so until the
    /// next [`connect`](Self::connect).
    pub async fn disconnect(&self) {
        let (done, ack) = oneshot::channel();
        if self.inner.control_tx.send(Control::Disconnect { done }).is_err() {
            return;
        }
        let _ = ack.await;
    }

    /// Stop the background task. Any live link is closed.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Send `verb` targeting `target_id` over the live link.
    ///
    /// Fire-and-forget and best-effort: silently dropped unless the
    /// session is `Streaming` when the task processes it. Never queued
    /// for a later connection.
    pub fn send_command(&self, target_id: impl Into<String>, verb: impl AsRef<str>) {
        if self.current_state() != SessionState::Streaming {
            debug!(verb = verb.as_ref(), "command dropped: not streaming");
            return;
        }
        let frame = Frame::command(verb.as_ref(), target_id);
        let _ = self.inner.control_tx.send(Control::Send(frame));
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.clone()
    }

    pub fn current_state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// The latest snapshot, if any has arrived since login.
    pub fn snapshot(&self) -> SharedSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn snapshots(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot.clone())
    }
}

// ── Driver task ──────────────────────────────────────────────────

struct Credentials {
    endpoint: Endpoint,
    token: SecretString,
}

/// Next phase of the state machine.
enum Step {
    Idle,
    Connect,
    Authenticate(SocketTicket),
    Stream(StreamLink),
    Retry,
    Exit,
}

/// How a control message that arrived mid-phase affects that phase.
enum Interrupt {
    Stay,
    Stop(oneshot::Sender<()>),
    Exit,
}

struct Driver {
    config: SessionConfig,
    transport: TransportConfig,
    control_rx: mpsc::UnboundedReceiver<Control>,
    state_tx: watch::Sender<SessionState>,
    snapshot_tx: watch::Sender<SharedSnapshot>,
    cancel: CancellationToken,
    credentials: Option<Credentials>,
    failures: u32,
}

impl Driver {
    async fn run(mut self) {
        let mut step = Step::Idle;
        loop {
            step = match step {
                Step::Idle => self.idle().await,
                Step::Connect => self.connecting().await,
                Step::Authenticate(ticket) => self.authenticating(ticket).await,
                Step::Stream(link) => self.streaming(link).await,
                Step::Retry => self.reconnecting().await,
                Step::Exit => break,
            };
        }
        self.credentials = None;
        self.set_state(SessionState::Idle);
        debug!("session task exiting");
    }

    // ── Phases ───────────────────────────────────────────────────

    async fn idle(&mut self) -> Step {
        self.set_state(SessionState::Idle);
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Step::Exit,
                ctrl = self.control_rx.recv() => match ctrl {
                    None => return Step::Exit,
                    Some(Control::Connect { endpoint, token }) => {
                        info!(endpoint = %endpoint, "session starting");
                        self.credentials = Some(Credentials { endpoint, token });
                        self.failures = 0;
                        return Step::Connect;
                    }
                    Some(Control::Disconnect { done }) => self.stop(done),
                    Some(Control::Send(frame)) => {
                        debug!(event = %frame.event, "command dropped: idle");
                    }
                },
            }
        }
    }

    async fn connecting(&mut self) -> Step {
        let Some(creds) = self.credentials.as_ref() else {
            return Step::Idle;
        };
        self.set_state(SessionState::Connecting);

        let client = match creds
            .endpoint
            .base_url()
            .map_err(|e| e.to_string())
            .and_then(|url| ApiClient::new(url, &self.transport).map_err(|e| e.to_string()))
        {
            Ok(client) => client,
            Err(reason) => {
                warn!(%reason, "cannot build bootstrap client");
                return Step::Retry;
            }
        };
        let token = creds.token.clone();

        let fetch = client.socket_ticket(&token);
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Step::Exit,
                ctrl = self.control_rx.recv() => match self.interrupt(ctrl) {
                    Interrupt::Stay => {}
                    Interrupt::Stop(done) => {
                        self.stop(done);
                        return Step::Idle;
                    }
                    Interrupt::Exit => return Step::Exit,
                },
                result = &mut fetch => {
                    return match result {
                        Ok(ticket) => {
                            debug!(socket = ticket.socket(), "socket ticket issued");
                            Step::Authenticate(ticket)
                        }
                        Err(e) => {
                            warn!(error = %e, "socket bootstrap failed");
                            Step::Retry
                        }
                    };
                }
            }
        }
    }

    async fn authenticating(&mut self, ticket: SocketTicket) -> Step {
        self.set_state(SessionState::Authenticating);

        let url = match Url::parse(ticket.socket()) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, socket = ticket.socket(), "server sent an invalid socket URL");
                return Step::Retry;
            }
        };

        let tls = self.transport.tls.clone();
        let open = StreamLink::open(&url, &tls, self.config.timeout);
        tokio::pin!(open);

        let mut link = loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Step::Exit,
                ctrl = self.control_rx.recv() => match self.interrupt(ctrl) {
                    Interrupt::Stay => {}
                    Interrupt::Stop(done) => {
                        self.stop(done);
                        return Step::Idle;
                    }
                    Interrupt::Exit => return Step::Exit,
                },
                result = &mut open => match result {
                    Ok(link) => break link,
                    Err(e) => {
                        warn!(error = %e, "socket open failed");
                        return Step::Retry;
                    }
                },
            }
        };

        if let Err(e) = link.send(&Frame::auth(ticket.ticket())).await {
            warn!(error = %e, "auth frame could not be sent");
            return Step::Retry;
        }
        debug!("auth frame sent");
        Step::Stream(link)
    }

    async fn streaming(&mut self, mut link: StreamLink) -> Step {
        self.set_state(SessionState::Streaming);
        self.failures = 0;
        info!("streaming");

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    link.close(close_code::NORMAL, "Session closed").await;
                    return Step::Exit;
                }
                ctrl = self.control_rx.recv() => match ctrl {
                    Some(Control::Send(frame)) => {
                        trace!(event = %frame.event, "sending command");
                        if let Err(e) = link.send(&frame).await {
                            warn!(error = %e, "command send failed");
                            return Step::Retry;
                        }
                    }
                    other => match self.interrupt(other) {
                        Interrupt::Stay => {}
                        Interrupt::Stop(done) => {
                            link.close(close_code::NORMAL, "User logout").await;
                            self.stop(done);
                            return Step::Idle;
                        }
                        Interrupt::Exit => {
                            link.close(close_code::NORMAL, "Session closed").await;
                            return Step::Exit;
                        }
                    },
                },
                event = link.next_event() => match event {
                    LinkEvent::Message(text) => {
                        if self.dispatch(&text) {
                            link.close(close_code::NORMAL, "Reconnecting").await;
                            return Step::Retry;
                        }
                    }
                    LinkEvent::Closing { code, reason } => {
                        match code {
                            Some(code) if close_code::requires_reauth(code) => {
                                info!(code, %reason, "server invalidated the session");
                            }
                            Some(code) => warn!(code, %reason, "server closed the socket"),
                            None => warn!(%reason, "socket ended without a close code"),
                        }
                        link.close(close_code::NORMAL, "Reconnecting").await;
                        return Step::Retry;
                    }
                    LinkEvent::Failure(e) => {
                        warn!(error = %e, "socket failed");
                        return Step::Retry;
                    }
                },
            }
        }
    }

    async fn reconnecting(&mut self) -> Step {
        let attempt = self.failures;
        self.failures = self.failures.saturating_add(1);
        self.set_state(SessionState::Reconnecting {
            attempt: self.failures,
        });

        let delay = self.config.reconnect.delay_for(attempt);
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt = self.failures,
            "Waiting before reconnect"
        );

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Step::Exit,
                ctrl = self.control_rx.recv() => match self.interrupt(ctrl) {
                    Interrupt::Stay => {}
                    Interrupt::Stop(done) => {
                        self.stop(done);
                        return Step::Idle;
                    }
                    Interrupt::Exit => return Step::Exit,
                },
                () = &mut sleep => break,
            }
        }

        let has_token = self
            .credentials
            .as_ref()
            .is_some_and(|c| !c.token.expose_secret().is_empty());
        if has_token { Step::Connect } else { Step::Idle }
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Handle a control message in any phase but `Idle`. Connect is a
    /// no-op guard; sends are dropped (the streaming phase intercepts
    /// them before calling this).
    fn interrupt(&self, ctrl: Option<Control>) -> Interrupt {
        match ctrl {
            None => Interrupt::Exit,
            Some(Control::Disconnect { done }) => Interrupt::Stop(done),
            Some(Control::Connect { endpoint, .. }) => {
                debug!(endpoint = %endpoint, "connect ignored: session already active");
                Interrupt::Stay
            }
            Some(Control::Send(frame)) => {
                debug!(event = %frame.event, "command dropped: not streaming");
                Interrupt::Stay
            }
        }
    }

    /// Classify and apply one inbound message. Returns `true` when the
    /// session must re-run the handshake.
    fn dispatch(&self, text: &str) -> bool {
        match decode::decode_frame(text) {
            Ok(Inbound::Stats(snapshot)) => {
                self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
                false
            }
            Ok(Inbound::SessionExpiring) => {
                info!("server warned the session is expiring, re-authenticating");
                true
            }
            Ok(Inbound::Ignored(event)) => {
                trace!(%event, "ignoring event");
                false
            }
            Err(e) => {
                warn!(error = %e, "dropping undecodable frame");
                false
            }
        }
    }

    /// Forget credentials and the snapshot, go `Idle`, then acknowledge.
    fn stop(&mut self, done: oneshot::Sender<()>) {
        self.credentials = None;
        self.failures = 0;
        self.snapshot_tx.send_replace(None);
        self.set_state(SessionState::Idle);
        info!("session disconnected");
        let _ = done.send(());
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "session state");
        }
    }
}
