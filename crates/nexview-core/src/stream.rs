// ── Reactive snapshot stream ──
//
// Subscription type for consuming telemetry updates from a Session.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::TelemetrySnapshot;

/// Latest snapshot as published by the session. `None` until the first
/// `stats` frame arrives, and again after logout.
pub type SharedSnapshot = Option<Arc<TelemetrySnapshot>>;

/// A subscription to the session's telemetry.
///
/// Provides both point-in-time access and change notification via
/// [`next`](Self::next) or by converting to a `Stream`.
pub struct SnapshotStream {
    current: SharedSnapshot,
    receiver: watch::Receiver<SharedSnapshot>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<SharedSnapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `next()`.
    pub fn current(&self) -> Option<&Arc<TelemetrySnapshot>> {
        self.current.as_ref()
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> SharedSnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot, skipping clears.
    /// Returns `None` once the session has shut down.
    pub async fn next(&mut self) -> Option<Arc<TelemetrySnapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            self.current.clone_from(&snap);
            if snap.is_some() {
                return snap;
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current value first, then every subsequent publish
/// (including `None` on logout).
pub struct SnapshotWatchStream {
    inner: WatchStream<SharedSnapshot>,
}

impl Stream for SnapshotWatchStream {
    type Item = SharedSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn next_skips_clears_and_ends_with_sender() {
        let (tx, rx) = watch::channel(None);
        let mut stream = SnapshotStream::new(rx);
        assert!(stream.current().is_none());

        let snap = Arc::new(TelemetrySnapshot {
            uptime: 7,
            ..TelemetrySnapshot::default()
        });
        tx.send_replace(Some(Arc::clone(&snap)));
        let got = stream.next().await.unwrap();
        assert_eq!(got.uptime, 7);
        assert_eq!(stream.current().map(|s| s.uptime), Some(7));

        tx.send_replace(None);
        drop(tx);
        assert!(stream.next().await.is_none());
        assert!(stream.latest().is_none());
    }

    #[tokio::test]
    async fn into_stream_yields_current_then_updates() {
        use tokio_stream::StreamExt;

        let (tx, rx) = watch::channel(None);
        let mut stream = SnapshotStream::new(rx).into_stream();
        assert!(stream.next().await.unwrap().is_none());

        tx.send_replace(Some(Arc::new(TelemetrySnapshot {
            uptime: 3,
            ..TelemetrySnapshot::default()
        })));
        let snap = stream.next().await.unwrap().unwrap();
        assert_eq!(snap.uptime, 3);

        drop(tx);
        assert!(stream.next().await.is_none());
    }
}
