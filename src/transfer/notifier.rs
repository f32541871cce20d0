//! Push interface through which a session reports progress and its outcome.

use tokio::sync::watch;

use super::outcome::TransferOutcome;
use super::progress::ProgressSnapshot;

/// Receives progress snapshots and the terminal outcome of one session.
///
/// Callbacks run on the session's driver task, one at a time. They should
/// return quickly; any throttling or rendering belongs to the implementor
/// (see [`WatchNotifier`] for a lossy hand-off to another task).
pub trait Notifier: Send + Sync {
    /// Called after each data or credit event while the session is Active.
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// Called exactly once, when the session reaches a terminal state.
    fn on_finished(&self, outcome: &TransferOutcome) {
        let _ = outcome;
    }
}

impl<F> Notifier for F
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self(snapshot);
    }
}

/// Notifier that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}
}

/// Notifier that publishes only the latest snapshot on a watch channel.
///
/// The driver never waits on the receiver: a renderer that falls behind just
/// skips intermediate snapshots.
#[derive(Debug)]
pub struct WatchNotifier {
    tx: watch::Sender<Option<ProgressSnapshot>>,
}

impl WatchNotifier {
    /// Creates the notifier and the receiving end for the UI task.
    #[must_use]
    pub fn channel() -> (Self, watch::Receiver<Option<ProgressSnapshot>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }
}

impl Notifier for WatchNotifier {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.tx.send_replace(Some(snapshot.clone()));
    }
}
