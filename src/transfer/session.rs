//! Transfer sessions: one driver task per request.
//!
//! A [`TransferSession`] owns everything one transfer needs: the request, a
//! [`CancellationToken`], and (once started) a [`ByteSink`] and
//! [`ProgressTracker`] that only its driver task touches. Starting a session
//! spawns that task and returns a [`TransferHandle`], through which the caller
//! cancels, observes the state, and awaits the [`TransferOutcome`].
//!
//! # State machine
//!
//! ```text
//! Idle ──► Active ──► Completed
//!   │         ├─────► Cancelled
//!   │         └─────► Failed
//!   └────────────────► Failed      (request rejected before any I/O)
//! ```
//!
//! The terminal transition happens once. Progress callbacks and the terminal
//! decision run under a per-session gate that [`TransferHandle::cancel`] also
//! takes, so once `cancel` returns no Active progress callback is still
//! running or yet to come.

use std::cell::Cell;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::cancel::CancellationToken;
use super::error::{ErrorKind, TransferError};
use super::filename::{resolve_final_name, sanitize_filename};
use super::notifier::Notifier;
use super::outcome::TransferOutcome;
use super::progress::{ProgressSnapshot, ProgressTracker};
use super::request::{Direction, TransferRequest};
use super::sink::ByteSink;
use super::transport::{Connector, TransportAdapter, TransportEvent};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    /// Created, not yet driving the transport.
    Idle,
    /// Moving bytes.
    Active,
    /// Finished successfully; the payload was released.
    Completed,
    /// Stopped at the caller's request.
    Cancelled,
    /// Stopped by an error.
    Failed,
}

impl TransferStatus {
    /// Returns true for Completed, Cancelled and Failed.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

/// Mutable bookkeeping of one session, mirrored to its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferState {
    /// Current status.
    pub status: TransferStatus,
    /// Bytes moved so far; never decreases.
    pub bytes_transferred: u64,
    /// Declared total, once known.
    pub total_bytes: Option<u64>,
    /// Kind and message of the failure, only when Failed.
    pub last_error: Option<(ErrorKind, String)>,
}

impl Default for TransferState {
    fn default() -> Self {
        Self {
            status: TransferStatus::Idle,
            bytes_transferred: 0,
            total_bytes: None,
            last_error: None,
        }
    }
}

thread_local! {
    /// Address of the gate whose callback is running on this thread, or 0.
    static HELD_GATE: Cell<usize> = const { Cell::new(0) };
}

/// Serializes notifier callbacks against `cancel`.
#[derive(Debug, Default)]
struct ProgressGate {
    lock: Mutex<()>,
}

/// Marks `gate` as held by this thread until dropped, restoring whatever
/// was held before.
struct HeldGateMark {
    previous: usize,
}

impl HeldGateMark {
    fn set(gate: &ProgressGate) -> Self {
        let previous = HELD_GATE.with(|held| held.replace(gate.id()));
        Self { previous }
    }
}

impl Drop for HeldGateMark {
    fn drop(&mut self) {
        HELD_GATE.with(|held| held.set(self.previous));
    }
}

impl ProgressGate {
    fn id(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _mark = HeldGateMark::set(self);
        f()
    }

    fn held_by_current_thread(&self) -> bool {
        HELD_GATE.with(Cell::get) == self.id()
    }

    /// Waits for an in-flight callback to return. A cancel issued from inside
    /// one of this gate's own callbacks returns immediately; a callback of
    /// another session still waits.
    fn quiesce(&self) {
        if self.held_by_current_thread() {
            return;
        }
        drop(self.lock.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

/// One transfer, before it is started.
pub struct TransferSession {
    request: TransferRequest,
    connector: Arc<dyn Connector>,
    abort_grace: Duration,
    token: CancellationToken,
}

impl std::fmt::Debug for TransferSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferSession")
            .field("request", &self.request)
            .field("abort_grace", &self.abort_grace)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl TransferSession {
    /// Creates a session for `request` that will open its transport through
    /// `connector`.
    #[must_use]
    pub fn new(
        request: TransferRequest,
        connector: Arc<dyn Connector>,
        abort_grace: Duration,
    ) -> Self {
        Self {
            request,
            connector,
            abort_grace,
            token: CancellationToken::new(),
        }
    }

    /// Spawns the driver task and returns immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start<N>(self, notifier: N) -> TransferHandle
    where
        N: Notifier + 'static,
    {
        let gate = Arc::new(ProgressGate::default());
        let (state_tx, state_rx) = watch::channel(TransferState::default());

        let driver = Driver {
            token: self.token.observer(),
            request: self.request,
            connector: self.connector,
            abort_grace: self.abort_grace,
            gate: Arc::clone(&gate),
            notifier: Box::new(notifier),
            state_tx,
            state: TransferState::default(),
        };
        let join = tokio::spawn(driver.run());

        TransferHandle {
            token: self.token,
            gate,
            state: state_rx,
            join: Some(join),
        }
    }
}

/// Caller's side of a running session.
///
/// Dropping the handle before awaiting [`result`](Self::result) cancels the
/// transfer.
#[derive(Debug)]
pub struct TransferHandle {
    token: CancellationToken,
    gate: Arc<ProgressGate>,
    state: watch::Receiver<TransferState>,
    join: Option<JoinHandle<TransferOutcome>>,
}

impl TransferHandle {
    /// Requests cancellation.
    ///
    /// Idempotent, and a no-op once the session is terminal. When it returns,
    /// no progress callback for this session is running or will run; the
    /// terminal notification still arrives once.
    pub fn cancel(&self) {
        if self.state.borrow().status.is_terminal() {
            return;
        }
        if !self.token.is_cancelled() {
            debug!("transfer cancellation requested");
        }
        self.token.cancel();
        self.gate.quiesce();
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TransferStatus {
        self.state.borrow().status
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> TransferState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<TransferState> {
        self.state.clone()
    }

    /// Waits for the terminal outcome.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the notifier, which runs on the driver task.
    pub async fn result(mut self) -> TransferOutcome {
        let Some(join) = self.join.take() else {
            return TransferOutcome::Cancelled;
        };
        match join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => TransferOutcome::Cancelled,
        }
    }
}

impl Drop for TransferHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.token.cancel();
        }
    }
}

enum Stop {
    Cancelled,
    Failed(TransferError),
}

struct Driver {
    request: TransferRequest,
    connector: Arc<dyn Connector>,
    abort_grace: Duration,
    token: CancellationToken,
    gate: Arc<ProgressGate>,
    notifier: Box<dyn Notifier>,
    state_tx: watch::Sender<TransferState>,
    state: TransferState,
}

impl Driver {
    #[instrument(
        name = "transfer",
        skip_all,
        fields(direction = %self.request.direction(), url = %self.request.resource_identifier())
    )]
    async fn run(mut self) -> TransferOutcome {
        let url = match self
            .request
            .validate()
            .and_then(|()| self.request.target_url())
        {
            Ok(url) => url,
            Err(error) => {
                warn!(%error, "transfer request rejected");
                return self.conclude(TransferOutcome::Failed(error));
            }
        };

        let mut adapter = self.connector.open(&self.request, url.clone());
        self.state.status = TransferStatus::Active;
        self.publish();
        debug!("transfer active");

        let mut sink = ByteSink::new();
        let mut tracker = ProgressTracker::new();
        let outcome = match self
            .pump(adapter.as_mut(), &url, &mut sink, &mut tracker)
            .await
        {
            Ok(server_name) => TransferOutcome::Success {
                payload: sink.finish(),
                final_name: self.final_name(server_name.as_deref(), &url),
            },
            Err(Stop::Cancelled) => {
                sink.discard();
                self.close_transport(adapter.as_mut()).await;
                TransferOutcome::Cancelled
            }
            Err(Stop::Failed(error)) => {
                sink.discard();
                self.close_transport(adapter.as_mut()).await;
                TransferOutcome::Failed(error)
            }
        };
        self.conclude(outcome)
    }

    /// Pulls transport events until the exchange finishes, fails, or the
    /// token trips. Returns the server-declared file name on success.
    async fn pump(
        &mut self,
        adapter: &mut dyn TransportAdapter,
        url: &Url,
        sink: &mut ByteSink,
        tracker: &mut ProgressTracker,
    ) -> Result<Option<String>, Stop> {
        let mut server_name = None;
        loop {
            let event = tokio::select! {
                biased;
                () = self.token.cancelled() => return Err(Stop::Cancelled),
                event = adapter.next_event() => event,
            };
            // An event that raced the cancel is dropped unapplied.
            if self.token.is_cancelled() {
                return Err(Stop::Cancelled);
            }

            match event.map_err(Stop::Failed)? {
                TransportEvent::Opened {
                    total_bytes,
                    file_name,
                } => {
                    if let Some(total) = total_bytes
                        && tracker.declare_total(total)
                    {
                        if self.request.direction() == Direction::Download {
                            sink.reserve_for(total);
                        }
                        self.state.total_bytes = Some(total);
                        self.publish();
                    }
                    server_name = file_name;
                }
                TransportEvent::Data(chunk) => {
                    let len = chunk.len() as u64;
                    let next = tracker.transferred().saturating_add(len);
                    if let Some(total) = tracker.total()
                        && next > total
                    {
                        return Err(Stop::Failed(TransferError::malformed(
                            url.as_str(),
                            format!("received {next} bytes, more than the declared {total}"),
                        )));
                    }
                    sink.append(&chunk);
                    tracker.advance(len);
                    self.report(tracker.snapshot());
                }
                TransportEvent::Sent { cumulative } => {
                    let cumulative = tracker
                        .total()
                        .map_or(cumulative, |total| cumulative.min(total));
                    if cumulative > tracker.transferred() {
                        tracker.advance_to(cumulative);
                        self.report(tracker.snapshot());
                    }
                }
                TransportEvent::Finished { response } => {
                    if self.request.direction() == Direction::Download
                        && let Some(total) = tracker.total()
                        && tracker.transferred() != total
                    {
                        return Err(Stop::Failed(TransferError::malformed(
                            url.as_str(),
                            format!(
                                "body ended after {} of {total} declared bytes",
                                tracker.transferred()
                            ),
                        )));
                    }
                    // A 2xx answer means the server took the whole body.
                    if self.request.direction() == Direction::Upload
                        && let Some(total) = tracker.total()
                        && tracker.transferred() < total
                    {
                        tracker.advance_to(total);
                        self.report(tracker.snapshot());
                    }
                    sink.append(&response);
                    return Ok(server_name);
                }
            }
        }
    }

    fn report(&mut self, snapshot: ProgressSnapshot) {
        self.state.bytes_transferred = snapshot.bytes_transferred;
        self.publish();
        let token = &self.token;
        let notifier = &self.notifier;
        self.gate.with_lock(|| {
            if !token.is_cancelled() {
                notifier.on_progress(&snapshot);
            }
        });
    }

    async fn close_transport(&self, adapter: &mut dyn TransportAdapter) {
        if tokio::time::timeout(self.abort_grace, adapter.abort())
            .await
            .is_err()
        {
            warn!(
                grace_ms = u64::try_from(self.abort_grace.as_millis()).unwrap_or(u64::MAX),
                "transport did not acknowledge abort within grace period"
            );
        }
    }

    fn final_name(&self, server_name: Option<&str>, url: &Url) -> String {
        match self.request.direction() {
            Direction::Download => {
                resolve_final_name(server_name, self.request.destination_hint(), url)
            }
            Direction::Upload => {
                let hint = self.request.destination_hint().trim();
                let name = if hint.is_empty() {
                    self.request
                        .payload_source()
                        .first()
                        .map_or("", |blob| blob.name())
                } else {
                    hint
                };
                sanitize_filename(name)
            }
        }
    }

    /// Records the terminal state and delivers the final notification.
    ///
    /// A success that lost the race against `cancel` (token tripped before
    /// the gate was taken) becomes Cancelled and its payload is dropped.
    fn conclude(mut self, outcome: TransferOutcome) -> TransferOutcome {
        let gate = Arc::clone(&self.gate);
        gate.with_lock(move || {
            let outcome = match outcome {
                TransferOutcome::Success { .. } if self.token.is_cancelled() => {
                    TransferOutcome::Cancelled
                }
                other => other,
            };

            self.state.status = outcome.status();
            match &outcome {
                TransferOutcome::Success {
                    payload,
                    final_name,
                } => {
                    info!(bytes = payload.len(), name = %final_name, "transfer complete");
                }
                TransferOutcome::Cancelled => {
                    info!(bytes = self.state.bytes_transferred, "transfer cancelled");
                }
                TransferOutcome::Failed(error) => {
                    warn!(kind = error.kind().as_str(), %error, "transfer failed");
                    self.state.last_error = Some((error.kind(), error.to_string()));
                }
            }
            self.publish();
            self.notifier.on_finished(&outcome);
            outcome
        })
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
