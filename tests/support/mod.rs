//! Shared test helpers: a scripted in-process transport and a recording
//! notifier.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use media_transfer::transfer::{
    Connector, ErrorKind, Notifier, ProgressSnapshot, TransferError, TransferOutcome,
    TransferRequest, TransportAdapter, TransportEvent,
};
use tokio::sync::mpsc;
use url::Url;

type Scripted = Result<TransportEvent, TransferError>;

/// Connector whose single adapter replays events pushed through a [`Script`].
///
/// When the script is empty the adapter waits, so tests decide exactly when
/// each event reaches the session.
pub struct ScriptedConnector {
    events: Mutex<Option<mpsc::UnboundedReceiver<Scripted>>>,
    opens: AtomicUsize,
    aborted: Arc<AtomicBool>,
    hang_on_abort: bool,
    opened_url: Mutex<Option<Url>>,
}

impl ScriptedConnector {
    pub fn new() -> (Arc<Self>, Script) {
        Self::build(false)
    }

    /// Adapter that never acknowledges `abort`.
    pub fn hanging_on_abort() -> (Arc<Self>, Script) {
        Self::build(true)
    }

    fn build(hang_on_abort: bool) -> (Arc<Self>, Script) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            events: Mutex::new(Some(rx)),
            opens: AtomicUsize::new(0),
            aborted: Arc::new(AtomicBool::new(false)),
            hang_on_abort,
            opened_url: Mutex::new(None),
        });
        (connector, Script { tx })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn opened_url(&self) -> Option<Url> {
        self.opened_url.lock().unwrap().clone()
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, _request: &TransferRequest, url: Url) -> Box<dyn TransportAdapter> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.opened_url.lock().unwrap() = Some(url);
        let events = self.events.lock().unwrap().take();
        Box::new(ScriptedAdapter {
            events,
            aborted: Arc::clone(&self.aborted),
            hang_on_abort: self.hang_on_abort,
        })
    }
}

struct ScriptedAdapter {
    events: Option<mpsc::UnboundedReceiver<Scripted>>,
    aborted: Arc<AtomicBool>,
    hang_on_abort: bool,
}

#[async_trait]
impl TransportAdapter for ScriptedAdapter {
    async fn next_event(&mut self) -> Result<TransportEvent, TransferError> {
        match self.events.as_mut() {
            Some(rx) => match rx.recv().await {
                Some(event) => event,
                None => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    async fn abort(&mut self) {
        self.aborted.store(true, Ordering::SeqCst);
        if self.hang_on_abort {
            std::future::pending::<()>().await;
        }
    }
}

/// Feeds events to a [`ScriptedConnector`]'s adapter.
#[derive(Clone)]
pub struct Script {
    tx: mpsc::UnboundedSender<Scripted>,
}

impl Script {
    pub fn opened(&self, total_bytes: Option<u64>) -> &Self {
        self.push(Ok(TransportEvent::Opened {
            total_bytes,
            file_name: None,
        }))
    }

    pub fn opened_named(&self, total_bytes: Option<u64>, name: &str) -> &Self {
        self.push(Ok(TransportEvent::Opened {
            total_bytes,
            file_name: Some(name.to_string()),
        }))
    }

    pub fn data(&self, len: usize) -> &Self {
        self.push(Ok(TransportEvent::Data(Bytes::from(vec![b'x'; len]))))
    }

    pub fn sent(&self, cumulative: u64) -> &Self {
        self.push(Ok(TransportEvent::Sent { cumulative }))
    }

    pub fn finished(&self) -> &Self {
        self.finished_with(b"")
    }

    pub fn finished_with(&self, response: &[u8]) -> &Self {
        self.push(Ok(TransportEvent::Finished {
            response: Bytes::copy_from_slice(response),
        }))
    }

    pub fn fail(&self, error: TransferError) -> &Self {
        self.push(Err(error))
    }

    fn push(&self, event: Scripted) -> &Self {
        // The session may already be gone; late events are simply unused.
        let _ = self.tx.send(event);
        self
    }
}

#[derive(Default)]
struct Recorded {
    snapshots: Mutex<Vec<ProgressSnapshot>>,
    finished: Mutex<Vec<(bool, Option<ErrorKind>)>>,
}

/// Notifier that keeps every snapshot and terminal notification.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Recorded>,
}

impl RecordingNotifier {
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.inner.snapshots.lock().unwrap().clone()
    }

    pub fn bytes(&self) -> Vec<u64> {
        self.snapshots()
            .iter()
            .map(|s| s.bytes_transferred)
            .collect()
    }

    pub fn percents(&self) -> Vec<Option<f64>> {
        self.snapshots().iter().map(|s| s.percent).collect()
    }

    /// `(was_success, error_kind)` per terminal notification.
    pub fn finished(&self) -> Vec<(bool, Option<ErrorKind>)> {
        self.inner.finished.lock().unwrap().clone()
    }

    /// Waits until at least `count` snapshots were recorded.
    pub async fn wait_for_snapshots(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.inner.snapshots.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for progress snapshots");
    }
}

impl Notifier for RecordingNotifier {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.inner.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn on_finished(&self, outcome: &TransferOutcome) {
        self.inner
            .finished
            .lock()
            .unwrap()
            .push((outcome.is_success(), outcome.error_kind()));
    }
}
