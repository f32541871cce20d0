//! Engine entry point: one shared connector, one session per request.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::config::{EngineConfig, EngineError};
use super::notifier::Notifier;
use super::request::TransferRequest;
use super::session::{TransferHandle, TransferSession};
use super::transport::{Connector, HttpConnector};

/// Starts transfer sessions against a shared connector.
///
/// Sessions started from the same engine share the HTTP connection pool but
/// nothing else: each has its own token, sink and tracker.
///
/// # Example
///
/// ```no_run
/// use media_transfer::transfer::{EngineConfig, NullNotifier, TransferEngine, TransferRequest};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = TransferEngine::new(EngineConfig::default())?;
/// let handle = engine.start_transfer(
///     TransferRequest::download("https://media.example/api/media_stream/?path=a.mp4"),
///     NullNotifier,
/// );
/// let outcome = handle.result().await;
/// println!("{:?}", outcome.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TransferEngine {
    connector: Arc<dyn Connector>,
    abort_grace: Duration,
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("abort_grace", &self.abort_grace)
            .finish_non_exhaustive()
    }
}

impl TransferEngine {
    /// Creates an engine that talks HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the config is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let connector = HttpConnector::new(&config)?;
        debug!(
            connect_timeout = ?config.connect_timeout,
            upload_chunk_size = config.upload_chunk_size,
            "transfer engine created"
        );
        Ok(Self::with_connector(&config, Arc::new(connector)))
    }

    /// Creates an engine over any connector, e.g. a scripted one in tests.
    #[must_use]
    pub fn with_connector(config: &EngineConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            abort_grace: config.abort_grace,
        }
    }

    /// Creates a session without starting it.
    #[must_use]
    pub fn session(&self, request: TransferRequest) -> TransferSession {
        TransferSession::new(request, Arc::clone(&self.connector), self.abort_grace)
    }

    /// Starts `request` and returns its handle immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_transfer<N>(&self, request: TransferRequest, notifier: N) -> TransferHandle
    where
        N: Notifier + 'static,
    {
        self.session(request).start(notifier)
    }
}
