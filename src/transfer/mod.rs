//! Cancellable, progress-reporting transfers to and from the media backend.
//!
//! A [`TransferEngine`] turns each [`TransferRequest`] into a session running
//! on its own task. The session pulls events from a transport, accumulates
//! payload bytes in a [`ByteSink`], counts them in a [`ProgressTracker`] and
//! pushes [`ProgressSnapshot`]s to a [`Notifier`]. The caller keeps a
//! [`TransferHandle`] to cancel the session or await its [`TransferOutcome`].
//!
//! # Features
//!
//! - Streaming `GET` downloads with declared-length checks
//! - Multipart `POST` uploads with send-side progress
//! - Cooperative cancellation that silences progress once `cancel` returns
//! - Server-declared file names via `Content-Disposition`
//!
//! # Example
//!
//! ```no_run
//! use media_transfer::transfer::{
//!     EngineConfig, NamedBlob, ProgressSnapshot, TransferEngine, TransferRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = TransferEngine::new(EngineConfig::default())?;
//! let request = TransferRequest::upload(
//!     "https://media.example/api/upload",
//!     vec![NamedBlob::new("clip.mp4", std::fs::read("clip.mp4")?)],
//! )
//! .with_destination_path("holiday");
//!
//! let handle = engine.start_transfer(request, |p: &ProgressSnapshot| {
//!     println!("{:?}%", p.percent);
//! });
//! let outcome = handle.result().await;
//! println!("{}", outcome.status().as_str());
//! # Ok(())
//! # }
//! ```

mod cancel;
mod config;
mod engine;
mod error;
pub mod filename;
mod notifier;
mod outcome;
mod progress;
mod request;
mod session;
mod sink;
pub mod transport;

pub use cancel::CancellationToken;
pub use config::{
    DEFAULT_ABORT_GRACE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_UPLOAD_CHUNK_SIZE, DEFAULT_UPLOAD_FIELD,
    EngineConfig, EngineError, MAX_UPLOAD_CHUNK_SIZE,
};
pub use engine::TransferEngine;
pub use error::{BoxError, ErrorKind, TransferError};
pub use notifier::{Notifier, NullNotifier, WatchNotifier};
pub use outcome::{TransferOutcome, UploadReceipt};
pub use progress::{ProgressSnapshot, ProgressTracker, percent_of};
pub use request::{AuthToken, Direction, NamedBlob, TransferRequest};
pub use session::{TransferHandle, TransferSession, TransferState, TransferStatus};
pub use sink::ByteSink;
pub use transport::{Connector, HttpConnector, TransportAdapter, TransportEvent};
