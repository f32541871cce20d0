//! Network transports behind a single event-pulling interface.
//!
//! A session never talks to the network directly. It asks a [`Connector`] for
//! a [`TransportAdapter`] matching the request's direction and then pulls
//! [`TransportEvent`]s until the adapter finishes or fails:
//!
//! - [`DownloadAdapter`] streams a `GET` response body chunk by chunk.
//! - [`UploadAdapter`] posts a multipart body and reports bytes handed to the
//!   connection.

mod client;
mod download;
mod multipart;
mod upload;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use url::Url;

use super::config::{EngineConfig, EngineError};
use super::error::TransferError;
use super::request::{Direction, TransferRequest};

pub use download::DownloadAdapter;
pub use multipart::MultipartBody;
pub use upload::UploadAdapter;

/// One step reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The exchange is established. Emitted once, before any data or credit.
    Opened {
        /// Declared payload size, if the transport knows it.
        total_bytes: Option<u64>,
        /// Server-declared file name, if any.
        file_name: Option<String>,
    },
    /// A received body chunk (downloads).
    Data(Bytes),
    /// Cumulative bytes handed to the connection (uploads).
    Sent {
        /// Total bytes sent so far.
        cumulative: u64,
    },
    /// The exchange completed successfully.
    Finished {
        /// Response body for uploads; empty for downloads, whose body arrived
        /// as [`TransportEvent::Data`].
        response: Bytes,
    },
}

/// A live network exchange for one transfer.
#[async_trait]
pub trait TransportAdapter: Send {
    /// Waits for the next event.
    ///
    /// After [`TransportEvent::Finished`] or an error the adapter is spent.
    ///
    /// # Errors
    ///
    /// Returns the [`TransferError`] that ended the exchange.
    async fn next_event(&mut self) -> Result<TransportEvent, TransferError>;

    /// Closes the underlying connection. No further data is read afterwards.
    async fn abort(&mut self);
}

/// Creates the adapter for a validated request.
pub trait Connector: Send + Sync {
    /// Opens a transport for `request` against `url`. No I/O happens until the
    /// adapter is first polled.
    fn open(&self, request: &TransferRequest, url: Url) -> Box<dyn TransportAdapter>;
}

/// HTTP connector backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: Client,
    upload_field_name: Arc<str>,
    upload_chunk_size: usize,
}

impl HttpConnector {
    /// Builds the connector and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the config is invalid or the client cannot be
    /// built.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let client = client::build_client(config).map_err(EngineError::Client)?;
        Ok(Self {
            client,
            upload_field_name: Arc::from(config.upload_field_name.trim()),
            upload_chunk_size: config.upload_chunk_size,
        })
    }
}

impl Connector for HttpConnector {
    fn open(&self, request: &TransferRequest, url: Url) -> Box<dyn TransportAdapter> {
        let auth = request.auth_token().cloned();
        match request.direction() {
            Direction::Download => Box::new(DownloadAdapter::new(self.client.clone(), url, auth)),
            Direction::Upload => {
                let body = MultipartBody::encode(&self.upload_field_name, request.payload_source());
                Box::new(UploadAdapter::new(
                    self.client.clone(),
                    url,
                    auth,
                    body,
                    self.upload_chunk_size,
                ))
            }
        }
    }
}
