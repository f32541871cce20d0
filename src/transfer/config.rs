//! Engine configuration.

use std::time::Duration;

use thiserror::Error;

/// Default HTTP connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time a cancelled session waits for the transport to close.
pub const DEFAULT_ABORT_GRACE: Duration = Duration::from_secs(2);

/// Default slice size for upload progress (64 KiB).
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Largest accepted upload slice size (16 MiB).
pub const MAX_UPLOAD_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Default multipart field name for uploaded files.
pub const DEFAULT_UPLOAD_FIELD: &str = "files";

/// Errors raised while building a [`TransferEngine`](super::TransferEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configuration value is out of range.
    #[error("invalid engine config `{field}`: {reason}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Tunables for the transfer engine.
///
/// No overall request timeout is applied. A caller wanting a deadline
/// cancels the handle from its own timer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// How long a cancelled session waits for the transport to acknowledge.
    pub abort_grace: Duration,
    /// Slice size in which upload bodies are handed to the connection.
    pub upload_chunk_size: usize,
    /// Multipart field name for uploaded blobs.
    pub upload_field_name: String,
    /// User-Agent override; the crate default is used when `None`.
    pub user_agent: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            abort_grace: DEFAULT_ABORT_GRACE,
            upload_chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
            upload_field_name: DEFAULT_UPLOAD_FIELD.to_string(),
            user_agent: None,
        }
    }
}

impl EngineConfig {
    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.connect_timeout.is_zero() {
            return Err(EngineError::InvalidConfig {
                field: "connect_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(1..=MAX_UPLOAD_CHUNK_SIZE).contains(&self.upload_chunk_size) {
            return Err(EngineError::InvalidConfig {
                field: "upload_chunk_size",
                reason: format!(
                    "{} is outside 1..={MAX_UPLOAD_CHUNK_SIZE}",
                    self.upload_chunk_size
                ),
            });
        }
        let field = self.upload_field_name.trim();
        if field.is_empty() || field.contains('"') || field.contains(['\r', '\n']) {
            return Err(EngineError::InvalidConfig {
                field: "upload_field_name",
                reason: format!("'{}' is not a usable form field name", self.upload_field_name),
            });
        }
        Ok(())
    }
}
