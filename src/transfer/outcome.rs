//! Terminal outcomes of a transfer and upload receipts.

use bytes::Bytes;
use serde::Deserialize;

use super::error::{ErrorKind, TransferError};
use super::session::TransferStatus;

/// How a transfer ended.
#[derive(Debug)]
pub enum TransferOutcome {
    /// The transfer completed; the payload is the downloaded body, or the
    /// server's response body for uploads.
    Success {
        /// Complete payload.
        payload: Bytes,
        /// Resolved file name for the payload.
        final_name: String,
    },
    /// The user cancelled before completion. No payload is exposed.
    Cancelled,
    /// The transfer failed. No payload is exposed.
    Failed(TransferError),
}

impl TransferOutcome {
    /// Terminal status corresponding to this outcome.
    #[must_use]
    pub fn status(&self) -> TransferStatus {
        match self {
            Self::Success { .. } => TransferStatus::Completed,
            Self::Cancelled => TransferStatus::Cancelled,
            Self::Failed(_) => TransferStatus::Failed,
        }
    }

    /// Returns true for [`TransferOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Error kind for non-successful outcomes; cancellation reports
    /// [`ErrorKind::AbortedByUser`].
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Cancelled => Some(ErrorKind::AbortedByUser),
            Self::Failed(error) => Some(error.kind()),
        }
    }

    /// Payload of a successful transfer.
    #[must_use]
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Resolved file name of a successful transfer.
    #[must_use]
    pub fn final_name(&self) -> Option<&str> {
        match self {
            Self::Success { final_name, .. } => Some(final_name),
            _ => None,
        }
    }
}

/// Server acknowledgement of an upload (`{"uploaded": [...]}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReceipt {
    /// Entries the server reports as stored.
    #[serde(default)]
    pub uploaded: Vec<serde_json::Value>,
}

impl UploadReceipt {
    /// Decodes the response body of a successful upload.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::MalformedResponse`] if the body is not a JSON
    /// object of the expected shape.
    pub fn parse(url: &str, payload: &[u8]) -> Result<Self, TransferError> {
        serde_json::from_slice(payload).map_err(|e| {
            TransferError::malformed(url, format!("could not parse upload response: {e}"))
        })
    }

    /// Number of entries the server stored.
    #[must_use]
    pub fn count(&self) -> usize {
        self.uploaded.len()
    }
}
