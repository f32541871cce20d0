//! Error types for the transfer engine.
//!
//! Every failure a session can end in is a [`TransferError`]. Each variant
//! carries the context (URL, status, reason) needed for a user-facing message,
//! and [`TransferError::kind`] reduces it to the coarse [`ErrorKind`] that UI
//! code branches on.

use serde::Serialize;
use thiserror::Error;

/// Boxed source error carried by network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of how a transfer ended badly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The request was malformed and never sent.
    InvalidRequest,
    /// The connection could not be established or dropped mid-transfer.
    NetworkError,
    /// The server answered outside the 2xx range.
    HttpStatusError,
    /// Response metadata was unparsable or disagreed with the data received.
    MalformedResponse,
    /// The user cancelled. Reported as a Cancelled outcome, never as Failed.
    AbortedByUser,
}

impl ErrorKind {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NetworkError => "network_error",
            Self::HttpStatusError => "http_status_error",
            Self::MalformedResponse => "malformed_response",
            Self::AbortedByUser => "aborted_by_user",
        }
    }
}

/// Errors that terminate a transfer session.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The request failed validation before any network activity.
    #[error("invalid transfer request: {reason}")]
    InvalidRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// Network-level error (DNS, connection refused, TLS, dropped connection).
    #[error("network error transferring {url}: {source}")]
    Network {
        /// The URL being transferred.
        url: String,
        /// The underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The server responded outside the success range.
    #[error("HTTP {status} transferring {url}")]
    HttpStatus {
        /// The URL that returned the error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response metadata inconsistent with the data, or unparsable.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The URL whose response was malformed.
        url: String,
        /// What was inconsistent.
        reason: String,
    },
}

impl TransferError {
    /// Creates an invalid request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates a network error from any transport error.
    pub fn network(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a malformed response error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::HttpStatus { .. } => ErrorKind::HttpStatusError,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// Returns the HTTP status code for status errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
