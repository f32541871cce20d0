//! Media Transfer Library
//!
//! This library moves media files between a client and a media library
//! backend over HTTP, with live progress and cooperative cancellation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transfer`] - Transfer engine: sessions, transports, progress, cancellation
//! - [`display`] - Human-readable byte sizes and file names for progress output

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod display;
pub mod transfer;
mod user_agent;

// Re-export commonly used types
pub use display::{format_file_name, format_file_size};
pub use transfer::{
    CancellationToken, Direction, EngineConfig, EngineError, ErrorKind, NamedBlob, Notifier,
    ProgressSnapshot, TransferEngine, TransferError, TransferHandle, TransferOutcome,
    TransferRequest, TransferStatus,
};
