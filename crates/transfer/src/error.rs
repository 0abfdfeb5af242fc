//! Error types for the transfer crate.

use std::path::PathBuf;

/// Errors produced while parsing control messages.
///
/// Malformed input aborts the session; numeric fields are never silently
/// defaulted.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("handshake has {got} fields, expected 3")]
    FieldCount { got: usize },

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("invalid file size: {0:?}")]
    InvalidSize(String),

    #[error("invalid resume offset: {0:?}")]
    InvalidOffset(String),

    #[error("control message exceeds {limit} bytes")]
    MessageTooLong { limit: usize },
}

/// Errors produced by a transfer attempt.
///
/// Every variant is fatal to the current attempt; nothing is retried.
/// Resuming is an offset optimization for a manually re-initiated
/// transfer, not automatic recovery.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection closed at offset {offset}, expected {expected} bytes")]
    ConnectionClosed { offset: u64, expected: u64 },

    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("resume offset {offset} is beyond the file size {file_size}")]
    OffsetBeyondFile { offset: u64, file_size: u64 },
}
