//! Resumable, chunked file transfer over a persistent TCP connection.
//!
//! A sending peer opens a connection, declares the file name, size and
//! resume intent in a one-line handshake, optionally receives the offset
//! at which to restart, then streams raw file bytes until end of file.
//! The receiving peer writes the bytes at their offsets and records
//! per-file progress in a process-wide [`ResumeRegistry`], so a transfer
//! that was cut short can be re-initiated and continue instead of
//! starting over.
//!
//! The registry is memory-resident and scoped to one server process:
//! after a restart every file resumes at offset 0.
//!
//! # Wire format
//!
//! See the [`wire`] module.

pub mod client;
pub mod error;
pub mod policy;
pub mod registry;
pub mod server;
pub mod session;
pub mod wire;

pub use client::TransferClient;
pub use error::{ProtocolError, TransferError};
pub use policy::chunk_size_for;
pub use registry::ResumeRegistry;
pub use server::{ServerConfig, TransferServer};
pub use session::{Progress, SessionState, TransferSession};
pub use wire::Handshake;

/// Receive buffer size: a fixed 1 MiB regardless of the sender's chunk
/// size. The payload carries no chunk boundaries on the wire, so the two
/// sides never need to agree on a buffer size.
pub const RECV_BUFFER_SIZE: usize = 1024 * 1024;

/// Maximum accepted handshake line length, terminator included.
pub const HANDSHAKE_LIMIT: usize = 4096;

/// Maximum accepted resume-offset reply length, terminator included.
pub const OFFSET_REPLY_LIMIT: usize = 64;
