//! Text wire format for the control channel.
//!
//! # Wire format
//!
//! ```text
//! HANDSHAKE (client -> server):  "<file_name>|<file_size>|<resume>\n"
//! OFFSET REPLY (server -> client, resume only): "<offset>\n"
//! PAYLOAD (client -> server): raw file bytes, no framing
//! ```
//!
//! Both control messages are newline-terminated ASCII lines, so a long
//! file name cannot truncate the handshake, and are length-capped
//! ([`HANDSHAKE_LIMIT`](crate::HANDSHAKE_LIMIT),
//! [`OFFSET_REPLY_LIMIT`](crate::OFFSET_REPLY_LIMIT)). The payload that
//! follows the handshake is an unframed byte stream; the receiver knows
//! it is done when the declared size is reached.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, TransferError};
use crate::{HANDSHAKE_LIMIT, OFFSET_REPLY_LIMIT};

/// Field separator in the handshake line.
pub const FIELD_SEPARATOR: char = '|';

/// The handshake declaring one file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Bare file name (no directory components).
    pub file_name: String,
    /// Declared total size in bytes, fixed for the session.
    pub file_size: u64,
    /// Whether the sender wants to continue a previous transfer.
    pub resume: bool,
}

impl Handshake {
    /// Encodes the handshake as a single newline-terminated line.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}\n",
            self.file_name,
            self.file_size,
            self.resume,
            sep = FIELD_SEPARATOR
        )
    }

    /// Parses a handshake line (without its terminator).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != 3 {
            return Err(ProtocolError::FieldCount { got: fields.len() });
        }

        validate_file_name(fields[0])?;
        let file_size = fields[1]
            .parse::<u64>()
            .map_err(|_| ProtocolError::InvalidSize(fields[1].to_string()))?;
        // Anything other than the literal "true" means a fresh transfer.
        let resume = fields[2] == "true";

        Ok(Self {
            file_name: fields[0].to_string(),
            file_size,
            resume,
        })
    }
}

/// Validates that a file name is a bare name safe to create under the
/// receiver's output directory.
pub fn validate_file_name(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty() {
        return Err(ProtocolError::InvalidFileName("empty file name".into()));
    }
    if name == "." || name == ".." {
        return Err(ProtocolError::InvalidFileName(format!(
            "reserved name: {name}"
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ProtocolError::InvalidFileName(format!(
            "path separators not allowed: {name}"
        )));
    }
    Ok(())
}

/// Writes the handshake line and flushes it ahead of the payload.
pub async fn write_handshake<W: AsyncWrite + Unpin>(
    writer: &mut W,
    handshake: &Handshake,
) -> Result<(), TransferError> {
    writer.write_all(handshake.encode().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads and parses the handshake line.
///
/// Payload bytes already buffered behind the line stay in `reader`.
pub async fn read_handshake<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<Handshake, TransferError> {
    let line = read_line_bounded(reader, HANDSHAKE_LIMIT).await?;
    Ok(Handshake::parse(&line)?)
}

/// Writes the resume-offset reply line.
pub async fn write_offset<W: AsyncWrite + Unpin>(
    writer: &mut W,
    offset: u64,
) -> Result<(), TransferError> {
    writer.write_all(format!("{offset}\n").as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the resume-offset reply line.
pub async fn read_offset<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<u64, TransferError> {
    let line = read_line_bounded(reader, OFFSET_REPLY_LIMIT).await?;
    line.parse::<u64>()
        .map_err(|_| TransferError::from(ProtocolError::InvalidOffset(line)))
}

/// Reads one newline-terminated line of at most `limit` bytes and strips
/// the terminator.
async fn read_line_bounded<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> Result<String, TransferError> {
    let mut line = String::new();
    let n = (&mut *reader)
        .take(limit as u64)
        .read_line(&mut line)
        .await?;

    if n == 0 {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    if !line.ends_with('\n') {
        // Either the line exceeds the cap or the peer closed mid-line.
        return Err(ProtocolError::MessageTooLong { limit }.into());
    }

    line.pop();
    Ok(line)
}
