//! Sending side: connect, handshake, optional resume exchange, stream.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::TransferError;
use crate::policy::chunk_size_for;
use crate::session::{Progress, TransferSession};
use crate::wire::{self, Handshake};

/// The sending peer for a single file transfer.
///
/// One call performs one blocking, sequential transfer: chunks are read
/// and written in strict offset order, with no parallel dispatch within
/// a session. Connect failures are fatal to the call and never retried.
pub struct TransferClient {
    host: String,
    port: u16,
}

impl TransferClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Transfers the file at `path` to the server.
    ///
    /// With `resume`, the server's recorded offset for the file name
    /// decides where streaming starts; the server replies 0 for a name
    /// it has never seen. A progress report is sent on `progress_tx`
    /// after every chunk (non-blocking: a full channel drops the report,
    /// never the transfer).
    ///
    /// Returns the number of payload bytes sent by this call.
    pub async fn send_file(
        &self,
        path: &Path,
        resume: bool,
        progress_tx: mpsc::Sender<Progress>,
    ) -> Result<u64, TransferError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| TransferError::NotAFile(path.to_path_buf()))?;

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(TransferError::NotAFile(path.to_path_buf()));
        }
        let file_size = metadata.len();

        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        info!(
            host = %self.host,
            port = self.port,
            file = %file_name,
            size = file_size,
            "connected"
        );

        let chunk_size = chunk_size_for(file_size);
        let (reader, writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut writer = BufWriter::with_capacity(chunk_size, writer);

        let mut session = TransferSession::new(file_name.as_str(), file_size, resume);
        let handshake = Handshake {
            file_name,
            file_size,
            resume,
        };
        wire::write_handshake(&mut writer, &handshake).await?;

        if resume {
            let offset = wire::read_offset(&mut reader).await?;
            if offset > file_size {
                return Err(TransferError::OffsetBeyondFile { offset, file_size });
            }
            session.resume_from(offset);
            debug!(file = %session.file_name(), offset, "server resume offset");
        }

        let mut file = File::open(path).await?;
        file.seek(SeekFrom::Start(session.offset())).await?;
        session.begin_streaming();

        let mut buf = vec![0u8; chunk_size];
        let mut sent: u64 = 0;
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).await?;
            session.advance(n as u64);
            sent += n as u64;
            let _ = progress_tx.try_send(session.progress());
        }
        writer.flush().await?;

        session.complete();
        info!(file = %session.file_name(), sent, "transfer complete");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    /// Accepts one connection, optionally replies with a resume offset,
    /// and returns the handshake line plus all payload bytes.
    async fn mock_server(listener: TcpListener, offset_reply: Option<u64>) -> (String, Vec<u8>) {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();

        if let Some(offset) = offset_reply {
            wire::write_offset(&mut writer, offset).await.unwrap();
        }

        let mut payload = Vec::new();
        reader.read_to_end(&mut payload).await.unwrap();
        (line, payload)
    }

    async fn bound_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn fresh_transfer_sends_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let (listener, port) = bound_listener().await;
        let server = tokio::spawn(mock_server(listener, None));

        let (tx, _rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", port);
        let sent = client.send_file(&path, false, tx).await.unwrap();
        assert_eq!(sent, 10);

        let (line, payload) = server.await.unwrap();
        assert_eq!(line, "data.bin|10|false\n");
        assert_eq!(payload, b"0123456789");
    }

    #[tokio::test]
    async fn resumed_transfer_sends_tail_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let (listener, port) = bound_listener().await;
        let server = tokio::spawn(mock_server(listener, Some(6)));

        let (tx, _rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", port);
        let sent = client.send_file(&path, true, tx).await.unwrap();
        assert_eq!(sent, 4);

        let (line, payload) = server.await.unwrap();
        assert_eq!(line, "data.bin|10|true\n");
        assert_eq!(payload, b"6789");
    }

    #[tokio::test]
    async fn offset_beyond_file_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let (listener, port) = bound_listener().await;
        let server = tokio::spawn(mock_server(listener, Some(99)));

        let (tx, _rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", port);
        let err = client.send_file(&path, true, tx).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::OffsetBeyondFile {
                offset: 99,
                file_size: 10
            }
        ));
        drop(server);
    }

    #[tokio::test]
    async fn empty_file_sends_no_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let (listener, port) = bound_listener().await;
        let server = tokio::spawn(mock_server(listener, None));

        let (tx, _rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", port);
        let sent = client.send_file(&path, false, tx).await.unwrap();
        assert_eq!(sent, 0);

        let (line, payload) = server.await.unwrap();
        assert_eq!(line, "empty.bin|0|false\n");
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.bin");

        let (tx, _rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", 1);
        let err = client.send_file(&path, false, tx).await.unwrap_err();
        assert!(matches!(err, TransferError::Io(_)));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();

        let (tx, _rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", 1);
        let err = client.send_file(dir.path(), false, tx).await.unwrap_err();
        assert!(matches!(err, TransferError::NotAFile(_)));
    }

    #[tokio::test]
    async fn progress_reported_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let (listener, port) = bound_listener().await;
        let server = tokio::spawn(mock_server(listener, None));

        let (tx, mut rx) = mpsc::channel(64);
        let client = TransferClient::new("127.0.0.1", port);
        client.send_file(&path, false, tx).await.unwrap();
        server.await.unwrap();

        // A 10-byte file fits one chunk: a single report at completion.
        let mut events = Vec::new();
        while let Ok(p) = rx.try_recv() {
            events.push(p);
        }
        assert_eq!(events, vec![Progress { bytes: 10, total: 10 }]);
    }
}
