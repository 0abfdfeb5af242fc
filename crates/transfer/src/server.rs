//! Receiving side: accept loop, handshake parsing, resume reply,
//! receive loop.

use std::io::SeekFrom;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::RECV_BUFFER_SIZE;
use crate::error::TransferError;
use crate::registry::ResumeRegistry;
use crate::session::TransferSession;
use crate::wire;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory receiving transferred files.
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            output_dir: PathBuf::from("."),
        }
    }
}

/// The receiving peer.
///
/// Accepts arbitrarily many connections, one independent task per
/// connection, so the accept loop never waits on a handler. Per-process
/// concurrency is unbounded by design. Handlers share one
/// [`ResumeRegistry`]; sessions for distinct file names are fully
/// independent.
pub struct TransferServer {
    config: ServerConfig,
    registry: Arc<ResumeRegistry>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl TransferServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry: Arc::new(ResumeRegistry::new()),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// The shared resume registry.
    pub fn registry(&self) -> &ResumeRegistry {
        &self.registry
    }

    /// Returns the bound address, once [`run`](Self::run) has bound it.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully stops the accept loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds the listener and serves until [`shutdown`](Self::shutdown).
    ///
    /// A bind failure is returned to the caller; an `accept` error is
    /// logged and the loop continues.
    pub async fn run(self: &Arc<Self>) -> Result<(), TransferError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!("transfer server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                match server.handle_connection(stream, peer_addr).await {
                                    Ok(received) => {
                                        debug!(%peer_addr, received, "connection finished");
                                    }
                                    Err(e) => {
                                        error!(%peer_addr, "connection error: {e}");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Handles one connection: handshake, optional offset reply, payload.
    ///
    /// Returns the payload bytes received by this call. The destination
    /// file and the socket are scoped to this call and released on every
    /// exit path.
    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<u64, TransferError> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        // A malformed handshake closes the connection before any file is
        // created or the registry consulted.
        let handshake = wire::read_handshake(&mut reader).await?;
        info!(
            %peer_addr,
            file = %handshake.file_name,
            size = handshake.file_size,
            resume = handshake.resume,
            "handshake received"
        );

        let mut session =
            TransferSession::new(handshake.file_name, handshake.file_size, handshake.resume);

        if session.resume() {
            // The declared size may be smaller than the recorded offset
            // when the file was rebuilt; never reply past the declared
            // size.
            let offset = self
                .registry
                .offset_for(session.file_name())
                .min(session.file_size());
            session.resume_from(offset);
            wire::write_offset(&mut writer, offset).await?;
            debug!(file = %session.file_name(), offset, "resume offset sent");
        }

        // Create without truncating: a resumed file keeps its bytes.
        let dest = self.config.output_dir.join(session.file_name());
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&dest)
            .await?;

        session.begin_streaming();
        match self.receive_payload(&mut reader, &mut file, &mut session).await {
            Ok(received) => {
                session.complete();
                info!(
                    file = %session.file_name(),
                    received,
                    total = session.file_size(),
                    "file received"
                );
                Ok(received)
            }
            Err(e) => {
                session.abort();
                Err(e)
            }
        }
    }

    /// Receives payload bytes until the session reaches its declared size.
    async fn receive_payload<R: AsyncRead + Unpin>(
        &self,
        reader: &mut R,
        file: &mut tokio::fs::File,
        session: &mut TransferSession,
    ) -> Result<u64, TransferError> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut received: u64 = 0;

        while !session.is_complete() {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                // Completion means reaching the declared size, never
                // stream closure.
                return Err(TransferError::ConnectionClosed {
                    offset: session.offset(),
                    expected: session.file_size(),
                });
            }

            // Never write past the declared size; surplus bytes are
            // dropped.
            let take = session.remaining().min(n as u64) as usize;
            file.seek(SeekFrom::Start(session.offset())).await?;
            file.write_all(&buf[..take]).await?;

            session.advance(take as u64);
            received += take as u64;
            self.registry.record(session.file_name(), session.offset());
            debug!(
                file = %session.file_name(),
                offset = session.offset(),
                total = session.file_size(),
                "progress"
            );
        }

        Ok(received)
    }
}
