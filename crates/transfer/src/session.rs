//! Per-connection transfer state.

/// Lifecycle of one transfer session.
///
/// `Completed` and `Aborted` are terminal; `Aborted` is reachable from
/// any non-terminal state on an I/O or parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The control line is being exchanged.
    Handshake,
    /// The resume offset has been agreed.
    OffsetExchange,
    /// Raw payload bytes are moving.
    Streaming,
    Completed,
    Aborted,
}

/// The negotiated state for one file transfer.
///
/// Exists once per connection, owned by whichever side created it, and
/// dropped when the connection closes or the transfer completes. The
/// offset is monotonically non-decreasing and never passes the declared
/// file size.
#[derive(Debug)]
pub struct TransferSession {
    file_name: String,
    file_size: u64,
    resume: bool,
    offset: u64,
    state: SessionState,
}

impl TransferSession {
    /// Creates a session in the handshake state with offset 0.
    pub fn new(file_name: impl Into<String>, file_size: u64, resume: bool) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            resume,
            offset: 0,
            state: SessionState::Handshake,
        }
    }

    /// Registry key and destination/source file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Total byte length declared at handshake time.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Whether the sender asked to continue a previous transfer.
    pub fn resume(&self) -> bool {
        self.resume
    }

    /// Current byte position already transferred.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes left until the declared size is reached.
    pub fn remaining(&self) -> u64 {
        self.file_size - self.offset
    }

    /// True once the offset has reached the declared size.
    pub fn is_complete(&self) -> bool {
        self.offset >= self.file_size
    }

    /// Sets the starting offset after the resume exchange.
    pub fn resume_from(&mut self, offset: u64) {
        debug_assert_eq!(self.state, SessionState::Handshake);
        debug_assert!(offset <= self.file_size);
        self.offset = offset;
        self.state = SessionState::OffsetExchange;
    }

    /// Enters the streaming state.
    pub fn begin_streaming(&mut self) {
        debug_assert!(matches!(
            self.state,
            SessionState::Handshake | SessionState::OffsetExchange
        ));
        self.state = SessionState::Streaming;
    }

    /// Advances the offset by `n` transferred bytes, clamped to the
    /// declared size.
    pub fn advance(&mut self, n: u64) {
        debug_assert_eq!(self.state, SessionState::Streaming);
        self.offset = self.offset.saturating_add(n).min(self.file_size);
    }

    /// Marks the session completed.
    pub fn complete(&mut self) {
        debug_assert!(self.is_complete());
        self.state = SessionState::Completed;
    }

    /// Marks the session aborted.
    pub fn abort(&mut self) {
        if !matches!(self.state, SessionState::Completed) {
            self.state = SessionState::Aborted;
        }
    }

    /// Point-in-time progress report.
    pub fn progress(&self) -> Progress {
        Progress {
            bytes: self.offset,
            total: self.file_size,
        }
    }
}

/// A point-in-time progress report, emitted after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes transferred so far, counted from the start of the file
    /// (a resumed session starts at the resume offset).
    pub bytes: u64,
    /// Declared total size.
    pub total: u64,
}

impl Progress {
    /// Completed fraction in `[0, 1]`; an empty file counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.bytes as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_at_handshake() {
        let session = TransferSession::new("a.bin", 40, false);
        assert_eq!(session.state(), SessionState::Handshake);
        assert_eq!(session.offset(), 0);
        assert_eq!(session.remaining(), 40);
        assert!(!session.is_complete());
    }

    #[test]
    fn resume_sets_offset() {
        let mut session = TransferSession::new("a.bin", 40, true);
        session.resume_from(24);
        assert_eq!(session.state(), SessionState::OffsetExchange);
        assert_eq!(session.offset(), 24);
        assert_eq!(session.remaining(), 16);
    }

    #[test]
    fn advance_is_clamped_to_file_size() {
        let mut session = TransferSession::new("a.bin", 40, false);
        session.begin_streaming();
        session.advance(64);
        assert_eq!(session.offset(), 40);
        assert!(session.is_complete());
    }

    #[test]
    fn full_lifecycle() {
        let mut session = TransferSession::new("a.bin", 40, false);
        session.begin_streaming();
        session.advance(24);
        assert_eq!(session.progress(), Progress { bytes: 24, total: 40 });
        session.advance(16);
        assert!(session.is_complete());
        session.complete();
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn abort_from_streaming() {
        let mut session = TransferSession::new("a.bin", 40, false);
        session.begin_streaming();
        session.advance(8);
        session.abort();
        assert_eq!(session.state(), SessionState::Aborted);
    }

    #[test]
    fn abort_does_not_override_completed() {
        let mut session = TransferSession::new("a.bin", 0, false);
        session.begin_streaming();
        session.complete();
        session.abort();
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn empty_file_is_immediately_complete() {
        let session = TransferSession::new("empty.bin", 0, false);
        assert!(session.is_complete());
        assert_eq!(session.progress().fraction(), 1.0);
    }

    #[test]
    fn fraction_midway() {
        let progress = Progress { bytes: 20, total: 40 };
        assert_eq!(progress.fraction(), 0.5);
    }
}
