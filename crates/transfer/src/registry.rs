//! In-memory record of confirmed receive offsets, keyed by file name.

use std::collections::HashMap;
use std::sync::Mutex;

/// Tracks the last confirmed byte offset per file name.
///
/// Lives for the server process: created empty at startup and never
/// persisted, so a restarted server resumes every file at offset 0.
/// All handlers share one registry; updates to a single key are
/// serialized by the lock, and an offset only ever moves forward.
#[derive(Debug, Default)]
pub struct ResumeRegistry {
    offsets: Mutex<HashMap<String, u64>>,
}

impl ResumeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last confirmed offset for `file_name` (0 if unknown).
    pub fn offset_for(&self, file_name: &str) -> u64 {
        let offsets = self.offsets.lock().unwrap();
        offsets.get(file_name).copied().unwrap_or(0)
    }

    /// Records bytes confirmed written to stable storage.
    ///
    /// A value below the recorded offset is ignored; entries never move
    /// backwards.
    pub fn record(&self, file_name: &str, offset: u64) {
        let mut offsets = self.offsets.lock().unwrap();
        let entry = offsets.entry(file_name.to_string()).or_insert(0);
        if offset > *entry {
            *entry = offset;
        }
    }
}
