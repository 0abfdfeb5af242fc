//! Sender-side chunk sizing.

/// Smallest chunk, used for files under 100 MiB.
pub const MIN_CHUNK_SIZE: usize = 32 * 1024;

/// Largest chunk, used for files of 1 GiB and above.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Maps a file's total size to the sender's per-read chunk size.
///
/// Pure function of the size. Only the sender consults it; the receiver
/// always reads with a fixed
/// [`RECV_BUFFER_SIZE`](crate::RECV_BUFFER_SIZE) buffer because the
/// stream has no chunk boundaries on the wire.
pub fn chunk_size_for(file_size: u64) -> usize {
    match file_size {
        s if s < 100 * MIB => MIN_CHUNK_SIZE,
        s if s < 500 * MIB => 128 * 1024,
        s if s < 1024 * MIB => 512 * 1024,
        _ => MAX_CHUNK_SIZE,
    }
}
