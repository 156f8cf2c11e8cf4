//! Error types for mapbuf.

use thiserror::Error;

/// Result type alias using mapbuf's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mapbuf operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The memory provider could not satisfy a page request
    /// (exhausted huge pages, exhausted translation entries, ...).
    #[error("page allocation failed: {0}")]
    AllocationFailed(String),

    /// The transfer engine reported a hardware fault or timeout.
    /// The buffer's residency is left at its pre-call value.
    #[error("host/device transfer failed: {0}")]
    TransferFailed(String),

    /// `slice` was called with an out-of-order or out-of-bounds range.
    /// Detected before any allocation is attempted.
    #[error("invalid slice range {start}..{end} for buffer of {len} elements")]
    InvalidRange {
        /// First element of the requested range.
        start: usize,
        /// One past the last element of the requested range.
        end: usize,
        /// Element count of the source buffer.
        len: usize,
    },

    /// System call error (via rustix).
    #[error("system error: {0}")]
    System(#[from] rustix::io::Errno),
}
