//! Multiplexer error type

use std::io;

/// Failures reported by [`EventMux`](super::EventMux) operations.
///
/// None of these are fatal to the multiplexer: the registry is unchanged
/// after any of them and the caller decides whether to keep looping.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// All misc slots are in use; the descriptor was not registered.
    #[error("misc descriptor capacity ({0}) exhausted")]
    MiscCapacity(usize),

    /// `wait` returned without any descriptor becoming ready.
    #[error("no descriptor became ready")]
    Timeout,

    /// poll(2) itself failed (EINTR included).
    #[error("poll failed: {0}")]
    Poll(#[source] io::Error),

    /// `read_event` was called without the readable condition set.
    #[error("descriptor not readable")]
    NotReadable,

    /// The descriptor yielded less than one whole event record.
    #[error("short read: got {got} of {expected} bytes")]
    ShortRead { got: usize, expected: usize },

    /// The descriptor id was issued before the last teardown.
    #[error("descriptor id refers to a closed registry")]
    StaleDescriptor,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
