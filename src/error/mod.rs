//! Error types and Result aliases for vigil.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use std::io;

use thiserror::Error;

/// Result type alias using vigil's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for reader operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The inotify handle could not be created. Fatal at construction; no
    /// reader exists afterwards.
    #[error("failed to initialize inotify: {0}")]
    Init(#[source] io::Error),

    /// Watch registration or removal failed at the kernel. The reader
    /// remains otherwise usable.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    /// The blocking event read failed while the reader was still running.
    /// Fatal to the read loop; the event queue is closed on the way out.
    #[error("event read failed: {0}")]
    Read(#[source] io::Error),

    /// The kernel returned a partial event record. Buffer sizing guarantees
    /// this cannot happen for well-formed input; it is surfaced as a fatal
    /// internal fault rather than swallowed.
    #[error("truncated event record at buffer offset {offset} ({available} bytes available)")]
    Truncated {
        /// Byte offset of the record that could not be decoded.
        offset: usize,
        /// Valid bytes remaining from that offset.
        available: usize,
    },

    /// The reader has been stopped. Surfaced from retrieval once the queue
    /// is closed and drained, and from any operation invoked after `stop`.
    #[error("reader is stopped")]
    Stopped,

    /// No event arrived within the bound given to `recv_timeout`.
    #[error("timed out waiting for an event")]
    Timeout,

    /// `listen` was invoked while a read loop is already active.
    #[error("reader is already listening")]
    AlreadyListening,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Watch registration errors.
#[derive(Error, Debug)]
pub enum WatchError {
    /// `inotify_add_watch` failed for a path.
    #[error("failed to watch '{path}': {source}")]
    Add {
        /// The path that could not be watched.
        path: String,
        /// The kernel's error.
        source: io::Error,
    },

    /// `inotify_rm_watch` failed for a descriptor.
    #[error("failed to remove watch {wd}: {source}")]
    Remove {
        /// The raw descriptor the kernel rejected.
        wd: i32,
        /// The kernel's error.
        source: io::Error,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
