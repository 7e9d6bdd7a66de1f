//! Configuration settings and validation.

use crate::{Error, Result};

/// Default worst-case number of empty-name records per kernel read, and the
/// default bound of the delivery queue.
pub const DEFAULT_CAPACITY: usize = 128;

/// Default flags passed to `inotify_init1(2)`.
pub const DEFAULT_FLAGS: i32 = 0;

/// Maximum filename length assumed when the host cannot report one.
pub const FALLBACK_NAME_MAX: usize = 255;

/// Configuration for a `Reader`.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Capacity of the reader, in events.
    ///
    /// This is not a hard limit on events per read, because records carry
    /// variable-length names. It sets the read buffer to hold either
    /// `capacity` empty-name records or one record with a maximum-length
    /// name, and bounds the delivery queue to `capacity` decoded events.
    pub capacity: usize,

    /// Flags for `inotify_init1(2)`, e.g. `libc::IN_CLOEXEC`.
    ///
    /// The read loop relies on the handle blocking; passing
    /// `libc::IN_NONBLOCK` turns every idle read into a fatal read error.
    pub init_flags: i32,

    /// Maximum filename length to size the read buffer for.
    ///
    /// `None` asks the host via `pathconf(_PC_NAME_MAX)` during reader
    /// construction, falling back to [`FALLBACK_NAME_MAX`] if the host
    /// cannot say. Set explicitly in tests to avoid the probe.
    pub max_name_len: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            init_flags: DEFAULT_FLAGS,
            max_name_len: None,
        }
    }
}

impl ReaderConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with the given capacity and default flags.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::config("capacity cannot be 0"));
        }

        if self.capacity > 65_536 {
            return Err(Error::config("capacity cannot exceed 65536"));
        }

        if self.max_name_len == Some(0) {
            return Err(Error::config("max_name_len cannot be 0"));
        }

        Ok(())
    }
}
