//! Configuration for the reader.
//!
//! The reader takes its tuning knobs explicitly at construction; nothing is
//! probed at module load time. In particular the host's maximum filename
//! length is either injected through [`ReaderConfig::max_name_len`] or
//! resolved once inside `Reader::new`.

mod settings;

pub use settings::{ReaderConfig, DEFAULT_CAPACITY, DEFAULT_FLAGS, FALLBACK_NAME_MAX};
