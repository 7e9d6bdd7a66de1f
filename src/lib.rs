//! Vigil - Linux inotify event-stream reader
//!
//! Decodes the raw byte stream of an inotify handle into typed [`Event`]s
//! and delivers them through a bounded queue: one background read loop as
//! the sole producer, any number of consumers calling blocking or
//! timeout-bounded retrieval. A full queue delays the next kernel read
//! instead of dropping events.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vigil::{EventMask, Reader, ReaderConfig};
//!
//! # fn main() -> vigil::Result<()> {
//! let reader = Arc::new(Reader::new(&ReaderConfig::default())?);
//! reader.add_watch("/tmp", EventMask::CREATE | EventMask::DELETE)?;
//!
//! // `listen` blocks for the lifetime of the reader; run it on its own thread.
//! let background = Arc::clone(&reader);
//! std::thread::spawn(move || background.listen());
//!
//! match reader.recv_timeout(Duration::from_secs(1)) {
//!     Ok(event) => println!("{event}"),
//!     Err(vigil::Error::Timeout) => println!("no changes"),
//!     Err(err) => return Err(err),
//! }
//! reader.stop();
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod event;
pub mod reader;
mod sys;

pub use config::ReaderConfig;
pub use error::{Error, Result, WatchError};
pub use event::{Event, EventMask, WatchDescriptor};
pub use reader::{Reader, ReaderState};
