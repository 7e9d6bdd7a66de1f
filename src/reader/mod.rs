//! The event-stream reader: watch registry, lifecycle, read loop, and
//! queue plumbing.

mod decode;

use std::collections::HashSet;
use std::os::unix::io::RawFd;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::config::{ReaderConfig, FALLBACK_NAME_MAX};
use crate::error::{Error, Result, WatchError};
use crate::event::{Event, EventMask, WatchDescriptor};
use crate::sys;

use decode::{decode_events, read_buffer_len};

/// Lifecycle state of a [`Reader`].
///
/// Transitions are one-way: `Created -> Listening -> Stopped`, with
/// `Created -> Stopped` allowed for a reader that never listened. A stopped
/// reader cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Constructed; the read loop has not started.
    Created,
    /// The read loop is running.
    Listening,
    /// Terminal. The handle is closed and the queue is closed.
    Stopped,
}

const CREATED: u8 = 0;
const LISTENING: u8 = 1;
const STOPPED: u8 = 2;

fn state_from(raw: u8) -> ReaderState {
    match raw {
        CREATED => ReaderState::Created,
        LISTENING => ReaderState::Listening,
        _ => ReaderState::Stopped,
    }
}

/// Inotify event-stream reader.
///
/// One background thread runs [`listen`](Reader::listen) as the sole
/// producer; any number of threads may register watches, retrieve events
/// and stop the reader through a shared reference.
pub struct Reader {
    fd: RawFd,
    capacity: usize,
    max_name_len: usize,
    state: AtomicU8,
    watches: Mutex<HashSet<WatchDescriptor>>,
    /// Sole producer handle for the queue. `listen` takes it; whichever of
    /// `listen`/`stop` runs drops it, closing the queue for consumers.
    producer: Mutex<Option<Sender<Event>>>,
    events: Receiver<Event>,
}

impl Reader {
    /// Create a reader by acquiring an inotify handle.
    ///
    /// The maximum filename length used for buffer sizing is taken from
    /// `config.max_name_len`, or probed from the host once here. A failed
    /// probe falls back to [`FALLBACK_NAME_MAX`] with a warning instead of
    /// failing construction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid configuration and
    /// [`Error::Init`] if the kernel refuses a new inotify instance.
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        config.validate()?;

        let max_name_len = config.max_name_len.unwrap_or_else(|| {
            sys::name_max(Path::new(".")).unwrap_or_else(|err| {
                tracing::warn!(
                    error = %err,
                    fallback = FALLBACK_NAME_MAX,
                    "host did not report NAME_MAX, using fallback"
                );
                FALLBACK_NAME_MAX
            })
        });

        let fd = sys::init(config.init_flags).map_err(Error::Init)?;
        let (producer, events) = bounded(config.capacity);

        tracing::debug!(fd, capacity = config.capacity, max_name_len, "reader created");

        Ok(Self {
            fd,
            capacity: config.capacity,
            max_name_len,
            state: AtomicU8::new(CREATED),
            watches: Mutex::new(HashSet::new()),
            producer: Mutex::new(Some(producer)),
            events,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        state_from(self.state.load(Ordering::Acquire))
    }

    /// Number of watches currently registered and not yet removed.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.lock().len()
    }

    /// Register a watch for `path`.
    ///
    /// Returns the kernel's descriptor for the (path, mask) pair. Store it
    /// only if you intend to remove the watch yourself; `stop` removes all
    /// outstanding watches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] after `stop`, or [`Error::Watch`] if the
    /// kernel rejects the registration.
    pub fn add_watch(&self, path: impl AsRef<Path>, mask: EventMask) -> Result<WatchDescriptor> {
        if self.state() == ReaderState::Stopped {
            return Err(Error::Stopped);
        }

        let path = path.as_ref();
        let wd = sys::add_watch(self.fd, path, mask.bits()).map_err(|source| WatchError::Add {
            path: path.display().to_string(),
            source,
        })?;
        let wd = WatchDescriptor(wd);

        self.watches.lock().insert(wd);
        tracing::info!(path = %path.display(), wd = %wd, "watch added");
        Ok(wd)
    }

    /// Remove a watch.
    ///
    /// Removal is attempted against the kernel whether or not `wd` is still
    /// in the registry; the kernel's own idempotency contract decides the
    /// outcome, and its error is surfaced as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] after `stop`, or [`Error::Watch`] if the
    /// kernel rejects the removal.
    pub fn rm_watch(&self, wd: WatchDescriptor) -> Result<()> {
        if self.state() == ReaderState::Stopped {
            return Err(Error::Stopped);
        }

        self.watches.lock().remove(&wd);
        sys::rm_watch(self.fd, wd.0).map_err(|source| WatchError::Remove { wd: wd.0, source })?;

        tracing::info!(wd = %wd, "watch removed");
        Ok(())
    }

    /// Run the read loop until `stop` or a fatal read error.
    ///
    /// Blocks for the lifetime of the reader; call it from a dedicated
    /// thread, concurrently with consumption. Each blocking kernel read
    /// fills the sizing-guaranteed buffer with whole records, which are
    /// decoded and published to the queue in order. A full queue blocks
    /// publishing, which delays the next read: backpressure, not loss.
    /// Watches the kernel reports as IGNORED are pruned from the registry
    /// before their event is delivered.
    ///
    /// Returns `Ok(())` when the loop terminated because of `stop`. The
    /// queue's producer handle is dropped on every exit path, so consumers
    /// observe [`Error::Stopped`] once the queue drains.
    ///
    /// The only way to interrupt the blocking read is `stop` closing the
    /// handle; the loop re-checks the lifecycle state before each read and
    /// treats read failures after a stop request as clean termination.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyListening`] if a loop is already active,
    /// [`Error::Stopped`] if the reader was stopped before the loop
    /// started, [`Error::Read`] for a fatal read failure, and
    /// [`Error::Truncated`] if a record violates the sizing invariant.
    pub fn listen(&self) -> Result<()> {
        match self
            .state
            .compare_exchange(CREATED, LISTENING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(LISTENING) => return Err(Error::AlreadyListening),
            Err(_) => return Err(Error::Stopped),
        }

        // A stop between the transition above and this take has already
        // dropped the producer; report the stop instead of looping.
        let Some(producer) = self.producer.lock().take() else {
            return Err(Error::Stopped);
        };

        let mut buffer = vec![0u8; read_buffer_len(self.capacity, self.max_name_len)];
        tracing::debug!(buffer_len = buffer.len(), "read loop started");

        loop {
            if self.state() == ReaderState::Stopped {
                tracing::debug!("read loop observed stop request");
                return Ok(());
            }

            let filled = match sys::read(self.fd, &mut buffer) {
                Ok(filled) => filled,
                Err(err) => {
                    if self.state() == ReaderState::Stopped {
                        // The handle was closed underneath us by `stop`.
                        tracing::debug!("read loop terminated by closed handle");
                        return Ok(());
                    }
                    return Err(Error::Read(err));
                }
            };

            let events = decode_events(&buffer[..filled])?;
            tracing::trace!(bytes = filled, count = events.len(), "decoded events");

            for event in events {
                // An IGNORED event means the kernel invalidated the watch;
                // its descriptor leaves the registry before delivery.
                if event.mask.contains(EventMask::IGNORED) {
                    self.watches.lock().remove(&event.wd);
                }
                if producer.send(event).is_err() {
                    // Every consumer handle is gone; nothing left to serve.
                    return Ok(());
                }
            }
        }
    }

    /// Retrieve a single event, blocking until one is available.
    ///
    /// Competing consumers each receive distinct events, in decode order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] once the reader is stopped and the queue
    /// has drained.
    pub fn recv(&self) -> Result<Event> {
        self.events.recv().map_err(|_| Error::Stopped)
    }

    /// Retrieve a single event, blocking for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if nothing arrived within `timeout`, or
    /// [`Error::Stopped`] once the reader is stopped and the queue has
    /// drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event> {
        self.events.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => Error::Timeout,
            RecvTimeoutError::Disconnected => Error::Stopped,
        })
    }

    /// Stop the reader. Idempotent, callable from any state and any thread.
    ///
    /// Marks the reader stopped, best-effort removes every outstanding
    /// watch (individual failures are logged and ignored; shutdown always
    /// completes), closes the inotify handle, and closes the event queue so
    /// pending and future retrievals unblock with [`Error::Stopped`].
    ///
    /// The watch removals each queue an IGNORED event, which wakes a read
    /// loop blocked in the kernel so it can observe the stop. A listening
    /// reader with an empty registry has nothing to wake it and only
    /// observes the stop at its next read.
    pub fn stop(&self) {
        if self.state.swap(STOPPED, Ordering::AcqRel) == STOPPED {
            return;
        }

        let outstanding: Vec<WatchDescriptor> = {
            let mut watches = self.watches.lock();
            watches.drain().collect()
        };
        for wd in outstanding {
            if let Err(err) = sys::rm_watch(self.fd, wd.0) {
                tracing::warn!(wd = %wd, error = %err, "failed to remove watch during stop");
            }
        }

        if let Err(err) = sys::close(self.fd) {
            tracing::warn!(error = %err, "failed to close inotify handle");
        }

        // Close the queue if `listen` never took the producer.
        self.producer.lock().take();
        tracing::info!("reader stopped");
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.stop();
    }
}
