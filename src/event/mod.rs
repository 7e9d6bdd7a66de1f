//! Decoded inotify event types.

use std::ffi::OsString;
use std::fmt;

/// Kernel-issued identifier for one registered (path, mask) pair.
///
/// Valid from the `add_watch` call that returned it until it is removed,
/// either explicitly or by the kernel itself (signalled by an
/// [`EventMask::IGNORED`] event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchDescriptor(pub(crate) i32);

impl fmt::Display for WatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags::bitflags! {
    /// Bit set describing which change categories occurred.
    ///
    /// Flags combine with bitwise OR, both when registering a watch and in
    /// delivered events. Values are the kernel's own; bits the kernel sets
    /// beyond this catalogue are preserved as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        /// File was accessed.
        const ACCESS = libc::IN_ACCESS;
        /// Metadata changed.
        const ATTRIB = libc::IN_ATTRIB;
        /// Non-writable file was closed.
        const CLOSE_NOWRITE = libc::IN_CLOSE_NOWRITE;
        /// Writable file was closed.
        const CLOSE_WRITE = libc::IN_CLOSE_WRITE;
        /// File or directory was created in a watched directory.
        const CREATE = libc::IN_CREATE;
        /// File or directory was deleted from a watched directory.
        const DELETE = libc::IN_DELETE;
        /// The watched path itself was deleted.
        const DELETE_SELF = libc::IN_DELETE_SELF;
        /// The watch was removed, explicitly or because its target vanished.
        const IGNORED = libc::IN_IGNORED;
        /// The subject of this event is a directory.
        const ISDIR = libc::IN_ISDIR;
        /// File was modified.
        const MODIFY = libc::IN_MODIFY;
        /// The watched path itself was moved.
        const MOVE_SELF = libc::IN_MOVE_SELF;
        /// File was moved out of a watched directory.
        const MOVED_FROM = libc::IN_MOVED_FROM;
        /// File was moved into a watched directory.
        const MOVED_TO = libc::IN_MOVED_TO;
        /// File was opened.
        const OPEN = libc::IN_OPEN;
        /// The kernel's event queue overflowed and events were dropped.
        const Q_OVERFLOW = libc::IN_Q_OVERFLOW;
        /// The filesystem containing the watched path was unmounted.
        const UNMOUNT = libc::IN_UNMOUNT;
    }
}

impl fmt::Display for EventMask {
    /// Renders the known flags as space-separated symbolic names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// A single decoded filesystem change notification.
///
/// Immutable once constructed; ownership passes to whichever consumer
/// received it from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The watch this event was delivered for.
    pub wd: WatchDescriptor,
    /// Which change categories occurred.
    pub mask: EventMask,
    /// Correlation id linking the two halves of a rename; nonzero only for
    /// [`EventMask::MOVED_FROM`]/[`EventMask::MOVED_TO`] pairs on the same
    /// watch.
    pub cookie: u32,
    /// Name of the affected directory entry, trimmed of NUL padding.
    /// `None` when the event concerns the watched path itself.
    pub name: Option<OsString>,
}

impl Event {
    /// Whether the subject of this event is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.mask.contains(EventMask::ISDIR)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event {{ wd: {}, mask: {}, cookie: {}, name: ",
            self.wd, self.mask, self.cookie
        )?;
        match &self.name {
            Some(name) => write!(f, "{name:?} }}"),
            None => f.write_str("<none> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_display_single_flag() {
        assert_eq!(EventMask::CREATE.to_string(), "CREATE");
    }

    #[test]
    fn test_mask_display_combined_flags() {
        let mask = EventMask::CREATE | EventMask::ISDIR;
        assert_eq!(mask.to_string(), "CREATE ISDIR");
    }

    #[test]
    fn test_mask_display_empty() {
        assert_eq!(EventMask::empty().to_string(), "");
    }

    #[test]
    fn test_mask_matches_kernel_values() {
        assert_eq!(EventMask::CREATE.bits(), 0x0000_0100);
        assert_eq!(EventMask::Q_OVERFLOW.bits(), 0x0000_4000);
        assert_eq!(EventMask::ISDIR.bits(), 0x4000_0000);
    }

    #[test]
    fn test_mask_retains_unknown_bits() {
        let mask = EventMask::from_bits_retain(libc::IN_CREATE | 0x0100_0000);
        assert!(mask.contains(EventMask::CREATE));
        assert_eq!(mask.bits(), libc::IN_CREATE | 0x0100_0000);
    }

    #[test]
    fn test_event_is_dir() {
        let event = Event {
            wd: WatchDescriptor(1),
            mask: EventMask::CREATE | EventMask::ISDIR,
            cookie: 0,
            name: Some("subdir".into()),
        };
        assert!(event.is_dir());
    }

    #[test]
    fn test_event_display_with_name() {
        let event = Event {
            wd: WatchDescriptor(3),
            mask: EventMask::CREATE,
            cookie: 0,
            name: Some("foo.txt".into()),
        };
        assert_eq!(
            event.to_string(),
            "Event { wd: 3, mask: CREATE, cookie: 0, name: \"foo.txt\" }"
        );
    }

    #[test]
    fn test_event_display_without_name() {
        let event = Event {
            wd: WatchDescriptor(1),
            mask: EventMask::DELETE_SELF,
            cookie: 0,
            name: None,
        };
        assert_eq!(
            event.to_string(),
            "Event { wd: 1, mask: DELETE_SELF, cookie: 0, name: <none> }"
        );
    }
}
