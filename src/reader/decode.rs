//! Pure decoding of the kernel's raw event stream.
//!
//! A single `read(2)` on an inotify handle returns a sequence of whole
//! records, each a fixed-size header followed by `len` bytes of NUL-padded
//! name. Records are deserialized field by field with bounds checks; buffer
//! memory is never reinterpreted as a kernel struct.

use std::ffi::{OsStr, OsString};
use std::mem;
use std::os::unix::ffi::OsStrExt;

use crate::error::{Error, Result};
use crate::event::{Event, EventMask, WatchDescriptor};

/// Size of the fixed header: wd (i32), mask (u32), cookie (u32), len (u32).
pub(crate) const HEADER_LEN: usize = mem::size_of::<libc::inotify_event>();

/// Read buffer size for `capacity` worst-case records.
///
/// Covers both extremes a read must satisfy: `capacity` records with
/// empty names, or one record carrying a maximum-length name plus its
/// terminating padding byte. The kernel only returns whole records into a
/// buffer of at least this size, so no record ever spans two reads.
pub(crate) fn read_buffer_len(capacity: usize, max_name_len: usize) -> usize {
    HEADER_LEN * capacity + max_name_len + 1
}

/// Decode every record in `buf` into owned events, in input order.
///
/// `buf` must span exactly the bytes returned by one kernel read. A record
/// extending past the end of `buf` violates the buffer-sizing invariant and
/// yields [`Error::Truncated`].
pub(crate) fn decode_events(buf: &[u8]) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let header = buf
            .get(offset..offset + HEADER_LEN)
            .ok_or(Error::Truncated {
                offset,
                available: buf.len() - offset,
            })?;

        let wd = read_i32(&header[0..4]);
        let mask = read_u32(&header[4..8]);
        let cookie = read_u32(&header[8..12]);
        let name_len = read_u32(&header[12..16]) as usize;

        let name_start = offset + HEADER_LEN;
        let name_field = buf
            .get(name_start..name_start + name_len)
            .ok_or(Error::Truncated {
                offset,
                available: buf.len() - offset,
            })?;

        events.push(Event {
            wd: WatchDescriptor(wd),
            mask: EventMask::from_bits_retain(mask),
            cookie,
            name: trim_name(name_field),
        });

        offset = name_start + name_len;
    }

    Ok(events)
}

/// The logical name is the content up to the first NUL; the kernel pads the
/// field with NULs to align the next record.
fn trim_name(field: &[u8]) -> Option<OsString> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    if end == 0 {
        return None;
    }
    Some(OsStr::from_bytes(&field[..end]).to_os_string())
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    i32::from_ne_bytes(raw)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_ne_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode one record the way the kernel lays it out: header, then the
    /// name bytes padded with `pad` NULs.
    fn record(wd: i32, mask: u32, cookie: u32, name: &[u8], pad: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + name.len() + pad);
        buf.extend_from_slice(&wd.to_ne_bytes());
        buf.extend_from_slice(&mask.to_ne_bytes());
        buf.extend_from_slice(&cookie.to_ne_bytes());
        buf.extend_from_slice(&u32::try_from(name.len() + pad).unwrap().to_ne_bytes());
        buf.extend_from_slice(name);
        buf.extend(std::iter::repeat(0u8).take(pad));
        buf
    }

    #[test]
    fn test_header_len_matches_kernel_layout() {
        assert_eq!(HEADER_LEN, 16);
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert!(decode_events(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_empty_name_records_in_order() {
        let mut buf = Vec::new();
        for wd in 1..=5 {
            buf.extend_from_slice(&record(wd, libc::IN_CREATE, 0, b"", 0));
        }

        let events = decode_events(&buf).unwrap();
        assert_eq!(events.len(), 5);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.wd, WatchDescriptor(i32::try_from(i).unwrap() + 1));
            assert!(event.mask.contains(EventMask::CREATE));
            assert_eq!(event.name, None);
        }
    }

    #[test]
    fn test_decode_name_with_padding() {
        let buf = record(1, libc::IN_CREATE, 0, b"foo.txt", 9);
        let events = decode_events(&buf).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name.as_deref(), Some(OsStr::new("foo.txt")));
    }

    #[test]
    fn test_decode_name_any_padding_length() {
        for pad in 0..=8 {
            let buf = record(1, libc::IN_DELETE, 0, b"a", pad);
            let events = decode_events(&buf).unwrap();
            assert_eq!(events[0].name.as_deref(), Some(OsStr::new("a")), "pad {pad}");
        }
    }

    #[test]
    fn test_decode_all_padding_name_is_none() {
        let buf = record(1, libc::IN_IGNORED, 0, b"", 16);
        let events = decode_events(&buf).unwrap();
        assert_eq!(events[0].name, None);
    }

    #[test]
    fn test_decode_cookie_passthrough() {
        let mut buf = record(2, libc::IN_MOVED_FROM, 0xBEEF, b"a.txt", 3);
        buf.extend_from_slice(&record(2, libc::IN_MOVED_TO, 0xBEEF, b"b.txt", 3));

        let events = decode_events(&buf).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].cookie, 0xBEEF);
        assert_eq!(events[1].cookie, 0xBEEF);
        assert_eq!(events[0].name.as_deref(), Some(OsStr::new("a.txt")));
        assert_eq!(events[1].name.as_deref(), Some(OsStr::new("b.txt")));
    }

    #[test]
    fn test_decode_mixed_records() {
        let mut buf = record(1, libc::IN_CREATE, 0, b"spam.log", 8);
        buf.extend_from_slice(&record(1, libc::IN_Q_OVERFLOW, 0, b"", 0));
        buf.extend_from_slice(&record(3, libc::IN_DELETE | libc::IN_ISDIR, 0, b"old", 1));

        let events = decode_events(&buf).unwrap();
        assert_eq!(events.len(), 3);
        assert!(events[1].mask.contains(EventMask::Q_OVERFLOW));
        assert!(events[2].is_dir());
        assert_eq!(events[2].name.as_deref(), Some(OsStr::new("old")));
    }

    #[test]
    fn test_decode_preserves_unknown_mask_bits() {
        let raw_mask = libc::IN_CREATE | 0x0100_0000;
        let buf = record(1, raw_mask, 0, b"", 0);
        let events = decode_events(&buf).unwrap();
        assert_eq!(events[0].mask.bits(), raw_mask);
    }

    #[test]
    fn test_decode_truncated_header() {
        let buf = record(1, libc::IN_CREATE, 0, b"", 0);
        let err = decode_events(&buf[..10]).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                offset: 0,
                available: 10
            }
        ));
    }

    #[test]
    fn test_decode_truncated_name() {
        // Header declares a 32-byte name field but only 4 bytes follow.
        let full = record(1, libc::IN_CREATE, 0, b"name", 28);
        let err = decode_events(&full[..HEADER_LEN + 4]).unwrap_err();
        assert!(matches!(err, Error::Truncated { offset: 0, .. }));
    }

    #[test]
    fn test_decode_truncation_after_valid_record() {
        let mut buf = record(1, libc::IN_CREATE, 0, b"ok", 2);
        let offset = buf.len();
        buf.extend_from_slice(&record(2, libc::IN_DELETE, 0, b"", 0)[..8]);

        let err = decode_events(&buf).unwrap_err();
        assert!(matches!(err, Error::Truncated { offset: o, .. } if o == offset));
    }

    #[test]
    fn test_buffer_len_formula() {
        assert_eq!(read_buffer_len(128, 255), 16 * 128 + 255 + 1);
        assert_eq!(read_buffer_len(1, 255), 16 + 256);
    }
}
