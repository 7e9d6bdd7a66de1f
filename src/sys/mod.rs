//! Thin wrappers around the kernel-facing inotify calls.
//!
//! Everything `unsafe` in the crate lives here. Each wrapper maps a failed
//! syscall to `io::Error::last_os_error()` and nothing else; interpretation
//! of the error is left to the caller.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;

/// Create an inotify handle via `inotify_init1(2)`.
pub fn init(flags: i32) -> io::Result<RawFd> {
    let fd = unsafe { libc::inotify_init1(flags) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

/// Register `path` with `mask` via `inotify_add_watch(2)`.
pub fn add_watch(fd: RawFd, path: &Path, mask: u32) -> io::Result<i32> {
    let path = cstring(path)?;
    let wd = unsafe { libc::inotify_add_watch(fd, path.as_ptr(), mask) };
    if wd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(wd)
}

/// Remove a watch descriptor via `inotify_rm_watch(2)`.
pub fn rm_watch(fd: RawFd, wd: i32) -> io::Result<()> {
    let rc = unsafe { libc::inotify_rm_watch(fd, wd) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Blocking `read(2)` into `buf`, retried on `EINTR`.
pub fn read(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len()) };
        if let Ok(n) = usize::try_from(n) {
            return Ok(n);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Release the handle via `close(2)`.
pub fn close(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { libc::close(fd) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Ask the host for the maximum filename length under `path` via
/// `pathconf(3)` with `_PC_NAME_MAX`.
///
/// An indeterminate limit (`pathconf` returning a non-positive value) is
/// reported as an error so the caller can fall back to its own default.
pub fn name_max(path: &Path) -> io::Result<usize> {
    let path = cstring(path)?;
    let limit = unsafe { libc::pathconf(path.as_ptr(), libc::_PC_NAME_MAX) };
    match usize::try_from(limit) {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(io::Error::last_os_error()),
    }
}

fn cstring(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "path contains an interior NUL byte")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_close() {
        let fd = init(0).unwrap();
        close(fd).unwrap();
    }

    #[test]
    fn test_add_watch_missing_path() {
        let fd = init(0).unwrap();
        let err = add_watch(fd, Path::new("/nonexistent/vigil-test"), libc::IN_CREATE);
        assert!(err.is_err());
        close(fd).unwrap();
    }

    #[test]
    fn test_rm_watch_unknown_descriptor() {
        let fd = init(0).unwrap();
        assert!(rm_watch(fd, 12345).is_err());
        close(fd).unwrap();
    }

    #[test]
    fn test_name_max_of_cwd() {
        // Either the host reports a positive limit or the probe errors;
        // it never reports zero.
        if let Ok(limit) = name_max(Path::new(".")) {
            assert!(limit > 0);
        }
    }

    #[test]
    fn test_cstring_rejects_interior_nul() {
        use std::ffi::OsStr;
        let path = Path::new(OsStr::from_bytes(b"bad\0path"));
        assert!(cstring(path).is_err());
    }
}
