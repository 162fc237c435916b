// SPDX-License-Identifier: MIT

use core::fmt;
use std::io;

/// Result type for volume IO operations.
pub type VolumeIOResult<T = ()> = core::result::Result<T, VolumeIOError>;

/// Error type for volume IO operations.
///
/// Exactly one condition is expected and recoverable: [`Exhausted`], the
/// volume running out of space mid-fill. [`Busy`] is retryable only while
/// recreating a branch directory. Everything else is fatal and aborts the
/// run.
///
/// [`Exhausted`]: VolumeIOError::Exhausted
/// [`Busy`]: VolumeIOError::Busy
#[derive(Debug)]
pub enum VolumeIOError {
    /// No space left on the volume for the attempted write.
    Exhausted,
    /// The target is held by another process (directory handle kept open by
    /// an external tool, antivirus scan, ...).
    Busy,
    /// Any other IO failure.
    Io(io::Error),
}

impl VolumeIOError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, VolumeIOError::Exhausted)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, VolumeIOError::Busy)
    }
}

impl fmt::Display for VolumeIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeIOError::Exhausted => write!(f, "No space left on volume"),
            VolumeIOError::Busy => write!(f, "Target is held by another process"),
            VolumeIOError::Io(e) => write!(f, "{e}"),
        }
    }
}

/// The one place platform error codes are inspected. Everything downstream
/// matches on the variants instead.
impl From<io::Error> for VolumeIOError {
    #[cold]
    #[inline(never)]
    fn from(e: io::Error) -> Self {
        if is_exhaustion(&e) {
            VolumeIOError::Exhausted
        } else if is_transient_access(&e) {
            VolumeIOError::Busy
        } else {
            VolumeIOError::Io(e)
        }
    }
}

/// The no-space family. Quota errors are deliberately excluded: exceeding a
/// quota is a configuration problem of the test host, not the exhaustion
/// signal the fill loop is waiting for.
fn is_exhaustion(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::StorageFull
        || matches!(e.raw_os_error(), Some(code) if EXHAUSTION_CODES.contains(&code))
}

fn is_transient_access(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ResourceBusy
    )
}

#[cfg(unix)]
const EXHAUSTION_CODES: [i32; 1] = [28]; // ENOSPC

#[cfg(windows)]
const EXHAUSTION_CODES: [i32; 2] = [39, 112]; // ERROR_HANDLE_DISK_FULL, ERROR_DISK_FULL

#[cfg(not(any(unix, windows)))]
const EXHAUSTION_CODES: [i32; 0] = [];
