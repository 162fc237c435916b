// SPDX-License-Identifier: MIT

//! Capacity probing: keep writing until the volume says stop.
//!
//! The probing loop swallows exactly one error condition — exhaustion, the
//! expected terminal signal of every fill pass — and propagates everything
//! else untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::VolumeIO;
use crate::errors::*;

/// Outcome of a single probed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The write fit.
    Fit,
    /// The volume signalled exhaustion; the partial destination was removed.
    Full,
}

/// Supplies the bytes for the next filler file of a pass.
pub trait ContentSource {
    fn next(&mut self, round: u64) -> &[u8];
}

/// Cooperative stop flag, polled once per file write — the natural
/// suspension point of a fill pass.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Totals of one fill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    pub files: u64,
    pub bytes: u64,
    /// Set when the pass stopped on the cancel token instead of exhaustion.
    pub interrupted: bool,
}

/// Write `data` to `path`, distinguishing the one expected failure.
///
/// Exhaustion removes the partially written destination (best effort) and
/// reports [`Probe::Full`]; every other error propagates.
pub fn probe_write<IO: VolumeIO>(io: &mut IO, path: &Path, data: &[u8]) -> VolumeIOResult<Probe> {
    match io.write_file(path, data) {
        Ok(()) => Ok(Probe::Fit),
        Err(VolumeIOError::Exhausted) => {
            let _ = io.remove_file(path);
            Ok(Probe::Full)
        }
        Err(e) => Err(e),
    }
}

/// Write `source` content to `namer(n)` for increasing `n` starting at
/// `start`, until the volume signals exhaustion. Returns how much landed.
pub fn write_until_exhausted<IO, S, F>(
    io: &mut IO,
    namer: F,
    source: &mut S,
    start: u64,
    cancel: &CancelToken,
    mut on_write: impl FnMut(u64),
) -> VolumeIOResult<FillReport>
where
    IO: VolumeIO,
    S: ContentSource,
    F: Fn(u64) -> PathBuf,
{
    let mut report = FillReport::default();
    let mut index = start;
    loop {
        if cancel.is_cancelled() {
            report.interrupted = true;
            return Ok(report);
        }
        let data = source.next(index);
        match probe_write(io, &namer(index), data)? {
            Probe::Full => return Ok(report),
            Probe::Fit => {
                report.files += 1;
                report.bytes += data.len() as u64;
                index += 1;
                on_write(report.files);
            }
        }
    }
}
