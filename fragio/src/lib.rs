// SPDX-License-Identifier: MIT

//! Volume IO abstraction for the fraggen toolset.
//!
//! [`VolumeIO`] is the seam between the fragmentation engine and the storage
//! it mutates: a blocking `std::fs` backend for real runs and a
//! capacity-bounded in-memory backend (feature `mem`) for tests. Errors cross
//! exactly one classification boundary (see [`errors`]) so the engine can
//! match on the no-space / transient / fatal distinction without ever looking
//! at platform error codes.

pub mod errors;
pub mod prober;

mod fs;

#[cfg(feature = "mem")]
mod mem;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::VolumeIO;
    pub use super::errors::*;
    pub use super::fs::StdVolumeIO;
    pub use super::prober::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemVolumeIO;
}

use std::path::{Path, PathBuf};

use errors::*;

/// Storage operations the fragmentation engine needs from a volume.
///
/// Every operation is synchronous and blocking; the strict ordering of the
/// fill/clear/refill cycle depends on each call completing before the next
/// begins.
pub trait VolumeIO {
    /// Create a file at `path`, replacing any previous content.
    ///
    /// On [`VolumeIOError::Exhausted`] the destination may be left holding a
    /// partial prefix of `data`, exactly as a real `ENOSPC` write would.
    fn write_file(&mut self, path: &Path, data: &[u8]) -> VolumeIOResult;

    /// Remove a single file. Removing a missing file is an error.
    fn remove_file(&mut self, path: &Path) -> VolumeIOResult;

    /// Create a directory and any missing parents.
    fn create_dir_all(&mut self, path: &Path) -> VolumeIOResult;

    /// Recursively remove a directory tree. A missing target is not an error.
    fn remove_dir_all(&mut self, path: &Path) -> VolumeIOResult;

    /// Names of the files directly under `dir`.
    fn list_dir(&self, dir: &Path) -> VolumeIOResult<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool;
}
