// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fragio::VolumeIO;
use fragio::errors::*;

/// One of the two interleaved filler collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchId {
    One,
    Two,
}

impl BranchId {
    pub const BOTH: [BranchId; 2] = [BranchId::One, BranchId::Two];

    fn dir_name(self) -> &'static str {
        match self {
            BranchId::One => "branch1",
            BranchId::Two => "branch2",
        }
    }
}

impl core::fmt::Display for BranchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.dir_name())
    }
}

// Filler file naming contract: data{n}.txt, zero-based, contiguous.
const DATA_PREFIX: &str = "data";
const DATA_SUFFIX: &str = ".txt";

// Recreation attempts while another process holds the branch directory open.
const RESET_ATTEMPTS: u32 = 5;
const RESET_BACKOFF: Duration = Duration::from_millis(50);

/// Maps branch identifiers to their locations under the volume root and owns
/// the reset and numbering rules.
#[derive(Debug, Clone)]
pub struct BranchStore {
    root: PathBuf,
}

impl BranchStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn branch_path(&self, id: BranchId) -> PathBuf {
        self.root.join(id.dir_name())
    }

    pub fn file_path(&self, id: BranchId, index: u64) -> PathBuf {
        self.branch_path(id)
            .join(format!("{DATA_PREFIX}{index}{DATA_SUFFIX}"))
    }

    /// Delete the branch tree if present, then recreate it empty.
    ///
    /// Recreation retries a few times when the directory is still held open
    /// by another process; a persistent hold surfaces as the final error.
    pub fn reset<IO: VolumeIO>(&self, io: &mut IO, id: BranchId) -> VolumeIOResult {
        let path = self.branch_path(id);
        io.remove_dir_all(&path)?;

        let mut attempt = 1;
        loop {
            match io.create_dir_all(&path) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_busy() && attempt < RESET_ATTEMPTS => {
                    attempt += 1;
                    thread::sleep(RESET_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Next unused sequence index, derived from the branch contents.
    pub fn next_index<IO: VolumeIO>(&self, io: &IO, id: BranchId) -> VolumeIOResult<u64> {
        let mut next = 0;
        for name in io.list_dir(&self.branch_path(id))? {
            if let Some(index) = parse_data_index(&name) {
                next = next.max(index + 1);
            }
        }
        Ok(next)
    }
}

fn parse_data_index(name: &Path) -> Option<u64> {
    name.file_name()?
        .to_str()?
        .strip_prefix(DATA_PREFIX)?
        .strip_suffix(DATA_SUFFIX)?
        .parse()
        .ok()
}
