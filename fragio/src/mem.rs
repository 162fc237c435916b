// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::VolumeIO;
use crate::errors::*;

/// Capacity-bounded in-memory volume for tests.
///
/// An overflowing write keeps the fitting prefix, like a real `ENOSPC` write
/// leaves a partial file behind, and reports [`VolumeIOError::Exhausted`].
/// [`MemVolumeIO::deny_next_creates`] makes the next N directory creations
/// report [`VolumeIOError::Busy`] to drive retry paths.
#[derive(Debug, Default)]
pub struct MemVolumeIO {
    capacity: u64,
    used: u64,
    files: BTreeMap<PathBuf, u64>,
    dirs: BTreeSet<PathBuf>,
    deny_creates: u32,
}

impl MemVolumeIO {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Bytes currently held by files.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Fail the next `n` directory creations with [`VolumeIOError::Busy`].
    pub fn deny_next_creates(&mut self, n: u32) {
        self.deny_creates = n;
    }

    fn insert(&mut self, path: &Path, len: u64) {
        let prev = self.files.insert(path.to_path_buf(), len).unwrap_or(0);
        self.used = self.used - prev + len;
    }
}

impl VolumeIO for MemVolumeIO {
    fn write_file(&mut self, path: &Path, data: &[u8]) -> VolumeIOResult {
        match path.parent() {
            Some(parent) if self.dirs.contains(parent) => {}
            _ => return Err(io::Error::from(io::ErrorKind::NotFound).into()),
        }
        let len = data.len() as u64;
        let prev = self.files.get(path).copied().unwrap_or(0);
        let free = self.capacity - (self.used - prev);
        if len > free {
            self.insert(path, free);
            return Err(VolumeIOError::Exhausted);
        }
        self.insert(path, len);
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> VolumeIOResult {
        match self.files.remove(path) {
            Some(len) => {
                self.used -= len;
                Ok(())
            }
            None => Err(io::Error::from(io::ErrorKind::NotFound).into()),
        }
    }

    fn create_dir_all(&mut self, path: &Path) -> VolumeIOResult {
        if self.deny_creates > 0 {
            self.deny_creates -= 1;
            return Err(VolumeIOError::Busy);
        }
        let mut dir = path.to_path_buf();
        loop {
            self.dirs.insert(dir.clone());
            match dir.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => dir = parent.to_path_buf(),
                _ => break,
            }
        }
        Ok(())
    }

    fn remove_dir_all(&mut self, path: &Path) -> VolumeIOResult {
        self.dirs.retain(|d| !d.starts_with(path));
        let doomed: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();
        for file in doomed {
            if let Some(len) = self.files.remove(&file) {
                self.used -= len;
            }
        }
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> VolumeIOResult<Vec<PathBuf>> {
        if !self.dirs.contains(dir) {
            return Err(io::Error::from(io::ErrorKind::NotFound).into());
        }
        Ok(self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name().map(PathBuf::from))
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.dirs.contains(path) || self.files.contains_key(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_until_capacity() {
        let mut io = MemVolumeIO::new(2048);
        io.create_dir_all(Path::new("/v")).unwrap();
        io.write_file(Path::new("/v/a"), &[0u8; 1024]).unwrap();
        io.write_file(Path::new("/v/b"), &[0u8; 1024]).unwrap();

        let err = io.write_file(Path::new("/v/c"), &[0u8; 1024]).unwrap_err();
        assert!(err.is_exhausted());
        // the exhausting write left a partial file behind
        assert!(io.exists(Path::new("/v/c")));
        assert_eq!(io.used(), 2048);
    }

    #[test]
    fn test_remove_dir_all_frees_space() {
        let mut io = MemVolumeIO::new(2048);
        io.create_dir_all(Path::new("/v/branch1")).unwrap();
        io.write_file(Path::new("/v/branch1/data0.txt"), &[0u8; 512]).unwrap();

        io.remove_dir_all(Path::new("/v/branch1")).unwrap();
        assert_eq!(io.used(), 0);
        assert!(!io.exists(Path::new("/v/branch1")));
        assert!(io.exists(Path::new("/v")));
    }

    #[test]
    fn test_list_dir_is_direct_children_only() {
        let mut io = MemVolumeIO::new(4096);
        io.create_dir_all(Path::new("/v/branch1")).unwrap();
        io.write_file(Path::new("/v/data9.txt"), b"top").unwrap();
        io.write_file(Path::new("/v/branch1/data0.txt"), b"deep").unwrap();

        assert_eq!(
            io.list_dir(Path::new("/v")).unwrap(),
            vec![PathBuf::from("data9.txt")]
        );
    }

    #[test]
    fn test_deny_creates_reports_busy() {
        let mut io = MemVolumeIO::new(1024);
        io.deny_next_creates(1);
        assert!(io.create_dir_all(Path::new("/v")).unwrap_err().is_busy());
        io.create_dir_all(Path::new("/v")).unwrap();
        assert!(io.exists(Path::new("/v")));
    }
}
