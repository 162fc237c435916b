// SPDX-License-Identifier: MIT

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::VolumeIO;
use crate::errors::*;

/// Blocking `std::fs` backend. Every error crosses the classification
/// boundary in [`crate::errors`] on the way out.
#[derive(Debug, Default)]
pub struct StdVolumeIO;

impl VolumeIO for StdVolumeIO {
    fn write_file(&mut self, path: &Path, data: &[u8]) -> VolumeIOResult {
        let mut file = fs::File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> VolumeIOResult {
        fs::remove_file(path)?;
        Ok(())
    }

    fn create_dir_all(&mut self, path: &Path) -> VolumeIOResult {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_dir_all(&mut self, path: &Path) -> VolumeIOResult {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_dir(&self, dir: &Path) -> VolumeIOResult<Vec<PathBuf>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(PathBuf::from(entry.file_name()));
            }
        }
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_list_remove() {
        let dir = tempdir().unwrap();
        let mut io = StdVolumeIO;
        let path = dir.path().join("data0.txt");

        io.write_file(&path, b"abcd").unwrap();
        assert!(io.exists(&path));
        assert_eq!(io.list_dir(dir.path()).unwrap(), vec![PathBuf::from("data0.txt")]);

        io.remove_file(&path).unwrap();
        assert!(!io.exists(&path));
        assert!(io.list_dir(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_remove_dir_all_tolerates_missing() {
        let dir = tempdir().unwrap();
        let mut io = StdVolumeIO;
        io.remove_dir_all(&dir.path().join("nope")).unwrap();
    }

    #[test]
    fn test_list_dir_skips_subdirectories() {
        let dir = tempdir().unwrap();
        let mut io = StdVolumeIO;
        io.create_dir_all(&dir.path().join("branch1")).unwrap();
        io.write_file(&dir.path().join("data0.txt"), b"x").unwrap();

        assert_eq!(io.list_dir(dir.path()).unwrap(), vec![PathBuf::from("data0.txt")]);
    }

    #[test]
    fn test_write_into_missing_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let mut io = StdVolumeIO;
        let err = io
            .write_file(&dir.path().join("missing").join("data0.txt"), b"x")
            .unwrap_err();
        assert!(matches!(err, VolumeIOError::Io(_)));
    }
}
