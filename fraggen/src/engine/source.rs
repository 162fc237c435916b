// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fragio::prober::ContentSource;

use crate::plan::{FillerPlan, PlanError};

/// Supplies filler content per pass.
///
/// Generated mode keeps the small class for seeding passes and the large
/// class for refills. File-backed mode round-robins the whole catalog in
/// both passes, so size variety comes from the files themselves.
#[derive(Debug)]
pub enum FillerSource {
    Generated { small: Vec<u8>, large: Vec<u8> },
    Files(Vec<Vec<u8>>),
}

impl FillerSource {
    pub fn materialize(plan: &FillerPlan) -> Result<Self, PlanError> {
        match plan {
            FillerPlan::Generated { small, large, seed } => Self::generate(*small, *large, *seed),
            FillerPlan::Files(paths) => Self::from_files(paths),
        }
    }

    /// Two junk blobs of the exact requested lengths. `large > small > 0` is
    /// the invariant that keeps refill files from tiling the holes the small
    /// ones leave behind.
    pub fn generate(small: u64, large: u64, seed: u64) -> Result<Self, PlanError> {
        if small == 0 || large <= small {
            return Err(PlanError::SizeOrder { small, large });
        }
        Ok(FillerSource::Generated {
            small: junk_bytes(seed, small as usize),
            large: junk_bytes(seed.wrapping_add(1), large as usize),
        })
    }

    pub fn from_files(paths: &[PathBuf]) -> Result<Self, PlanError> {
        if paths.is_empty() {
            return Err(PlanError::FillerUnset);
        }
        let mut blobs = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(path).map_err(|_| PlanError::SourceMissing(path.clone()))?;
            if bytes.is_empty() {
                return Err(PlanError::SourceEmpty(path.clone()));
            }
            blobs.push(bytes);
        }
        let min = blobs.iter().map(|b| b.len()).min().unwrap_or(0);
        let max = blobs.iter().map(|b| b.len()).max().unwrap_or(0);
        if min == max {
            return Err(PlanError::SourcesUniformSize(min as u64));
        }
        Ok(FillerSource::Files(blobs))
    }

    pub fn fill_bytes(&self, round: u64) -> &[u8] {
        match self {
            FillerSource::Generated { small, .. } => small,
            FillerSource::Files(blobs) => &blobs[round as usize % blobs.len()],
        }
    }

    pub fn refill_bytes(&self, round: u64) -> &[u8] {
        match self {
            FillerSource::Generated { large, .. } => large,
            FillerSource::Files(blobs) => &blobs[round as usize % blobs.len()],
        }
    }
}

/// Refill-pass adapter for the capacity prober. The seeding pass interleaves
/// two branches by hand, so only refills go through [`ContentSource`].
pub struct RefillPass<'a>(pub &'a FillerSource);

impl ContentSource for RefillPass<'_> {
    fn next(&mut self, round: u64) -> &[u8] {
        self.0.refill_bytes(round)
    }
}

/// Write `source{N}.txt` junk files (1-based, the layout the pre-supplied
/// variant expects) into `dir`. Returns the paths written.
pub fn materialize_source_files(
    dir: &Path,
    sizes: &[u64],
    seed: u64,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(sizes.len());
    for (i, &size) in sizes.iter().enumerate() {
        if size == 0 {
            anyhow::bail!("Source file sizes must be non-zero");
        }
        let path = dir.join(format!("source{}.txt", i + 1));
        fs::write(&path, junk_bytes(seed.wrapping_add(i as u64), size as usize))?;
        crate::log_info!(
            "Wrote {} ({})",
            path.display(),
            crate::utils::pretty_bytes(size)
        );
        written.push(path);
    }
    Ok(written)
}

/// Repeatable alphanumeric junk; only the length is load-bearing.
fn junk_bytes(seed: u64, len: usize) -> Vec<u8> {
    StdRng::seed_from_u64(seed)
        .sample_iter(&Alphanumeric)
        .take(len)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_exact_lengths() {
        let source = FillerSource::generate(1024, 3 * 1024, 0).unwrap();
        assert_eq!(source.fill_bytes(0).len(), 1024);
        assert_eq!(source.fill_bytes(9).len(), 1024);
        assert_eq!(source.refill_bytes(0).len(), 3 * 1024);
    }

    #[test]
    fn test_generate_is_repeatable() {
        let a = FillerSource::generate(512, 2048, 42).unwrap();
        let b = FillerSource::generate(512, 2048, 42).unwrap();
        assert_eq!(a.fill_bytes(0), b.fill_bytes(0));
        assert_eq!(a.refill_bytes(0), b.refill_bytes(0));
        // small and large classes are not the same stream
        assert_ne!(a.fill_bytes(0)[..512], a.refill_bytes(0)[..512]);
    }

    #[test]
    fn test_generate_rejects_bad_ordering() {
        assert!(matches!(
            FillerSource::generate(0, 1024, 0).unwrap_err(),
            PlanError::SizeOrder { .. }
        ));
        assert!(matches!(
            FillerSource::generate(1024, 1024, 0).unwrap_err(),
            PlanError::SizeOrder { .. }
        ));
    }

    #[test]
    fn test_from_files_round_robins() {
        let dir = tempdir().unwrap();
        let sizes = [100usize, 200, 300];
        let mut paths = Vec::new();
        for (i, size) in sizes.iter().enumerate() {
            let path = dir.path().join(format!("source{}.txt", i + 1));
            fs::write(&path, vec![b'j'; *size]).unwrap();
            paths.push(path);
        }

        let source = FillerSource::from_files(&paths).unwrap();
        for round in 0..7 {
            let expected = sizes[round as usize % sizes.len()];
            assert_eq!(source.fill_bytes(round).len(), expected);
            assert_eq!(source.refill_bytes(round).len(), expected);
        }
    }

    #[test]
    fn test_from_files_rejects_uniform_sizes() {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..2 {
            let path = dir.path().join(format!("source{}.txt", i + 1));
            fs::write(&path, vec![b'j'; 64]).unwrap();
            paths.push(path);
        }
        assert!(matches!(
            FillerSource::from_files(&paths).unwrap_err(),
            PlanError::SourcesUniformSize(64)
        ));
    }

    #[test]
    fn test_materialize_source_files() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("sources");
        let written = materialize_source_files(&out, &[100, 150], 7).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(&written[0]).unwrap().len(), 100);
        assert_eq!(fs::read(&written[1]).unwrap().len(), 150);
        assert_eq!(written[0].file_name().unwrap(), "source1.txt");
    }
}
