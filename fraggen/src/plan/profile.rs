// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::plan::{error::*, size::*};
use crate::utils::{pretty_bytes, truncate};

pub const DEFAULT_ITERATIONS: u32 = 1;
pub const DEFAULT_SEED: u64 = 0;

/// Run profile as it appears on disk (TOML). Everything is optional here;
/// [`Plan::resolve`] layers command-line values on top and rejects the holes.
#[derive(Debug, Default, Deserialize)]
pub struct Profile {
    pub volume: Option<PathBuf>,
    pub iterations: Option<u32>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub filler: FillerSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct FillerSection {
    pub small: Option<Size>,
    pub large: Option<Size>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Number of `source{N}.txt` files pre-placed at the volume root.
    pub source_count: Option<u32>,
}

impl Profile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut profile: Profile = toml::from_str(&content)?;

        // Relative paths in a profile are relative to the profile itself.
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(volume) = &mut profile.volume
            && volume.is_relative()
        {
            *volume = base.join(&*volume);
        }
        for source in &mut profile.filler.sources {
            if source.is_relative() {
                *source = base.join(&*source);
            }
        }
        Ok(profile)
    }
}

/// Command-line values layered over an optional profile.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub volume: Option<PathBuf>,
    pub iterations: Option<u32>,
    pub small: Option<u64>,
    pub large: Option<u64>,
    pub sources: Vec<PathBuf>,
    pub source_count: Option<u32>,
    pub seed: Option<u64>,
}

/// Where filler content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillerPlan {
    /// Two generated junk blobs; `large` refuses to tile the holes `small`
    /// leaves behind.
    Generated { small: u64, large: u64, seed: u64 },
    /// Pre-supplied files, round-robined over in every pass.
    Files(Vec<PathBuf>),
}

/// Fully resolved run configuration.
#[derive(Debug)]
pub struct Plan {
    pub volume: PathBuf,
    pub iterations: u32,
    pub filler: FillerPlan,
}

impl Plan {
    pub fn resolve(profile_path: Option<&Path>, over: RunOverrides) -> anyhow::Result<Self> {
        let profile = match profile_path {
            Some(path) => Profile::from_file(path)?,
            None => Profile::default(),
        };

        let volume = over
            .volume
            .or(profile.volume)
            .ok_or(PlanError::VolumeUnset)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let iterations = over
            .iterations
            .or(profile.iterations)
            .unwrap_or(DEFAULT_ITERATIONS);
        let seed = over.seed.or(profile.seed).unwrap_or(DEFAULT_SEED);

        let sources = if over.sources.is_empty() {
            profile.filler.sources
        } else {
            over.sources
        };
        let small = over.small.or(profile.filler.small.map(|s| s.0));
        let large = over.large.or(profile.filler.large.map(|s| s.0));
        let source_count = over.source_count.or(profile.filler.source_count);

        let filler = if let Some(count) = source_count {
            // the original layout: source1.txt..sourceN.txt at the volume root
            if !sources.is_empty() || small.is_some() || large.is_some() {
                return Err(anyhow::anyhow!("{}", PlanError::FillerConflict));
            }
            if count == 0 {
                return Err(anyhow::anyhow!("{}", PlanError::FillerUnset));
            }
            FillerPlan::Files(
                (1..=count)
                    .map(|i| volume.join(format!("source{i}.txt")))
                    .collect(),
            )
        } else if sources.is_empty() {
            match (small, large) {
                (Some(small), Some(large)) => FillerPlan::Generated { small, large, seed },
                _ => return Err(anyhow::anyhow!("{}", PlanError::FillerUnset)),
            }
        } else if small.is_some() || large.is_some() {
            return Err(anyhow::anyhow!("{}", PlanError::FillerConflict));
        } else {
            FillerPlan::Files(sources)
        };

        Ok(Plan {
            volume,
            iterations,
            filler,
        })
    }

    /// All checks run before the first filesystem mutation.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.iterations < 1 {
            return Err(PlanError::InvalidIterations(self.iterations));
        }
        if !self.volume.is_dir() {
            return Err(PlanError::VolumeMissing(self.volume.clone()));
        }
        match &self.filler {
            FillerPlan::Generated { small, large, .. } => {
                if *small == 0 || large <= small {
                    return Err(PlanError::SizeOrder {
                        small: *small,
                        large: *large,
                    });
                }
            }
            FillerPlan::Files(paths) => {
                let mut sizes = Vec::with_capacity(paths.len());
                for path in paths {
                    let meta = fs::metadata(path)
                        .map_err(|_| PlanError::SourceMissing(path.clone()))?;
                    if meta.len() == 0 {
                        return Err(PlanError::SourceEmpty(path.clone()));
                    }
                    sizes.push(meta.len());
                }
                let min = sizes.iter().copied().min().unwrap_or(0);
                let max = sizes.iter().copied().max().unwrap_or(0);
                if min == max {
                    return Err(PlanError::SourcesUniformSize(min));
                }
            }
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        crate::log_info!("{}", self);
    }
}

impl core::fmt::Display for Plan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "\n  ┌──────────────┬────────────────────────────────────────────┐"
        )?;
        let volume = self.volume.display().to_string();
        writeln!(f, "  | Volume       | {:<42} |", truncate(&volume, 42))?;
        writeln!(f, "  | Iterations   | {:<42} |", self.iterations)?;
        match &self.filler {
            FillerPlan::Generated { small, large, seed } => {
                writeln!(f, "  | Filler       | {:<42} |", "generated")?;
                writeln!(f, "  | Small class  | {:<42} |", pretty_bytes(*small))?;
                writeln!(f, "  | Large class  | {:<42} |", pretty_bytes(*large))?;
                writeln!(f, "  | Seed         | {:<42} |", seed)?;
            }
            FillerPlan::Files(paths) => {
                let label = format!("{} source files", paths.len());
                writeln!(f, "  | Filler       | {:<42} |", label)?;
                for path in paths {
                    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                    let name = path.display().to_string();
                    let row = format!("{} ({})", truncate(&name, 30), pretty_bytes(size));
                    writeln!(f, "  |              | {:<42} |", row)?;
                }
            }
        }
        writeln!(
            f,
            "  └──────────────┴────────────────────────────────────────────┘"
        )
    }
}
