// SPDX-License-Identifier: MIT

use core::fmt;
use std::path::PathBuf;

use crate::utils::pretty_bytes;

/// Configuration problems that stop a run before it touches the volume.
#[derive(Debug)]
pub enum PlanError {
    VolumeUnset,
    VolumeMissing(PathBuf),
    InvalidIterations(u32),
    FillerUnset,
    FillerConflict,
    SizeOrder { small: u64, large: u64 },
    SourceMissing(PathBuf),
    SourceEmpty(PathBuf),
    SourcesUniformSize(u64),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::VolumeUnset => {
                write!(f, "No volume given. Pass --volume or set it in the profile")
            }
            PlanError::VolumeMissing(path) => {
                write!(f, "Couldn't find the volume '{}'", path.display())
            }
            PlanError::InvalidIterations(n) => {
                write!(f, "Iteration count must be at least 1 (got {n})")
            }
            PlanError::FillerUnset => {
                write!(f, "No filler configured. Pass --small/--large or --source files")
            }
            PlanError::FillerConflict => {
                write!(f, "Generated sizes and --source files are mutually exclusive")
            }
            PlanError::SizeOrder { small, large } => write!(
                f,
                "Large filler must be bigger than small filler ({} <= {})",
                pretty_bytes(*large),
                pretty_bytes(*small),
            ),
            PlanError::SourceMissing(path) => {
                write!(f, "Couldn't find the source file '{}'", path.display())
            }
            PlanError::SourceEmpty(path) => {
                write!(f, "Source file '{}' is empty", path.display())
            }
            PlanError::SourcesUniformSize(size) => write!(
                f,
                "Source files all share one size ({}); at least two distinct sizes are needed",
                pretty_bytes(*size),
            ),
        }
    }
}
