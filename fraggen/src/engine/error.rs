// SPDX-License-Identifier: MIT

use core::fmt;

use fragio::errors::VolumeIOError;

use crate::engine::branch::BranchId;
use crate::plan::PlanError;

/// Result type for fragmentation runs.
pub type RunResult<T = ()> = Result<T, RunError>;

/// Phases of a fragmentation run, carried in errors and progress lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Priming,
    AlternatingFill,
    Clearing,
    Refilling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Priming => "priming",
            Phase::AlternatingFill => "alternating fill",
            Phase::Clearing => "clearing",
            Phase::Refilling => "refilling",
        };
        f.write_str(name)
    }
}

/// Unified error type for a fragmentation run. Exhaustion never appears
/// here: the prober converts it into a count before the engine sees it.
#[derive(Debug)]
pub enum RunError {
    Config(PlanError),
    Cancelled {
        phase: Phase,
        branch: Option<BranchId>,
    },
    Io {
        phase: Phase,
        branch: Option<BranchId>,
        source: VolumeIOError,
    },
}

impl RunError {
    pub(crate) fn io(phase: Phase, branch: BranchId, source: VolumeIOError) -> Self {
        RunError::Io {
            phase,
            branch: Some(branch),
            source,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "{e}"),
            RunError::Cancelled { phase, branch } => {
                write!(f, "Run cancelled during {phase}")?;
                if let Some(branch) = branch {
                    write!(f, " of {branch}")?;
                }
                Ok(())
            }
            RunError::Io {
                phase,
                branch,
                source,
            } => {
                write!(f, "{phase}")?;
                if let Some(branch) = branch {
                    write!(f, " of {branch}")?;
                }
                write!(f, " failed: {source}")
            }
        }
    }
}

impl From<PlanError> for RunError {
    fn from(e: PlanError) -> Self {
        RunError::Config(e)
    }
}
