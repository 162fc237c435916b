// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use fragio::VolumeIO;
use fragio::prober::{self, CancelToken, FillReport, Probe};

use crate::engine::branch::{BranchId, BranchStore};
use crate::engine::error::{Phase, RunError, RunResult};
use crate::engine::source::{FillerSource, RefillPass};
use crate::plan::PlanError;
use crate::utils::{self, progress};

/// Result of one branch refill.
#[derive(Debug, Clone, Copy)]
pub struct RefillReport {
    pub branch: BranchId,
    pub files: u64,
    pub bytes: u64,
}

/// Per-iteration refill counts.
#[derive(Debug, Default)]
pub struct IterationReport {
    pub refills: Vec<RefillReport>,
}

/// Totals of a whole fragmentation run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Files seeded per branch by the alternating fill.
    pub seeded: u64,
    /// Bytes seeded across both branches.
    pub seeded_bytes: u64,
    pub iterations: Vec<IterationReport>,
}

impl RunReport {
    pub fn refill_files(&self) -> u64 {
        self.iterations
            .iter()
            .flat_map(|i| i.refills.iter())
            .map(|r| r.files)
            .sum()
    }

    pub fn refill_bytes(&self) -> u64 {
        self.iterations
            .iter()
            .flat_map(|i| i.refills.iter())
            .map(|r| r.bytes)
            .sum()
    }
}

/// Drives the fill → clear → refill cycle over both branches.
///
/// Each iteration clears and refills both branches in turn. The adjacent,
/// still-populated branch bounds every freed span, and the larger refill
/// files cannot tile those spans — the filesystem has to split them across
/// the holes, which is the point.
pub struct Fragmenter<'a, IO: VolumeIO> {
    io: &'a mut IO,
    store: BranchStore,
    source: FillerSource,
}

impl<'a, IO: VolumeIO> Fragmenter<'a, IO> {
    pub fn new(io: &'a mut IO, volume: PathBuf, source: FillerSource) -> Self {
        Self {
            io,
            store: BranchStore::new(volume),
            source,
        }
    }

    /// Run the whole state machine: priming, alternating fill, then
    /// `iterations` clear/refill cycles. The volume is left fragmented on
    /// purpose; nothing is rolled back on the way out.
    pub fn run(mut self, iterations: u32, cancel: &CancelToken) -> RunResult<RunReport> {
        self.prime()?;

        crate::log_normal!(
            "Commencing fragmentation of '{}'",
            self.store.root().display()
        );
        for id in BranchId::BOTH {
            self.clear(id)?;
        }

        let mut report = RunReport::default();
        let seeded = self.alternating_fill(cancel)?;
        report.seeded = seeded.files;
        report.seeded_bytes = seeded.bytes;
        crate::log_normal!(
            "Both branches seeded with {} files each ({})",
            utils::sep_u64(seeded.files),
            utils::pretty_bytes(seeded.bytes),
        );

        for i in 1..=iterations {
            crate::log_normal!("Entering fragmentation iteration {i}/{iterations}");
            let mut iteration = IterationReport::default();
            for id in BranchId::BOTH {
                self.clear(id)?;
                iteration.refills.push(self.refill(id, cancel)?);
            }
            report.iterations.push(iteration);
        }

        Ok(report)
    }

    /// Fail fast, before any write, when the volume is not usable.
    fn prime(&self) -> RunResult<()> {
        let root = self.store.root();
        if !self.io.exists(root) {
            return Err(RunError::Config(PlanError::VolumeMissing(
                root.to_path_buf(),
            )));
        }
        // readability probe; an unreadable root would fail every pass anyway
        self.io.list_dir(root).map_err(|e| RunError::Io {
            phase: Phase::Priming,
            branch: None,
            source: e,
        })?;
        Ok(())
    }

    fn clear(&mut self, id: BranchId) -> RunResult<()> {
        self.store
            .reset(self.io, id)
            .map_err(|e| RunError::io(Phase::Clearing, id, e))?;
        crate::log_info!("{id} cleared");
        Ok(())
    }

    /// Strict round-robin seeding: one small file to branch 1, one to
    /// branch 2, then the index advances. Stops on the first exhaustion
    /// signal from either branch, leaving both with identical `0..k` runs.
    fn alternating_fill(&mut self, cancel: &CancelToken) -> RunResult<FillReport> {
        let pb = progress::fill_progress("Seeding branches");
        let mut report = FillReport::default();
        let mut index = 0u64;

        'fill: loop {
            if cancel.is_cancelled() {
                pb.finish_and_clear();
                return Err(RunError::Cancelled {
                    phase: Phase::AlternatingFill,
                    branch: None,
                });
            }
            let mut round_bytes = 0u64;
            for (slot, id) in BranchId::BOTH.into_iter().enumerate() {
                let data = self.source.fill_bytes(index * 2 + slot as u64);
                let path = self.store.file_path(id, index);
                match prober::probe_write(self.io, &path, data)
                    .map_err(|e| RunError::io(Phase::AlternatingFill, id, e))?
                {
                    Probe::Fit => round_bytes += data.len() as u64,
                    Probe::Full => {
                        // Drop the unmatched write of this round so both
                        // branches keep equal contiguous runs.
                        if id == BranchId::Two {
                            let _ = self
                                .io
                                .remove_file(&self.store.file_path(BranchId::One, index));
                        }
                        break 'fill;
                    }
                }
            }
            report.files += 1;
            report.bytes += round_bytes;
            index += 1;
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(report)
    }

    /// Refill a cleared branch with large-class files until the volume
    /// signals exhaustion again.
    fn refill(&mut self, id: BranchId, cancel: &CancelToken) -> RunResult<RefillReport> {
        let start = self
            .store
            .next_index(self.io, id)
            .map_err(|e| RunError::io(Phase::Refilling, id, e))?;

        crate::log_verbose!("{id} refill resumes at index {start}");
        let pb = progress::fill_progress(&format!("Refilling {id}"));
        let mut pass = RefillPass(&self.source);
        let store = &self.store;
        let report = prober::write_until_exhausted(
            self.io,
            |n| store.file_path(id, n),
            &mut pass,
            start,
            cancel,
            |_| pb.inc(1),
        )
        .map_err(|e| RunError::io(Phase::Refilling, id, e))?;
        pb.finish_and_clear();

        if report.interrupted {
            return Err(RunError::Cancelled {
                phase: Phase::Refilling,
                branch: Some(id),
            });
        }
        crate::log_info!(
            "{id} refilled with {} files ({})",
            utils::sep_u64(report.files),
            utils::pretty_bytes(report.bytes),
        );
        Ok(RefillReport {
            branch: id,
            files: report.files,
            bytes: report.bytes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use fragio::prelude::*;
    use std::path::Path;

    const KB: u64 = 1024;

    fn mem_volume(capacity: u64) -> (MemVolumeIO, PathBuf) {
        let mut io = MemVolumeIO::new(capacity);
        let root = PathBuf::from("/vol");
        io.create_dir_all(&root).unwrap();
        (io, root)
    }

    fn source_1k_3k() -> FillerSource {
        FillerSource::generate(KB, 3 * KB, 0).unwrap()
    }

    #[test]
    fn test_alternating_fill_leaves_equal_contiguous_runs() {
        // 65 KiB: branch 1 takes the last free KiB, branch 2's write of the
        // same round exhausts, and the unmatched file must go away.
        let (mut io, root) = mem_volume(65 * KB);
        let mut frag = Fragmenter::new(&mut io, root.clone(), source_1k_3k());
        for id in BranchId::BOTH {
            frag.clear(id).unwrap();
        }
        let report = frag.alternating_fill(&CancelToken::new()).unwrap();
        drop(frag);

        assert_eq!(report.files, 32);
        assert_eq!(report.bytes, 64 * KB);
        let store = BranchStore::new(root);
        for id in BranchId::BOTH {
            assert_eq!(store.next_index(&io, id).unwrap(), report.files);
            assert_eq!(
                io.list_dir(&store.branch_path(id)).unwrap().len() as u64,
                report.files
            );
        }
    }

    #[test]
    fn test_run_refills_with_fewer_larger_files() {
        let (mut io, root) = mem_volume(66 * KB);
        let report = Fragmenter::new(&mut io, root.clone(), source_1k_3k())
            .run(2, &CancelToken::new())
            .unwrap();

        assert!(report.seeded > 0);
        assert_eq!(report.iterations.len(), 2);
        for iteration in &report.iterations {
            assert_eq!(iteration.refills.len(), 2);
            for refill in &iteration.refills {
                assert!(refill.files > 0);
                // large > small forces strictly fewer files per branch span
                assert!(refill.files < report.seeded);
            }
        }

        // the last refilled branch really holds what the report says
        let store = BranchStore::new(root);
        let last = report.iterations.last().unwrap().refills.last().unwrap();
        assert_eq!(
            io.list_dir(&store.branch_path(last.branch)).unwrap().len() as u64,
            last.files
        );
    }

    #[test]
    fn test_refill_restarts_numbering_after_clear() {
        let (mut io, root) = mem_volume(64 * KB);
        let report = Fragmenter::new(&mut io, root.clone(), source_1k_3k())
            .run(1, &CancelToken::new())
            .unwrap();

        let store = BranchStore::new(root);
        let refill = &report.iterations[0].refills[0];
        assert!(io.exists(&store.file_path(refill.branch, 0)));
        assert!(io.exists(&store.file_path(refill.branch, refill.files - 1)));
    }

    #[test]
    fn test_missing_volume_writes_nothing() {
        let mut io = MemVolumeIO::new(64 * KB);
        let err = Fragmenter::new(&mut io, PathBuf::from("/nope"), source_1k_3k())
            .run(1, &CancelToken::new())
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Config(PlanError::VolumeMissing(_))
        ));
        assert_eq!(io.used(), 0);
        assert!(!io.exists(Path::new("/nope")));
    }

    #[test]
    fn test_cancel_aborts_seeding() {
        let (mut io, root) = mem_volume(64 * KB);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = Fragmenter::new(&mut io, root, source_1k_3k())
            .run(1, &cancel)
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Cancelled {
                phase: Phase::AlternatingFill,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_refill_is_valid_when_volume_stays_full() {
        // capacity so small that only the seeding pass fits anything:
        // one 1 KiB pair seeds, then a 3 KiB refill cannot fit at all
        let (mut io, root) = mem_volume(2 * KB);
        let report = Fragmenter::new(&mut io, root, source_1k_3k())
            .run(1, &CancelToken::new())
            .unwrap();

        assert_eq!(report.seeded, 1);
        let refill = &report.iterations[0].refills[0];
        assert_eq!(refill.files, 0);
    }
}
