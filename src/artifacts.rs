//! Per-round temporary files.
//!
//! Each round owns one scratch directory holding its four artifacts. The directory is
//! removed when the [`RoundArtifacts`] value is dropped, so every way out of a round
//! (success, empty result, tool failure, parse failure, panic unwinding) releases it.
//! Directory names carry the round number plus a random suffix, so concurrent rounds
//! never collide.
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{ALIGN_QUERY, ALIGN_RESULT, DESIGN_INPUT, DESIGN_OUTPUT};
use crate::error::Result;

#[derive(Debug)]
pub struct RoundArtifacts {
    round: usize,
    dir: TempDir,
}

impl RoundArtifacts {
    /// Acquire a fresh scratch directory for `round` under `work_dir`.
    pub fn acquire(work_dir: &Path, round: usize) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("shrna-round-{round:05}-"))
            .tempdir_in(work_dir)?;
        Ok(RoundArtifacts { round, dir })
    }

    pub fn round(&self) -> usize { self.round }

    pub fn dir(&self) -> &Path { self.dir.path() }

    pub fn design_input(&self) -> PathBuf { self.dir.path().join(DESIGN_INPUT) }

    pub fn design_output(&self) -> PathBuf { self.dir.path().join(DESIGN_OUTPUT) }

    pub fn align_query(&self) -> PathBuf { self.dir.path().join(ALIGN_QUERY) }

    pub fn align_result(&self) -> PathBuf { self.dir.path().join(ALIGN_RESULT) }

    /// Release now, reporting removal errors instead of swallowing them in `Drop`.
    pub fn release(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_removes_every_artifact() {
        let work = tempfile::tempdir().unwrap();
        let dir;
        {
            let a = RoundArtifacts::acquire(work.path(), 3).unwrap();
            dir = a.dir().to_path_buf();
            for p in [a.design_input(), a.design_output(), a.align_query(), a.align_result()] {
                std::fs::write(&p, "x").unwrap();
            }
            assert!(dir.file_name().unwrap().to_string_lossy().starts_with("shrna-round-00003-"));
        }
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn same_round_number_does_not_collide() {
        let work = tempfile::tempdir().unwrap();
        let a = RoundArtifacts::acquire(work.path(), 1).unwrap();
        let b = RoundArtifacts::acquire(work.path(), 1).unwrap();
        assert_ne!(a.dir(), b.dir());
        a.release().unwrap();
        b.release().unwrap();
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }
}
