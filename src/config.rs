//! Named constants and run configuration.
//!
//! Everything the pipeline treats as policy lives here rather than as literals at the use
//! site: the design tool's free-energy window, the off-target rule and the column layout of
//! the aligner's tabular output.
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

// design tool
pub const DEFAULT_DESIGNER_BIN: &str = "si_shRNA_selector-x64";
pub const DESIGNER_ENV_BIN: &str = "SHRNA_DESIGNER_BIN";
pub const DEFAULT_DG_MIN: f64 = -32.0;
pub const DEFAULT_DG_MAX: f64 = -28.0;
pub const EFFICIENT_LABEL: &str = "efficient";

// aligner
pub const DEFAULT_BLASTN_BIN: &str = "blastn";
pub const BLASTN_ENV_BIN: &str = "SHRNA_BLASTN_BIN";
pub const BLASTN_TASK: &str = "blastn-short";
pub const BLASTN_OUTFMT: &str = "6";

// off-target policy
pub const DEFAULT_GUIDE_START: u32 = 1;
pub const DEFAULT_GUIDE_END: u32 = 19;
pub const DEFAULT_MISMATCH_THRESHOLD: u32 = 2;

// controller
pub const DEFAULT_MAX_ROUNDS: usize = 1000;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 3;

// per-round artifact names
pub const DESIGN_INPUT: &str = "design_in.fa";
pub const DESIGN_OUTPUT: &str = "design_out.txt";
pub const ALIGN_QUERY: &str = "align_query.fa";
pub const ALIGN_RESULT: &str = "align_res.txt";
pub const DESIGN_INPUT_HEADER: &str = "TmpSeq";

// library assembly
pub const LIBRARY_PER_GENE: usize = 25;
pub const LIBRARY_DG_CENTRE: f64 = -(33.0 + 28.0) / 2.0;
pub const GENE_DESIGNS_SUFFIX: &str = "shRNA_designs.txt";
pub const CONTROL_PREFIX: &str = "random";

/// Resolve an executable: explicit value, then `env_var`, then `default`.
pub fn resolve_executable(explicit: Option<&str>, env_var: &str, default: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| default.to_string())
}

/// Free-energy acceptance window handed verbatim to the design tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DgWindow {
    pub min: f64,
    pub max: f64,
}

impl Default for DgWindow {
    fn default() -> Self {
        DgWindow { min: DEFAULT_DG_MIN, max: DEFAULT_DG_MAX }
    }
}

/// Which alignments count as a genuine off-target hit.
///
/// A hit disqualifies a design when it spans exactly `guide_start..=guide_end` of the query
/// (1-based, inclusive) with at most `mismatch_threshold` mismatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffTargetPolicy {
    pub guide_start: u32,
    pub guide_end: u32,
    pub mismatch_threshold: u32,
}

impl Default for OffTargetPolicy {
    fn default() -> Self {
        OffTargetPolicy {
            guide_start: DEFAULT_GUIDE_START,
            guide_end: DEFAULT_GUIDE_END,
            mismatch_threshold: DEFAULT_MISMATCH_THRESHOLD,
        }
    }
}

/// 0-based column positions in the aligner's tabular output.
///
/// Defaults follow BLAST `-outfmt 6`:
/// `qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitSchema {
    pub query_id: usize,
    pub subject_id: usize,
    pub mismatches: usize,
    pub query_start: usize,
    pub query_end: usize,
}

impl HitSchema {
    /// Minimum number of fields a row must carry to be read with this schema.
    pub fn min_fields(&self) -> usize {
        [self.query_id, self.subject_id, self.mismatches, self.query_start, self.query_end]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl Default for HitSchema {
    fn default() -> Self {
        HitSchema { query_id: 0, subject_id: 1, mismatches: 4, query_start: 6, query_end: 7 }
    }
}

/// Controller settings.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Number of accepted designs wanted.
    pub target: usize,
    /// Hard cap on rounds; exceeding it yields a partial result.
    pub max_rounds: usize,
    /// Consecutive tool-failure rounds tolerated before giving up.
    pub max_consecutive_failures: usize,
    /// Rounds executed concurrently per batch (1 = strictly sequential).
    pub parallel_rounds: usize,
    /// Directory that receives the per-round scratch directories.
    pub work_dir: PathBuf,
    /// Master seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl PipelineConfig {
    pub fn new(target: usize) -> Self {
        PipelineConfig {
            target,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            parallel_rounds: 1,
            work_dir: std::env::temp_dir(),
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(PipelineError::InvalidConfig("max_rounds must be at least 1".into()));
        }
        if self.max_consecutive_failures == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_consecutive_failures must be at least 1".into(),
            ));
        }
        if self.parallel_rounds == 0 {
            return Err(PipelineError::InvalidConfig("parallel_rounds must be at least 1".into()));
        }
        if !self.work_dir.is_dir() {
            return Err(PipelineError::InvalidConfig(format!(
                "work directory {:?} does not exist",
                self.work_dir
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_matches_outfmt_6() {
        let s = HitSchema::default();
        assert_eq!(s.min_fields(), 8);
    }

    #[test]
    fn explicit_executable_wins() {
        assert_eq!(resolve_executable(Some(" /opt/blastn "), "SHRNA_TEST_UNSET_VAR", "blastn"), "/opt/blastn");
        assert_eq!(resolve_executable(Some(""), "SHRNA_TEST_UNSET_VAR", "blastn"), "blastn");
        assert_eq!(resolve_executable(None, "SHRNA_TEST_UNSET_VAR", "blastn"), "blastn");
    }

    #[test]
    fn zero_caps_are_rejected() {
        let mut c = PipelineConfig::new(5);
        assert!(c.validate().is_ok());
        c.max_rounds = 0;
        assert!(matches!(c.validate(), Err(PipelineError::InvalidConfig(_))));
        c.max_rounds = 10;
        c.parallel_rounds = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn library_centre_is_midpoint() {
        assert_eq!(LIBRARY_DG_CENTRE, -30.5);
    }
}
