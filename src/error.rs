//! Error taxonomy for the design pipeline.
//!
//! Round-level failures fall in two families:
//! - **tool failures** ([`PipelineError::ExternalToolFailure`], [`PipelineError::ToolNotFound`]),
//!   which abort the current round and may be retried a bounded number of times;
//! - **parse failures** ([`PipelineError::Parse`]), which are surfaced immediately because a
//!   tool that writes malformed tables will keep doing so.
//!
//! Neither family ever mutates the accepted design set.
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Everything that can end a round or a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A tool exited non-zero or did not write its expected output.
    #[error("{tool} failed (status={status:?}): {detail}")]
    ExternalToolFailure {
        tool: String,
        status: Option<i32>,
        detail: String,
    },

    /// A tool executable could not be launched.
    #[error("could not find executable '{executable}'")]
    ToolNotFound { executable: String },

    /// A tool or input table held a row that could not be read.
    #[error("malformed {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// No transcripts were available to scramble.
    #[error("transcript pool is empty")]
    EmptyPool,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Too many rounds in a row ended in a tool failure.
    #[error("giving up after {attempts} consecutive failed rounds: {last}")]
    RepeatedToolFailure {
        attempts: usize,
        last: Box<PipelineError>,
    },

    /// A transcript file could not be read as FASTA/FASTQ.
    #[error("sequence file error: {0}")]
    Sequence(String),

    /// Table reader or writer failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Build a [`PipelineError::Parse`] for a 1-based line of `file`.
    pub fn parse(file: &Path, line: usize, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            file: file.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// `true` for failures that only doom the current round.
    pub fn is_round_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::ExternalToolFailure { .. } | PipelineError::ToolNotFound { .. }
        )
    }
}

impl From<needletail::errors::ParseError> for PipelineError {
    fn from(e: needletail::errors::ParseError) -> Self {
        PipelineError::Sequence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tool_failures_are_retryable() {
        let tool = PipelineError::ExternalToolFailure {
            tool: "blastn".into(),
            status: Some(1),
            detail: "boom".into(),
        };
        assert!(tool.is_round_retryable());
        assert!(PipelineError::ToolNotFound { executable: "x".into() }.is_round_retryable());
        assert!(!PipelineError::parse(Path::new("hits.tsv"), 3, "short row").is_round_retryable());
        assert!(!PipelineError::EmptyPool.is_round_retryable());
    }

    #[test]
    fn parse_error_names_file_and_line() {
        let e = PipelineError::parse(Path::new("design_out.txt"), 7, "dG is not a number");
        assert_eq!(e.to_string(), "malformed design_out.txt:7: dG is not a number");
    }
}
