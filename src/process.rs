//! Running external command-line tools.
//!
//! The pipeline only ever talks to the design tool and the aligner through
//! [`ExternalProcess`], so tests can substitute an in-process fake and exercise every
//! failure path without either tool installed.
use std::io::ErrorKind;
use std::process::Command;

use log::debug;

use crate::error::{PipelineError, Result};

/// What a finished invocation reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub success: bool,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn ok() -> Self {
        ProcessOutcome { status: Some(0), success: true, stderr: String::new() }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        ProcessOutcome { status: Some(status), success: false, stderr: stderr.into() }
    }
}

/// Capability to run a program to completion, blocking the caller.
pub trait ExternalProcess: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutcome>;
}

/// Runs programs on the host with `std::process::Command`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProcess;

impl ExternalProcess for SystemProcess {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutcome> {
        debug!("exec: {} {}", program, args.join(" "));
        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PipelineError::ToolNotFound { executable: program.to_string() }
            } else {
                PipelineError::ExternalToolFailure {
                    tool: program.to_string(),
                    status: None,
                    detail: format!("could not start: {e}"),
                }
            }
        })?;
        Ok(ProcessOutcome {
            status: output.status.code(),
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Turn a non-success outcome into [`PipelineError::ExternalToolFailure`].
pub fn require_success(tool: &str, outcome: &ProcessOutcome) -> Result<()> {
    if outcome.success {
        return Ok(());
    }
    Err(PipelineError::ExternalToolFailure {
        tool: tool.to_string(),
        status: outcome.status,
        detail: if outcome.stderr.is_empty() { "non-zero exit".to_string() } else { outcome.stderr.clone() },
    })
}
