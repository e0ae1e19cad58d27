//! Hairpin design: the design-tool adapter and its result table.
//!
//! The design tool reads a single-record FASTA file and writes a tab-delimited table, one
//! row per candidate hairpin:
//!
//! ```text
//! label  sense  antisense  dG  ddG  [...]  efficiency
//! ```
//!
//! The trailing field is the efficiency label; only the literal `efficient` counts.
//! An optional header row (`sense`/`antisense` in the sequence columns) is skipped.
use std::path::Path;

use log::debug;

use crate::artifacts::RoundArtifacts;
use crate::config::{DgWindow, DESIGN_INPUT_HEADER, EFFICIENT_LABEL};
use crate::error::{PipelineError, Result};
use crate::process::{require_success, ExternalProcess, SystemProcess};
use crate::seqio::write_fasta;

/// One hairpin proposed by the design tool.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateDesign {
    /// Transcript (or scramble source) the hairpin was designed against.
    pub source_id: String,
    pub sense: String,
    pub antisense: String,
    pub dg: f64,
    pub ddg: f64,
    pub efficient: bool,
}

const MIN_DESIGN_FIELDS: usize = 6;

fn is_header(fields: &csv::StringRecord) -> bool {
    let f = |i: usize| fields.get(i).map(|s| s.trim().to_ascii_lowercase());
    f(1).as_deref() == Some("sense") && f(2).as_deref() == Some("antisense")
}

pub(crate) fn parse_f64(path: &Path, line: usize, name: &str, raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| PipelineError::parse(path, line, format!("{name} {raw:?} is not a number")))?;
    if !value.is_finite() {
        return Err(PipelineError::parse(path, line, format!("{name} {raw:?} is not finite")));
    }
    Ok(value)
}

/// Read a design-tool table, tagging every row with `source_id`.
///
/// Rows shorter than six fields or with non-numeric or non-finite free energies are
/// rejected as
/// [`PipelineError::Parse`]; nothing is coerced.
pub fn parse_design_table(path: &Path, source_id: &str) -> Result<Vec<CandidateDesign>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)?;

    let mut out = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let rec = record?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if idx == 0 && is_header(&rec) {
            continue;
        }
        if rec.len() < MIN_DESIGN_FIELDS {
            return Err(PipelineError::parse(
                path,
                line,
                format!("expected at least {MIN_DESIGN_FIELDS} fields, found {}", rec.len()),
            ));
        }
        let sense = rec[1].trim();
        let antisense = rec[2].trim();
        if sense.is_empty() || antisense.is_empty() {
            return Err(PipelineError::parse(path, line, "empty sense/antisense sequence"));
        }
        let label = rec.get(rec.len() - 1).unwrap_or("").trim();
        out.push(CandidateDesign {
            source_id: source_id.to_string(),
            sense: sense.to_string(),
            antisense: antisense.to_string(),
            dg: parse_f64(path, line, "dG", &rec[3])?,
            ddg: parse_f64(path, line, "ddG", &rec[4])?,
            efficient: label == EFFICIENT_LABEL,
        });
    }
    Ok(out)
}

/// Anything that turns one candidate sequence into hairpin designs.
pub trait HairpinDesigner: Send + Sync {
    /// Design hairpins against `candidate`, using the round's scratch files.
    fn design(&self, source_id: &str, candidate: &str, artifacts: &RoundArtifacts) -> Result<Vec<CandidateDesign>>;
}

/// Adapter for the `si_shRNA_selector` command-line designer.
#[derive(Clone, Debug)]
pub struct SelectorDesigner<P = SystemProcess> {
    process: P,
    executable: String,
    window: DgWindow,
}

impl SelectorDesigner<SystemProcess> {
    pub fn new(executable: impl Into<String>, window: DgWindow) -> Self {
        SelectorDesigner::with_process(SystemProcess, executable, window)
    }
}

impl<P: ExternalProcess> SelectorDesigner<P> {
    pub fn with_process(process: P, executable: impl Into<String>, window: DgWindow) -> Self {
        SelectorDesigner { process, executable: executable.into(), window }
    }

    /// Command-line arguments for one invocation.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-dGmin".to_string(),
            self.window.min.to_string(),
            "-dGmax".to_string(),
            self.window.max.to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ]
    }
}

impl<P: ExternalProcess> HairpinDesigner for SelectorDesigner<P> {
    fn design(&self, source_id: &str, candidate: &str, artifacts: &RoundArtifacts) -> Result<Vec<CandidateDesign>> {
        let input = artifacts.design_input();
        let output = artifacts.design_output();
        write_fasta(&input, [(DESIGN_INPUT_HEADER, candidate.as_bytes())])?;

        let outcome = self.process.run(&self.executable, &self.args(&input, &output))?;
        require_success(&self.executable, &outcome)?;
        if !output.is_file() {
            return Err(PipelineError::ExternalToolFailure {
                tool: self.executable.clone(),
                status: outcome.status,
                detail: format!("expected output {:?} was not written", output),
            });
        }

        let designs = parse_design_table(&output, source_id)?;
        debug!("round {}: {} designs from {}", artifacts.round(), designs.len(), self.executable);
        Ok(designs)
    }
}
