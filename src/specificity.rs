//! Off-target screening of hairpin guides against a transcript database.
//!
//! Every efficient design becomes one record of a FASTA query (header = row index,
//! sequence = antisense strand in DNA letters). The query is aligned in short-sequence
//! mode and each tabular hit is read into an [`AlignmentHit`] through an explicit
//! [`HitSchema`]. A design is **off-target** when any hit covers exactly the guide region
//! with few enough mismatches (see [`OffTargetPolicy`]); partial-length or heavily
//! mismatched alignments are ignored.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;

use crate::artifacts::RoundArtifacts;
use crate::config::{HitSchema, OffTargetPolicy, BLASTN_OUTFMT, BLASTN_TASK};
use crate::design::CandidateDesign;
use crate::error::{PipelineError, Result};
use crate::process::{require_success, ExternalProcess, SystemProcess};
use crate::seqio::{rna_to_dna, write_fasta};

/// One alignment row, built only from a fully parsed line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentHit {
    pub query_id: String,
    pub subject_id: String,
    /// 1-based, inclusive.
    pub query_start: u32,
    /// 1-based, inclusive.
    pub query_end: u32,
    pub mismatches: u32,
    /// Line of the result table this hit was read from.
    pub line: usize,
}

impl OffTargetPolicy {
    pub fn is_off_target(&self, hit: &AlignmentHit) -> bool {
        hit.query_start == self.guide_start
            && hit.query_end == self.guide_end
            && hit.mismatches <= self.mismatch_threshold
    }
}

fn field<'r>(rec: &'r csv::StringRecord, idx: usize, name: &str, path: &Path, line: usize) -> Result<&'r str> {
    match rec.get(idx).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PipelineError::parse(path, line, format!("missing {name} (column {})", idx + 1))),
    }
}

fn number(rec: &csv::StringRecord, idx: usize, name: &str, path: &Path, line: usize) -> Result<u32> {
    let raw = field(rec, idx, name, path, line)?;
    raw.parse::<u32>()
        .map_err(|_| PipelineError::parse(path, line, format!("{name} {raw:?} is not a non-negative integer")))
}

/// Parse tabular aligner output with `schema`.
pub fn parse_hits(path: &Path, schema: &HitSchema) -> Result<Vec<AlignmentHit>> {
    // Comment lines come through as records so that every position is the hit's own line.
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)?;

    let mut hits = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let rec = record?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
        if rec.get(0).is_some_and(|f| f.starts_with('#')) {
            continue;
        }
        if rec.len() < schema.min_fields() {
            return Err(PipelineError::parse(
                path,
                line,
                format!("expected at least {} columns, found {}", schema.min_fields(), rec.len()),
            ));
        }
        hits.push(AlignmentHit {
            query_id: field(&rec, schema.query_id, "query id", path, line)?.to_string(),
            subject_id: field(&rec, schema.subject_id, "subject id", path, line)?.to_string(),
            query_start: number(&rec, schema.query_start, "query start", path, line)?,
            query_end: number(&rec, schema.query_end, "query end", path, line)?,
            mismatches: number(&rec, schema.mismatches, "mismatch count", path, line)?,
            line,
        });
    }
    Ok(hits)
}

/// Row indices of the query designs that have at least one disqualifying hit.
///
/// Query ids must be indices below `n_queries`; anything else means the result table does
/// not belong to this query and is reported as [`PipelineError::Parse`].
pub fn off_target_rows(hits: &[AlignmentHit], policy: &OffTargetPolicy, n_queries: usize, path: &Path) -> Result<BTreeSet<usize>> {
    let mut rows = BTreeSet::new();
    for hit in hits {
        let row = hit
            .query_id
            .parse::<usize>()
            .ok()
            .filter(|r| *r < n_queries)
            .ok_or_else(|| PipelineError::parse(path, hit.line, format!("unknown query id {:?}", hit.query_id)))?;
        if policy.is_off_target(hit) {
            rows.insert(row);
        }
    }
    Ok(rows)
}

/// Anything that can reduce a list of designs to its specific subset.
pub trait SpecificityScreen: Send + Sync {
    fn validate(&self, designs: Vec<CandidateDesign>, artifacts: &RoundArtifacts) -> Result<Vec<CandidateDesign>>;
}

/// `blastn -task blastn-short` screen against a BLAST nucleotide database.
#[derive(Clone, Debug)]
pub struct BlastScreen<P = SystemProcess> {
    process: P,
    executable: String,
    database: PathBuf,
    policy: OffTargetPolicy,
    schema: HitSchema,
}

impl BlastScreen<SystemProcess> {
    pub fn new(executable: impl Into<String>, database: impl Into<PathBuf>, policy: OffTargetPolicy) -> Self {
        BlastScreen::with_process(SystemProcess, executable, database, policy)
    }
}

impl<P: ExternalProcess> BlastScreen<P> {
    pub fn with_process(process: P, executable: impl Into<String>, database: impl Into<PathBuf>, policy: OffTargetPolicy) -> Self {
        BlastScreen {
            process,
            executable: executable.into(),
            database: database.into(),
            policy,
            schema: HitSchema::default(),
        }
    }

    /// Read a custom `-outfmt 6 ...` column layout.
    pub fn schema(mut self, schema: HitSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn args(&self, query: &Path, out: &Path) -> Vec<String> {
        vec![
            "-query".to_string(),
            query.display().to_string(),
            "-db".to_string(),
            self.database.display().to_string(),
            "-task".to_string(),
            BLASTN_TASK.to_string(),
            "-outfmt".to_string(),
            BLASTN_OUTFMT.to_string(),
            "-out".to_string(),
            out.display().to_string(),
        ]
    }
}

impl<P: ExternalProcess> SpecificityScreen for BlastScreen<P> {
    fn validate(&self, designs: Vec<CandidateDesign>, artifacts: &RoundArtifacts) -> Result<Vec<CandidateDesign>> {
        if designs.is_empty() {
            return Ok(designs);
        }

        let query = artifacts.align_query();
        let out = artifacts.align_result();
        let ids: Vec<String> = (0..designs.len()).map(|i| i.to_string()).collect();
        let seqs: Vec<String> = designs.iter().map(|d| rna_to_dna(&d.antisense)).collect();
        write_fasta(&query, ids.iter().map(String::as_str).zip(seqs.iter().map(|s| s.as_bytes())))?;

        let outcome = self.process.run(&self.executable, &self.args(&query, &out))?;
        require_success(&self.executable, &outcome)?;
        if !out.is_file() {
            return Err(PipelineError::ExternalToolFailure {
                tool: self.executable.clone(),
                status: outcome.status,
                detail: format!("expected output {:?} was not written", out),
            });
        }

        let hits = parse_hits(&out, &self.schema)?;
        let off = off_target_rows(&hits, &self.policy, designs.len(), &out)?;
        debug!(
            "round {}: {} hits, {}/{} designs off-target",
            artifacts.round(),
            hits.len(),
            off.len(),
            designs.len()
        );
        Ok(designs
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !off.contains(i))
            .map(|(_, d)| d)
            .collect())
    }
}
