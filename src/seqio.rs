//! Transcript pool loading and FASTA writing.
//!
//! ### Design
//! - Transcript files are parsed with `needletail`; line breaks inside a record are dropped and
//!   all records of one file are concatenated, so a file yields exactly one sequence.
//! - The transcript identifier is the file-name prefix up to the first underscore
//!   (`SLC2A1_ENST00000426263.fa` -> `SLC2A1`).
//! - **Parallelism**: files are read on a local Rayon pool; `threads = None` uses all cores.
//! - Query/template files are written with `bio::io::fasta`.
//!
//! ### Example
//! ```no_run
//! use shrna_design::seqio;
//! let pool = seqio::load_transcripts("transcripts/", Some(4)).unwrap();
//! println!("loaded {} transcripts", pool.len());
//! ```
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use needletail::parse_fastx_file;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{PipelineError, Result};

/// One transcript of the seed pool. Never mutated after loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptSequence {
    pub id: String,
    pub bases: String,
}

/// Identifier for a transcript file: file-name prefix up to the first underscore.
pub fn transcript_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let id = name.split('_').next().unwrap_or(name);
    if id.is_empty() { None } else { Some(id.to_string()) }
}

fn read_transcript(path: &Path) -> Result<Option<TranscriptSequence>> {
    let Some(id) = transcript_id(path) else {
        warn!("skipping {:?}: cannot derive a transcript id", path);
        return Ok(None);
    };
    if std::fs::metadata(path)?.len() == 0 {
        warn!("skipping {:?}: empty file", path);
        return Ok(None);
    }

    let mut reader = parse_fastx_file(path)?;
    let mut bases = Vec::new();
    while let Some(record) = reader.next() {
        let rec = record?;
        bases.extend(rec.seq().iter().filter(|b| !b.is_ascii_whitespace()));
    }
    if bases.is_empty() {
        warn!("skipping {:?}: no sequence lines", path);
        return Ok(None);
    }

    let bases = String::from_utf8(bases)
        .map_err(|_| PipelineError::Sequence(format!("{:?} is not ASCII", path)))?;
    Ok(Some(TranscriptSequence { id, bases }))
}

/// Load every regular file in `dir` as one transcript.
///
/// The returned pool is sorted by identifier so that seeded sampling is reproducible
/// regardless of directory order. When two files share an identifier the one whose
/// path sorts first wins.
pub fn load_transcripts<P: AsRef<Path>>(dir: P, threads: Option<usize>) -> Result<Vec<TranscriptSequence>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let n = threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

    let loaded: Vec<Option<TranscriptSequence>> =
        pool.install(|| paths.par_iter().map(|p| read_transcript(p)).collect::<Result<_>>())?;

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(loaded.len());
    for t in loaded.into_iter().flatten() {
        if seen.insert(t.id.clone()) {
            out.push(t);
        } else {
            warn!("duplicate transcript id {}; keeping the first file", t.id);
        }
    }
    out.sort_by(|a, b| a.id.cmp(&b.id));
    debug!("loaded {} transcripts from {:?}", out.len(), dir.as_ref());

    if out.is_empty() {
        return Err(PipelineError::EmptyPool);
    }
    Ok(out)
}

/// Write `(id, sequence)` records as FASTA.
pub fn write_fasta<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = bio::io::fasta::Writer::to_file(path)?;
    for (id, seq) in records {
        writer.write(id, None, seq)?;
    }
    writer.flush()?;
    Ok(())
}

/// Translate RNA bases to DNA and upper-case (`acgu` -> `ACGT`).
pub fn rna_to_dna(seq: &str) -> String {
    seq.chars()
        .map(|c| match c.to_ascii_uppercase() {
            'U' => 'T',
            other => other,
        })
        .collect()
}
