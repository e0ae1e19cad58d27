//! Tab-delimited result tables.
//!
//! Control designs are written as
//! `name  source  sense  antisense  dG  ddG  efficiency`
//! and library tables add the gene name and both cloning primers.
use std::path::Path;

use crate::config::EFFICIENT_LABEL;
use crate::constructs::construct_for;
use crate::design::{parse_f64, CandidateDesign};
use crate::error::{PipelineError, Result};
use crate::library::LibraryEntry;

const CONTROL_HEADER: [&str; 7] = ["name", "source", "sense", "antisense", "dG", "ddG", "efficiency"];
const LIBRARY_HEADER: [&str; 8] =
    ["gene", "sense", "antisense", "dG", "ddG", "efficiency", "forward_primer", "reverse_primer"];

fn label(d: &CandidateDesign) -> &'static str {
    if d.efficient { EFFICIENT_LABEL } else { "" }
}

fn tsv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

/// Write accepted controls, named `<prefix>_<i>` in acceptance order.
pub fn write_controls(path: &Path, designs: &[CandidateDesign], prefix: &str) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(CONTROL_HEADER)?;
    for (i, d) in designs.iter().enumerate() {
        w.write_record([
            format!("{prefix}_{i}").as_str(),
            d.source_id.as_str(),
            d.sense.as_str(),
            d.antisense.as_str(),
            d.dg.to_string().as_str(),
            d.ddg.to_string().as_str(),
            label(d),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Read a controls table written by [`write_controls`].
pub fn read_controls(path: &Path) -> Result<Vec<CandidateDesign>> {
    let mut r = csv::ReaderBuilder::new().delimiter(b'\t').from_path(path)?;
    let headers = r.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::parse(path, 1, format!("missing column {name:?}")))
    };
    let (source, sense, antisense, dg, ddg, eff) =
        (col("source")?, col("sense")?, col("antisense")?, col("dG")?, col("ddG")?, col("efficiency")?);

    let mut out = Vec::new();
    for record in r.records() {
        let rec = record?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(0);
        let get = |i: usize| rec.get(i).map(str::trim).unwrap_or("");
        let num = |i: usize, name: &str| parse_f64(path, line, name, get(i));
        out.push(CandidateDesign {
            source_id: get(source).to_string(),
            sense: get(sense).to_string(),
            antisense: get(antisense).to_string(),
            dg: num(dg, "dG")?,
            ddg: num(ddg, "ddG")?,
            efficient: get(eff) == EFFICIENT_LABEL,
        });
    }
    Ok(out)
}

/// Write an assembled library with cloning primers.
pub fn write_library(path: &Path, entries: &[LibraryEntry]) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(LIBRARY_HEADER)?;
    for e in entries {
        let c = construct_for(&e.design);
        w.write_record([
            e.name.as_str(),
            e.design.sense.as_str(),
            e.design.antisense.as_str(),
            e.design.dg.to_string().as_str(),
            e.design.ddg.to_string().as_str(),
            label(&e.design),
            c.forward.as_str(),
            c.reverse.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
