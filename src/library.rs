//! Library assembly: the top hairpins per gene plus the random controls.
//!
//! Per gene, designs are ranked by closeness of `dG` to a centre value (ascending
//! `|dG - centre|`), ties broken by larger `ddG`, and the first `per_gene` are kept.
//! When a gene has at least `per_gene` efficient designs only those are ranked;
//! otherwise inefficient designs are allowed in to fill the quota.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::{CONTROL_PREFIX, GENE_DESIGNS_SUFFIX};
use crate::design::{parse_design_table, CandidateDesign};
use crate::error::Result;
use crate::seqio::transcript_id;

/// One row of the assembled library.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryEntry {
    /// Gene name, or `random_<i>` for controls.
    pub name: String,
    pub design: CandidateDesign,
}

/// Read every `*shRNA_designs.txt` table under `dir`, grouped by gene name.
pub fn load_gene_designs(dir: &Path) -> Result<BTreeMap<String, Vec<CandidateDesign>>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(GENE_DESIGNS_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut genes: BTreeMap<String, Vec<CandidateDesign>> = BTreeMap::new();
    for p in paths {
        let Some(gene) = transcript_id(&p) else {
            warn!("skipping {:?}: cannot derive a gene name", p);
            continue;
        };
        let designs = parse_design_table(&p, &gene)?;
        genes.entry(gene).or_default().extend(designs);
    }
    info!("loaded designs for {} genes from {:?}", genes.len(), dir);
    Ok(genes)
}

/// Rank one gene's designs and keep the best `per_gene`.
pub fn select_top(designs: Vec<CandidateDesign>, per_gene: usize, dg_centre: f64) -> Vec<CandidateDesign> {
    let n_efficient = designs.iter().filter(|d| d.efficient).count();
    let mut pool: Vec<CandidateDesign> = if n_efficient >= per_gene {
        designs.into_iter().filter(|d| d.efficient).collect()
    } else {
        designs
    };
    pool.sort_by(|a, b| {
        (a.dg - dg_centre)
            .abs()
            .total_cmp(&(b.dg - dg_centre).abs())
            .then_with(|| b.ddg.total_cmp(&a.ddg))
    });
    pool.truncate(per_gene);
    pool
}

/// Assemble genes (in name order) followed by the efficient controls.
pub fn assemble(
    genes: BTreeMap<String, Vec<CandidateDesign>>,
    controls: Vec<CandidateDesign>,
    per_gene: usize,
    dg_centre: f64,
) -> Vec<LibraryEntry> {
    let mut out = Vec::new();
    for (gene, designs) in genes {
        let top = select_top(designs, per_gene, dg_centre);
        if top.len() < per_gene {
            warn!("{gene}: only {} designs available (wanted {per_gene})", top.len());
        }
        out.extend(top.into_iter().map(|design| LibraryEntry { name: gene.clone(), design }));
    }
    out.extend(
        controls
            .into_iter()
            .filter(|d| d.efficient)
            .enumerate()
            .map(|(i, design)| LibraryEntry { name: format!("{CONTROL_PREFIX}_{i}"), design }),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LIBRARY_DG_CENTRE;

    fn d(antisense: &str, dg: f64, ddg: f64, efficient: bool) -> CandidateDesign {
        CandidateDesign {
            source_id: "g".into(),
            sense: String::new(),
            antisense: antisense.into(),
            dg,
            ddg,
            efficient,
        }
    }

    fn names(v: &[CandidateDesign]) -> Vec<&str> {
        v.iter().map(|x| x.antisense.as_str()).collect()
    }

    #[test]
    fn ranks_by_distance_then_ddg() {
        let designs = vec![
            d("far", -33.0, 5.0, true),
            d("near_low", -30.5, 1.0, true),
            d("near_high", -30.5, 3.0, true),
            d("mid", -29.5, 9.0, true),
        ];
        let top = select_top(designs, 3, LIBRARY_DG_CENTRE);
        assert_eq!(names(&top), ["near_high", "near_low", "mid"]);
    }

    #[test]
    fn inefficient_fill_in_only_when_short() {
        let designs = vec![d("a", -30.5, 1.0, false), d("b", -33.0, 1.0, true)];
        assert_eq!(names(&select_top(designs.clone(), 2, LIBRARY_DG_CENTRE)), ["a", "b"]);
        assert_eq!(names(&select_top(designs, 1, LIBRARY_DG_CENTRE)), ["b"]);
    }

    #[test]
    fn controls_follow_genes_and_are_numbered() {
        let mut genes = BTreeMap::new();
        genes.insert("ZZZ".to_string(), vec![d("z", -30.0, 1.0, true)]);
        genes.insert("AAA".to_string(), vec![d("a", -30.0, 1.0, true)]);
        let controls = vec![d("c0", -30.0, 1.0, true), d("cx", -30.0, 1.0, false), d("c1", -30.0, 1.0, true)];
        let lib = assemble(genes, controls, 25, LIBRARY_DG_CENTRE);
        let rows: Vec<_> = lib.iter().map(|e| (e.name.as_str(), e.design.antisense.as_str())).collect();
        assert_eq!(rows, [("AAA", "a"), ("ZZZ", "z"), ("random_0", "c0"), ("random_1", "c1")]);
    }

    #[test]
    fn loads_only_design_tables_grouped_by_gene() {
        let dir = tempfile::tempdir().unwrap();
        let row = "1\tGCA\tUGC\t-30\t2\tefficient\n";
        std::fs::write(dir.path().join("ABCB1_a_shRNA_designs.txt"), row).unwrap();
        std::fs::write(dir.path().join("ABCB1_b_shRNA_designs.txt"), row).unwrap();
        std::fs::write(dir.path().join("SLC2A1_shRNA_designs.txt"), row).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        let genes = load_gene_designs(dir.path()).unwrap();
        assert_eq!(genes.keys().collect::<Vec<_>>(), ["ABCB1", "SLC2A1"]);
        assert_eq!(genes["ABCB1"].len(), 2);
        assert_eq!(genes["SLC2A1"][0].source_id, "SLC2A1");
    }
}
