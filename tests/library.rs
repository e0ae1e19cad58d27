use shrna_design::config::{CONTROL_PREFIX, LIBRARY_DG_CENTRE};
use shrna_design::{library, output, CandidateDesign};

fn control(antisense: &str, efficient: bool) -> CandidateDesign {
    CandidateDesign {
        source_id: "SLC2A1".into(),
        sense: "GCAUUACGAUCGAUCGAUA".into(),
        antisense: antisense.into(),
        dg: -30.0,
        ddg: 2.0,
        efficient,
    }
}

#[test]
fn controls_and_gene_tables_assemble_into_one_library() {
    let dir = tempfile::tempdir().unwrap();
    let targets = dir.path().join("targets");
    std::fs::create_dir(&targets).unwrap();
    std::fs::write(
        targets.join("ABCB1_shRNA_designs.txt"),
        "\tsense\tantisense\tdG\tddG\tefficiency\n\
         1\tGCAUUACGAUCGAUCGAUA\tUAUCGAUCGAUCGUAAUGC\t-33.0\t2.5\tefficient\n\
         2\tGGAUUACGAUCGAUCGAUA\tUAUCGAUCGAUCGUAAUCC\t-30.4\t2.1\tefficient\n\
         3\tCCAUUACGAUCGAUCGAUA\tUAUCGAUCGAUCGUAAUGG\t-30.6\t4.0\t\n",
    )
    .unwrap();

    let controls_path = dir.path().join("controls.tsv");
    output::write_controls(&controls_path, &[control("AAAUUU", true), control("CCCGGG", false)], CONTROL_PREFIX).unwrap();

    let genes = library::load_gene_designs(&targets).unwrap();
    let controls = output::read_controls(&controls_path).unwrap();
    let entries = library::assemble(genes, controls, 2, LIBRARY_DG_CENTRE);

    let rows: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.design.antisense.as_str())).collect();
    assert_eq!(
        rows,
        [
            ("ABCB1", "UAUCGAUCGAUCGUAAUCC"),
            ("ABCB1", "UAUCGAUCGAUCGUAAUGC"),
            ("random_0", "AAAUUU"),
        ]
    );

    let lib_path = dir.path().join("library.tsv");
    output::write_library(&lib_path, &entries).unwrap();
    let text = std::fs::read_to_string(&lib_path).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().last().unwrap().starts_with("random_0\t"));
}
