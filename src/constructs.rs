//! Oligo templating for cloning hairpins into the expression vector.
//!
//! Both primers carry the sense arm, the loop (or its reverse complement) and the
//! antisense arm between fixed cloning overhangs:
//!
//! ```text
//! forward: CTAGC      + sense + GTTAATATTCATAGC + antisense + TTTTTG
//! reverse: AATTCAAAAA + sense + GCTATGAATATTAAC + antisense
//! ```
//!
//! Arms are upper-cased and written in DNA letters.
use bio::alphabets::dna::revcomp;

use crate::design::CandidateDesign;
use crate::seqio::rna_to_dna;

pub const HAIRPIN_LOOP: &str = "GTTAATATTCATAGC";
pub const FORWARD_PREFIX: &str = "CTAGC";
pub const FORWARD_SUFFIX: &str = "TTTTTG";
pub const REVERSE_PREFIX: &str = "AATTCAAAAA";

/// Forward and reverse cloning oligos for one hairpin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Construct {
    pub forward: String,
    pub reverse: String,
}

/// Reverse complement of [`HAIRPIN_LOOP`].
pub fn loop_revcomp() -> String {
    String::from_utf8_lossy(&revcomp(HAIRPIN_LOOP.as_bytes())).into_owned()
}

/// Template both cloning oligos for `design`.
pub fn construct_for(design: &CandidateDesign) -> Construct {
    let sense = rna_to_dna(&design.sense);
    let antisense = rna_to_dna(&design.antisense);
    Construct {
        forward: format!("{FORWARD_PREFIX}{sense}{HAIRPIN_LOOP}{antisense}{FORWARD_SUFFIX}"),
        reverse: format!("{REVERSE_PREFIX}{sense}{}{antisense}", loop_revcomp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_reverse_complement() {
        assert_eq!(loop_revcomp(), "GCTATGAATATTAAC");
    }

    #[test]
    fn primers_wrap_both_arms() {
        let d = CandidateDesign {
            source_id: "g".into(),
            sense: "gcaauu".into(),
            antisense: "AAUUGC".into(),
            dg: -30.0,
            ddg: 2.0,
            efficient: true,
        };
        let c = construct_for(&d);
        assert_eq!(c.forward, "CTAGCGCAATTGTTAATATTCATAGCAATTGCTTTTTG");
        assert_eq!(c.reverse, "AATTCAAAAAGCAATTGCTATGAATATTAACAATTGC");
    }
}
