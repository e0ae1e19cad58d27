//! Efficacy filter over design-tool output.
use crate::design::CandidateDesign;

/// Keep only designs the tool labelled efficient, in tool order.
pub fn filter_efficient(designs: Vec<CandidateDesign>) -> Vec<CandidateDesign> {
    designs.into_iter().filter(|d| d.efficient).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(antisense: &str, efficient: bool) -> CandidateDesign {
        CandidateDesign {
            source_id: "t".into(),
            sense: String::new(),
            antisense: antisense.into(),
            dg: -30.0,
            ddg: 2.0,
            efficient,
        }
    }

    #[test]
    fn keeps_efficient_in_order() {
        let out = filter_efficient(vec![d("A", true), d("B", false), d("C", true), d("D", false)]);
        let names: Vec<_> = out.iter().map(|x| x.antisense.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn nothing_efficient_is_empty() {
        assert!(filter_efficient(vec![d("A", false)]).is_empty());
        assert!(filter_efficient(Vec::new()).is_empty());
    }
}
