//! Accumulation of accepted designs, unique by antisense sequence.
use std::collections::HashSet;

use crate::design::CandidateDesign;

/// Split `candidates` into the ones whose antisense is new, returning them together with
/// the updated key set. Within one batch the first occurrence of a sequence wins.
pub fn admit(candidates: Vec<CandidateDesign>, already_accepted: HashSet<String>) -> (Vec<CandidateDesign>, HashSet<String>) {
    let mut seen = already_accepted;
    let fresh = candidates
        .into_iter()
        .filter(|d| seen.insert(d.antisense.clone()))
        .collect();
    (fresh, seen)
}

/// Ordered set of accepted designs, earliest first; no two share an antisense sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcceptedDesignSet {
    designs: Vec<CandidateDesign>,
    keys: HashSet<String>,
}

impl AcceptedDesignSet {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.designs.len() }

    pub fn is_empty(&self) -> bool { self.designs.is_empty() }

    pub fn designs(&self) -> &[CandidateDesign] { &self.designs }

    pub fn contains(&self, antisense: &str) -> bool { self.keys.contains(antisense) }

    /// Admit the novel part of `candidates`, appending it in order.
    /// Returns the updated set and how many designs were added.
    pub fn absorb(self, candidates: Vec<CandidateDesign>) -> (Self, usize) {
        let AcceptedDesignSet { mut designs, keys } = self;
        let (fresh, keys) = admit(candidates, keys);
        let added = fresh.len();
        designs.extend(fresh);
        (AcceptedDesignSet { designs, keys }, added)
    }

    /// Keep only the `n` earliest designs.
    pub fn truncate(self, n: usize) -> Self {
        let AcceptedDesignSet { mut designs, mut keys } = self;
        for d in designs.iter().skip(n) {
            keys.remove(&d.antisense);
        }
        designs.truncate(n);
        AcceptedDesignSet { designs, keys }
    }

    pub fn into_designs(self) -> Vec<CandidateDesign> { self.designs }
}
