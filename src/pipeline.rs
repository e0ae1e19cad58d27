//! The round-based control-design controller.
//!
//! Each round walks `SelectSeed -> Design -> Validate -> Accumulate -> CheckTarget`:
//!
//! 1. sample one transcript and scramble it ([`crate::permute`]);
//! 2. design hairpins against the scramble and keep the efficient ones;
//! 3. drop designs with a near-perfect, full-guide alignment to a real transcript;
//! 4. admit designs whose antisense sequence is new;
//! 5. stop once `target` designs are held (truncated to exactly `target`), or after
//!    `max_rounds` rounds with a partial result.
//!
//! Rounds 1-3 are [`Controller::run_round`]; they see no controller state and own their
//! scratch files, so a failing round cannot touch the accepted set. Steps 4-5 are
//! [`Controller::step`], a pure transition over [`PipelineState`].
//!
//! Every round draws from its own RNG, seeded from the master RNG in round order. With
//! `parallel_rounds > 1` a batch of rounds runs on a rayon pool and the batch is merged in
//! round order, which yields the same designs as the sequential run for the same seed.
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::artifacts::RoundArtifacts;
use crate::config::PipelineConfig;
use crate::dedup::AcceptedDesignSet;
use crate::design::{CandidateDesign, HairpinDesigner};
use crate::error::{PipelineError, Result};
use crate::filter::filter_efficient;
use crate::permute::permute;
use crate::seqio::TranscriptSequence;
use crate::specificity::SpecificityScreen;

/// How a run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineOutcome {
    /// Exactly `target` designs, earliest accepted first.
    Success(Vec<CandidateDesign>),
    /// Round cap reached first; whatever was accepted so far.
    Partial {
        designs: Vec<CandidateDesign>,
        rounds_exhausted: usize,
    },
}

impl PipelineOutcome {
    pub fn designs(&self) -> &[CandidateDesign] {
        match self {
            PipelineOutcome::Success(d) => d,
            PipelineOutcome::Partial { designs, .. } => designs,
        }
    }

    pub fn into_designs(self) -> Vec<CandidateDesign> {
        match self {
            PipelineOutcome::Success(d) => d,
            PipelineOutcome::Partial { designs, .. } => designs,
        }
    }

    pub fn is_complete(&self) -> bool { matches!(self, PipelineOutcome::Success(_)) }
}

/// What one round produced before accumulation.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundOutput {
    pub round: usize,
    pub seed_id: String,
    pub designed: usize,
    pub efficient: usize,
    pub specific: Vec<CandidateDesign>,
}

/// Controller state threaded through every transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineState {
    pub accepted: AcceptedDesignSet,
    pub rounds: usize,
    pub consecutive_failures: usize,
}

/// Result of one transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Continue(PipelineState),
    Finished(PipelineOutcome),
}

/// Drives design rounds with a hairpin designer `D` and a specificity screen `S`.
pub struct Controller<D, S> {
    config: PipelineConfig,
    designer: D,
    screen: S,
}

impl<D: HairpinDesigner, S: SpecificityScreen> Controller<D, S> {
    pub fn new(config: PipelineConfig, designer: D, screen: S) -> Self {
        Controller { config, designer, screen }
    }

    pub fn config(&self) -> &PipelineConfig { &self.config }

    pub fn designer(&self) -> &D { &self.designer }

    fn design_and_screen(&self, seed_id: &str, candidate: &str, artifacts: &RoundArtifacts) -> Result<(usize, usize, Vec<CandidateDesign>)> {
        let designs = self.designer.design(seed_id, candidate, artifacts)?;
        let designed = designs.len();
        let efficient = filter_efficient(designs);
        let n_efficient = efficient.len();
        let specific = self.screen.validate(efficient, artifacts)?;
        Ok((designed, n_efficient, specific))
    }

    /// SelectSeed, Design and Validate for one round.
    ///
    /// Scratch files are removed before this returns, whatever the result.
    pub fn run_round(&self, round: usize, pool: &[TranscriptSequence], seed: u64) -> Result<RoundOutput> {
        let mut rng = StdRng::seed_from_u64(seed);
        let source = pool.choose(&mut rng).ok_or(PipelineError::EmptyPool)?;
        let candidate = permute(&source.bases, &mut rng);

        let artifacts = RoundArtifacts::acquire(&self.config.work_dir, round)?;
        let result = self.design_and_screen(&source.id, &candidate, &artifacts);
        let released = artifacts.release();
        let (designed, efficient, specific) = result?;
        released?;

        Ok(RoundOutput { round, seed_id: source.id.clone(), designed, efficient, specific })
    }

    /// Accumulate and CheckTarget: fold one round result into `state`.
    ///
    /// Tool failures leave the accepted set untouched and are tolerated up to
    /// `max_consecutive_failures` in a row; any other error is returned as is.
    pub fn step(&self, state: PipelineState, round: Result<RoundOutput>) -> Result<Step> {
        let PipelineState { accepted, rounds, consecutive_failures } = state;
        let rounds = rounds + 1;

        let (accepted, consecutive_failures) = match round {
            Ok(out) => {
                let n_specific = out.specific.len();
                let (accepted, added) = accepted.absorb(out.specific);
                info!(
                    "round {}: seed {} -> {} designs, {} efficient, {} specific, {} new ({}/{})",
                    out.round,
                    out.seed_id,
                    out.designed,
                    out.efficient,
                    n_specific,
                    added,
                    accepted.len().min(self.config.target),
                    self.config.target
                );
                (accepted, 0)
            }
            Err(e) if e.is_round_retryable() => {
                let failures = consecutive_failures + 1;
                if failures >= self.config.max_consecutive_failures {
                    return Err(PipelineError::RepeatedToolFailure { attempts: failures, last: Box::new(e) });
                }
                warn!("round {rounds} failed ({failures}/{}): {e}", self.config.max_consecutive_failures);
                (accepted, failures)
            }
            Err(e) => return Err(e),
        };

        if accepted.len() >= self.config.target {
            let designs = accepted.truncate(self.config.target).into_designs();
            info!("reached {} designs after {rounds} rounds", designs.len());
            return Ok(Step::Finished(PipelineOutcome::Success(designs)));
        }
        if rounds >= self.config.max_rounds {
            warn!(
                "round cap {} reached with {}/{} designs",
                self.config.max_rounds,
                accepted.len(),
                self.config.target
            );
            return Ok(Step::Finished(PipelineOutcome::Partial {
                designs: accepted.into_designs(),
                rounds_exhausted: rounds,
            }));
        }
        Ok(Step::Continue(PipelineState { accepted, rounds, consecutive_failures }))
    }

    /// Drive rounds until the target or the round cap is reached.
    pub fn run<R: Rng + ?Sized>(&self, pool: &[TranscriptSequence], rng: &mut R) -> Result<PipelineOutcome> {
        self.config.validate()?;
        if pool.is_empty() {
            return Err(PipelineError::EmptyPool);
        }
        if self.config.target == 0 {
            return Ok(PipelineOutcome::Success(Vec::new()));
        }

        let workers = match self.config.parallel_rounds {
            1 => None,
            n => Some(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?,
            ),
        };

        let mut state = PipelineState::default();
        loop {
            let batch = self.config.parallel_rounds.min(self.config.max_rounds - state.rounds);
            let seeds: Vec<(usize, u64)> = (1..=batch).map(|i| (state.rounds + i, rng.gen())).collect();
            let results: Vec<Result<RoundOutput>> = match &workers {
                Some(tp) => tp.install(|| seeds.par_iter().map(|&(r, s)| self.run_round(r, pool, s)).collect()),
                None => seeds.iter().map(|&(r, s)| self.run_round(r, pool, s)).collect(),
            };
            for result in results {
                match self.step(state, result)? {
                    Step::Continue(next) => state = next,
                    Step::Finished(outcome) => return Ok(outcome),
                }
            }
        }
    }

    /// [`Controller::run`] with the RNG seeded from `config.seed` (or the OS).
    pub fn run_seeded(&self, pool: &[TranscriptSequence]) -> Result<PipelineOutcome> {
        let mut rng = match self.config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        self.run(pool, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    struct Never;
    impl HairpinDesigner for Never {
        fn design(&self, _: &str, _: &str, _: &RoundArtifacts) -> Result<Vec<CandidateDesign>> {
            Ok(Vec::new())
        }
    }
    impl SpecificityScreen for Never {
        fn validate(&self, d: Vec<CandidateDesign>, _: &RoundArtifacts) -> Result<Vec<CandidateDesign>> {
            Ok(d)
        }
    }

    fn d(antisense: &str) -> CandidateDesign {
        CandidateDesign {
            source_id: "t".into(),
            sense: String::new(),
            antisense: antisense.into(),
            dg: -30.0,
            ddg: 2.0,
            efficient: true,
        }
    }

    fn controller(target: usize, max_rounds: usize) -> Controller<Never, Never> {
        let mut c = PipelineConfig::new(target);
        c.max_rounds = max_rounds;
        Controller::new(c, Never, Never)
    }

    fn out(round: usize, specific: Vec<CandidateDesign>) -> Result<RoundOutput> {
        Ok(RoundOutput { round, seed_id: "T".into(), designed: specific.len(), efficient: specific.len(), specific })
    }

    #[test]
    fn step_truncates_to_target_in_round_order() {
        let c = controller(3, 10);
        let Step::Continue(s) = c.step(PipelineState::default(), out(1, vec![d("A")])).unwrap() else {
            panic!("should continue")
        };
        match c.step(s, out(2, vec![d("B"), d("C"), d("D")])).unwrap() {
            Step::Finished(PipelineOutcome::Success(v)) => {
                let names: Vec<_> = v.iter().map(|x| x.antisense.as_str()).collect();
                assert_eq!(names, ["A", "B", "C"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tool_failure_leaves_accepted_set_alone() {
        let c = controller(5, 10);
        let Step::Continue(before) = c.step(PipelineState::default(), out(1, vec![d("A")])).unwrap() else {
            panic!()
        };
        let failure = Err(PipelineError::ExternalToolFailure { tool: "x".into(), status: Some(1), detail: String::new() });
        let Step::Continue(after) = c.step(before.clone(), failure).unwrap() else { panic!() };
        assert_eq!(after.accepted, before.accepted);
        assert_eq!(after.consecutive_failures, 1);
        assert_eq!(after.rounds, 2);
    }

    #[test]
    fn parse_errors_surface_immediately() {
        let c = controller(5, 10);
        let r = c.step(PipelineState::default(), Err(PipelineError::parse(Path::new("f"), 1, "bad")));
        assert!(matches!(r, Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn consecutive_failures_are_bounded() {
        let c = controller(5, 100);
        let fail = || Err(PipelineError::ToolNotFound { executable: "blastn".into() });
        let mut state = PipelineState::default();
        for _ in 0..2 {
            match c.step(state, fail()).unwrap() {
                Step::Continue(s) => state = s,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(matches!(c.step(state, fail()), Err(PipelineError::RepeatedToolFailure { attempts: 3, .. })));
    }

    #[test]
    fn zero_target_needs_no_rounds() {
        let work = tempfile::tempdir().unwrap();
        let mut c = controller(0, 1);
        c.config.work_dir = work.path().to_path_buf();
        let pool = vec![TranscriptSequence { id: "T".into(), bases: "ACGT".into() }];
        let o = c.run(&pool, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(o, PipelineOutcome::Success(Vec::new()));
    }
}
