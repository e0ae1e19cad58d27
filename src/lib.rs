#![forbid(unsafe_code)]
//! # shrna-design
//!
//! Design of **non-targeting shRNA random controls** for a knock-down library, plus
//! assembly of the library itself with cloning primers.
//!
//! Controls are produced in rounds: a transcript is drawn from the seed pool and
//! scrambled, hairpins are designed against the scramble with an external designer,
//! efficient hairpins are aligned against a transcript database and any hairpin with a
//! near-perfect full-guide match is dropped. Survivors that are new by antisense sequence
//! are accepted until the requested number is reached.
//!
//! ## Highlights
//! - 🔁 **Bounded**: a round cap turns a run that stops finding controls into a partial
//!   result instead of an endless loop.
//! - 🧹 **Scoped scratch files**: every round owns its temporary directory and releases it
//!   on all exit paths.
//! - 🎲 **Reproducible**: every random draw comes from an injected, seedable RNG.
//! - 🧪 **Tool-free testing**: designer, aligner and process runner are traits.
//!
//! ## Examples
//! ```no_run
//! use shrna_design::{config::*, design::SelectorDesigner, pipeline::Controller, seqio, specificity::BlastScreen};
//!
//! let pool = seqio::load_transcripts("transcripts/", None).unwrap();
//! let designer = SelectorDesigner::new(DEFAULT_DESIGNER_BIN, DgWindow::default());
//! let screen = BlastScreen::new(DEFAULT_BLASTN_BIN, "refseq_rna", OffTargetPolicy::default());
//! let mut config = PipelineConfig::new(50);
//! config.seed = Some(7);
//! let outcome = Controller::new(config, designer, screen).run_seeded(&pool).unwrap();
//! println!("{} controls", outcome.designs().len());
//! ```

pub mod artifacts;
pub mod config;
pub mod constructs;
pub mod dedup;
pub mod design;
pub mod error;
pub mod filter;
pub mod library;
pub mod output;
pub mod permute;
pub mod pipeline;
pub mod process;
pub mod seqio;
pub mod specificity;

pub use design::CandidateDesign;
pub use error::{PipelineError, Result};
pub use pipeline::{Controller, PipelineOutcome};
pub use seqio::TranscriptSequence;
pub use specificity::AlignmentHit;

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
