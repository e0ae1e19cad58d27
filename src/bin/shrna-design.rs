use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn, Level};
use simple_logger::init_with_level;

use shrna_design::config::{self, DgWindow, OffTargetPolicy, PipelineConfig};
use shrna_design::design::SelectorDesigner;
use shrna_design::pipeline::{Controller, PipelineOutcome};
use shrna_design::specificity::BlastScreen;
use shrna_design::{library, output, seqio};

/// shrna-design CLI
#[derive(Parser)]
#[command(name = "shrna-design")]
#[command(version)]
#[command(about = "shRNA random-control design and library assembly", long_about = None)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Log per-invocation detail
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Design scrambled, off-target-screened random controls
    Controls {
        /// Directory of transcript FASTA files (id = file-name prefix before '_')
        #[arg(long)]
        seqs: PathBuf,
        /// BLAST nucleotide database used for the off-target search
        #[arg(long)]
        db: String,
        /// Number of controls wanted
        #[arg(long)]
        target: usize,
        /// Output table (tab-delimited)
        #[arg(long)]
        output: PathBuf,
        /// Give up with a partial result after this many rounds
        #[arg(long, default_value_t = config::DEFAULT_MAX_ROUNDS)]
        max_rounds: usize,
        /// Consecutive failed rounds tolerated before aborting
        #[arg(long, default_value_t = config::DEFAULT_MAX_CONSECUTIVE_FAILURES)]
        max_failures: usize,
        /// Rounds run concurrently per batch (1 = sequential)
        #[arg(long, default_value_t = 1)]
        parallel_rounds: usize,
        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        /// Directory for per-round scratch files (default: system temp)
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Design tool executable (else $SHRNA_DESIGNER_BIN)
        #[arg(long)]
        designer: Option<String>,
        /// blastn executable (else $SHRNA_BLASTN_BIN)
        #[arg(long)]
        aligner: Option<String>,
        /// Lower free-energy bound passed to the designer
        #[arg(long, default_value_t = config::DEFAULT_DG_MIN, allow_negative_numbers = true)]
        dg_min: f64,
        /// Upper free-energy bound passed to the designer
        #[arg(long, default_value_t = config::DEFAULT_DG_MAX, allow_negative_numbers = true)]
        dg_max: f64,
        /// First query base an off-target hit must cover (1-based)
        #[arg(long, default_value_t = config::DEFAULT_GUIDE_START)]
        guide_start: u32,
        /// Last query base an off-target hit must cover (1-based, inclusive)
        #[arg(long, default_value_t = config::DEFAULT_GUIDE_END)]
        guide_end: u32,
        /// Most mismatches a hit may have and still count as off-target
        #[arg(long, default_value_t = config::DEFAULT_MISMATCH_THRESHOLD)]
        mismatches: u32,
        /// Threads for loading transcripts (0/None = all)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Assemble the knock-down library (top designs per gene + controls) with primers
    Library {
        /// Directory holding `<GENE>_*shRNA_designs.txt` tables
        #[arg(long)]
        targets: PathBuf,
        /// Controls table written by `controls`
        #[arg(long)]
        controls: Option<PathBuf>,
        /// Designs kept per gene
        #[arg(long, default_value_t = config::LIBRARY_PER_GENE)]
        per_gene: usize,
        /// dG value designs are ranked towards
        #[arg(long, default_value_t = config::LIBRARY_DG_CENTRE, allow_negative_numbers = true)]
        dg_centre: f64,
        /// Output table (tab-delimited)
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet { Level::Warn } else if cli.verbose { Level::Debug } else { Level::Info };
    if let Err(e) = init_with_level(level) {
        eprintln!("logger: {e}");
    }

    let start = std::time::Instant::now();
    let code = match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            1
        }
    };
    info!("Elapsed time: {:?}", start.elapsed());
    std::process::exit(code);
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Controls {
            seqs,
            db,
            target,
            output,
            max_rounds,
            max_failures,
            parallel_rounds,
            seed,
            work_dir,
            designer,
            aligner,
            dg_min,
            dg_max,
            guide_start,
            guide_end,
            mismatches,
            threads,
        } => {
            if dg_min > dg_max {
                anyhow::bail!("--dg-min ({dg_min}) must not exceed --dg-max ({dg_max})");
            }
            if guide_start > guide_end {
                anyhow::bail!("--guide-start ({guide_start}) must not exceed --guide-end ({guide_end})");
            }

            let threads = threads.filter(|t| *t > 0);
            let pool = seqio::load_transcripts(&seqs, threads)
                .with_context(|| format!("loading transcripts from {:?}", seqs))?;
            info!("controls: pool={} | target={} | db={} | output={}", pool.len(), target, db, output.display());

            let designer_bin = config::resolve_executable(designer.as_deref(), config::DESIGNER_ENV_BIN, config::DEFAULT_DESIGNER_BIN);
            let blastn_bin = config::resolve_executable(aligner.as_deref(), config::BLASTN_ENV_BIN, config::DEFAULT_BLASTN_BIN);
            let designer = SelectorDesigner::new(designer_bin, DgWindow { min: dg_min, max: dg_max });
            let policy = OffTargetPolicy { guide_start, guide_end, mismatch_threshold: mismatches };
            let screen = BlastScreen::new(blastn_bin, db, policy);

            let mut cfg = PipelineConfig::new(target);
            cfg.max_rounds = max_rounds;
            cfg.max_consecutive_failures = max_failures;
            cfg.parallel_rounds = parallel_rounds;
            cfg.seed = seed;
            if let Some(dir) = work_dir {
                cfg.work_dir = dir;
            }

            let outcome = Controller::new(cfg, designer, screen).run_seeded(&pool)?;
            output::write_controls(&output, outcome.designs(), config::CONTROL_PREFIX)
                .with_context(|| format!("writing {:?}", output))?;

            match outcome {
                PipelineOutcome::Success(d) => {
                    info!("wrote {} controls to {}", d.len(), output.display());
                    Ok(0)
                }
                PipelineOutcome::Partial { designs, rounds_exhausted } => {
                    warn!(
                        "only {}/{} controls after {} rounds; partial table written to {}",
                        designs.len(),
                        target,
                        rounds_exhausted,
                        output.display()
                    );
                    Ok(2)
                }
            }
        }

        Commands::Library { targets, controls, per_gene, dg_centre, output } => {
            let genes = library::load_gene_designs(&targets)
                .with_context(|| format!("reading gene designs from {:?}", targets))?;
            let controls = match controls {
                Some(p) => output::read_controls(&p).with_context(|| format!("reading controls {:?}", p))?,
                None => Vec::new(),
            };
            let entries = library::assemble(genes, controls, per_gene, dg_centre);
            output::write_library(&output, &entries).with_context(|| format!("writing {:?}", output))?;
            info!("wrote {} library rows to {}", entries.len(), output.display());
            Ok(0)
        }
    }
}
