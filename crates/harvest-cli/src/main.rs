// Counts are displayed as floats for rates; values stay far below 2^52.
#![allow(clippy::cast_precision_loss)]

//! fb2-harvest CLI - FB2 archive extraction tool

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use harvest_archive::expand_patterns;
use harvest_cli::config::{resolve, FileConfig, Overrides};
use harvest_cli::progress::ArchiveProgress;
use harvest_pipeline::{Pipeline, PipelineConfig, RunSummary};
use std::path::PathBuf;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Check if verbose output is requested
    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fb2-harvest",
    about = "Extract Russian FB2 books from ZIP archives into NDJSON",
    long_about = "Extract Russian FB2 books from ZIP archives into newline-delimited JSON.\n\
                  \n\
                  Every entry of every matched archive is decoded (UTF-8 or Windows-1251),\n\
                  parsed, and checked. Accepted books go to --output, one JSON object per\n\
                  line; every other entry gets one line in --log. Non-fiction is randomly\n\
                  sampled; fiction is always kept.\n\
                  \n\
                  Defaults can be set via .fb2-harvest.toml configuration file.",
    version
)]
struct Args {
    /// Comma-separated glob patterns of ZIP archives
    #[arg(short = 'z', long, alias = "zip_files", value_name = "PATTERNS")]
    zip_files: Option<String>,

    /// NDJSON output file (overwritten)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Failure log file (overwritten)
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Maximum body length in characters [default: 50000]
    #[arg(short, long, alias = "truncate_to", value_name = "CHARS")]
    truncate_to: Option<usize>,

    /// Concurrent workers per archive [default: 8]
    #[arg(short = 'j', long, value_name = "N")]
    concurrency: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Probability of dropping a non-fiction book [default: 0.75]
    #[arg(long, value_name = "P")]
    discard_probability: Option<f64>,

    /// Genre prefix that marks fiction (repeatable; replaces the default list)
    #[arg(long = "fiction-prefix", value_name = "PREFIX", value_delimiter = ',')]
    fiction_prefixes: Vec<String>,

    /// Also log books dropped by sampling, as `sampled_out`
    #[arg(long)]
    audit_filtered: bool,

    /// Configuration file [default: ./.fb2-harvest.toml if present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            zip_files: self.zip_files.clone(),
            output: self.output.clone(),
            log: self.log.clone(),
            truncate_to: self.truncate_to,
            concurrency: self.concurrency,
            seed: self.seed,
            discard_probability: self.discard_probability,
            fiction_prefixes: self.fiction_prefixes.clone(),
            audit_filtered: self.audit_filtered,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    let file_config = FileConfig::discover(args.config.as_deref())?;
    let resolved = resolve(args.overrides(), file_config)?;

    let archives = expand_patterns(&resolved.zip_files)
        .with_context(|| format!("Invalid archive pattern list: {}", resolved.zip_files))?;

    if archives.is_empty() {
        if verbosity.should_show_output() {
            eprintln!(
                "{} No archives matched: {}",
                "Warning:".yellow().bold(),
                resolved.zip_files
            );
        }
    } else if verbosity.should_show_output() {
        eprintln!("Processing {} archives", archives.len());
        if verbosity.is_verbose() {
            for path in &archives {
                eprintln!("  {}", path.display());
            }
        }
    }

    let progress = if verbosity.should_show_output() {
        ArchiveProgress::new().context("Failed to build progress bar")?
    } else {
        ArchiveProgress::hidden()
    };

    let pipeline = Pipeline::new(resolved.pipeline)?.with_observer(progress.clone());
    let summary = pipeline.run(&archives).context("Extraction run failed")?;
    progress.finish();

    if verbosity.should_show_output() {
        print_summary(&summary, pipeline.config(), verbosity);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, config: &PipelineConfig, verbosity: Verbosity) {
    eprintln!("\n{}", "=== Extraction Summary ===".bold());
    eprintln!(
        "{:<16} {}",
        "Archives:",
        summary.archives_total.to_string().cyan()
    );
    if summary.archives_failed > 0 {
        eprintln!(
            "{:<16} {}",
            "Unreadable:",
            summary.archives_failed.to_string().red()
        );
    }
    eprintln!("{:<16} {}", "Entries:", summary.entries_finished().to_string().cyan());
    eprintln!("{:<16} {}", "Accepted:", summary.accepted.to_string().green());
    eprintln!("{:<16} {}", "Filtered:", summary.filtered.to_string().yellow());
    eprintln!(
        "{:<16} {}",
        "Not Russian:",
        summary.expected_rejections().to_string().normal()
    );
    let defects = summary.defects();
    eprintln!(
        "{:<16} {}",
        "Failed:",
        if defects > 0 {
            defects.to_string().red()
        } else {
            defects.to_string().normal()
        }
    );
    if verbosity.is_verbose() {
        for (kind, count) in &summary.rejected {
            eprintln!("  {:<20} {count}", kind.as_str());
        }
    }
    if summary.failure_log_dropped > 0 {
        eprintln!(
            "{:<16} {}",
            "Log lines lost:",
            summary.failure_log_dropped.to_string().red()
        );
    }
    eprintln!("{:<16} {:.2}s", "Total time:", summary.elapsed.as_secs_f64());
    let entries = summary.entries_finished();
    if entries > 0 {
        eprintln!(
            "{:<16} {:.0} entries/s",
            "Throughput:",
            entries as f64 / summary.elapsed.as_secs_f64().max(f64::EPSILON)
        );
    }
    eprintln!("{:<16} {}", "Workers:", config.concurrency.to_string().cyan());
    eprintln!("{:<16} {}", "Output:", config.output_path.display());
    eprintln!("{:<16} {}", "Failure log:", config.failure_log_path.display());
    if summary.cancelled {
        eprintln!("{}", "Run was cancelled before all entries were submitted".yellow());
    }
}
