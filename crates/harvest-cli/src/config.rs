//! Configuration file loading and flag merging
//!
//! Configuration files can be given with `--config` or placed in the
//! working directory as `.fb2-harvest.toml`:
//!
//! ```toml
//! [pipeline]
//! zip_files = "library/fb2-*.zip"
//! output = "books.ndjson"
//! log = "failures.log"
//! truncate_to = 50000
//! concurrency = 8
//! seed = 42
//! discard_probability = 0.75
//! fiction_prefixes = ["sf", "litrpg", "popadanec"]
//! audit_filtered = false
//! ```
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Built-in defaults

use anyhow::{Context, Result};
use harvest_pipeline::{GenrePrefixSet, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is absent.
pub const PROJECT_CONFIG: &str = ".fb2-harvest.toml";

/// Configuration file structure for `.fb2-harvest.toml`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineSection>,
}

/// The `[pipeline]` table. Every key is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    /// Comma-separated archive glob patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_files: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate_to: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard_probability: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiction_prefixes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_filtered: Option<bool>,
}

impl FileConfig {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this structure.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `explicit` if given, otherwise `./.fb2-harvest.toml` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be loaded.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let project = Path::new(PROJECT_CONFIG);
        if project.is_file() {
            log::info!("Using {}", project.display());
            Self::load_from_file(project)
        } else {
            Ok(Self::default())
        }
    }
}

/// Values given on the command line; `None` means the flag was absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub zip_files: Option<String>,
    pub output: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub truncate_to: Option<usize>,
    pub concurrency: Option<usize>,
    pub seed: Option<u64>,
    pub discard_probability: Option<f64>,
    pub fiction_prefixes: Vec<String>,
    pub audit_filtered: bool,
}

/// Fully merged settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub zip_files: String,
    pub pipeline: PipelineConfig,
}

/// Merge flags over the configuration file over built-in defaults.
///
/// # Errors
///
/// Returns an error if a required value is missing from both sources or the
/// merged configuration is invalid.
pub fn resolve(cli: Overrides, file: FileConfig) -> Result<Resolved> {
    let section = file.pipeline.unwrap_or_default();

    let zip_files = cli
        .zip_files
        .or(section.zip_files)
        .context("No archives given: pass --zip-files or set pipeline.zip_files")?;
    let output = cli
        .output
        .or(section.output)
        .context("No output file given: pass --output or set pipeline.output")?;
    let log = cli
        .log
        .or(section.log)
        .context("No failure log given: pass --log or set pipeline.log")?;

    let mut pipeline = PipelineConfig::new(output, log);
    if let Some(truncate_to) = cli.truncate_to.or(section.truncate_to) {
        pipeline.truncate_to = truncate_to;
    }
    if let Some(concurrency) = cli.concurrency.or(section.concurrency) {
        pipeline.concurrency = concurrency;
    }
    if let Some(probability) = cli.discard_probability.or(section.discard_probability) {
        pipeline.discard_probability = probability;
    }
    pipeline.seed = cli.seed.or(section.seed);
    pipeline.audit_filtered = cli.audit_filtered || section.audit_filtered.unwrap_or(false);

    if !cli.fiction_prefixes.is_empty() {
        pipeline.fiction_prefixes = GenrePrefixSet::new(&cli.fiction_prefixes);
    } else if let Some(prefixes) = section.fiction_prefixes {
        pipeline.fiction_prefixes = GenrePrefixSet::new(&prefixes);
    }
    if pipeline.fiction_prefixes.is_empty() {
        log::warn!("Fiction prefix list is empty; every book is subject to sampling");
    }

    pipeline.validate()?;

    Ok(Resolved {
        zip_files,
        pipeline,
    })
}
