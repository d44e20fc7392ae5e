//! Per-archive progress bar

use colored::Colorize;
use harvest_pipeline::ProgressObserver;
use indicatif::style::TemplateError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// One progress bar, reset for every archive.
#[derive(Debug, Clone)]
pub struct ArchiveProgress {
    bar: ProgressBar,
}

impl ArchiveProgress {
    /// # Errors
    ///
    /// Returns `TemplateError` if the bar template does not parse.
    pub fn new() -> Result<Self, TemplateError> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)?
                .progress_chars("█▓▒░  "),
        );
        Ok(Self { bar })
    }

    /// A bar that tracks counts but never draws (quiet mode).
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    #[must_use]
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl ProgressObserver for ArchiveProgress {
    fn archive_started(&self, path: &Path, entries: usize) {
        self.bar.reset();
        self.bar.set_length(entries as u64);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.bar.set_message(name);
    }

    fn entry_finished(&self, _path: &Path) {
        self.bar.inc(1);
    }

    fn archive_finished(&self, path: &Path) {
        self.bar
            .println(format!("{} {}", "✓".green(), path.display()));
    }
}
