//! Directory walking and the parallel per-file runner shared by every step.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::highlight::HighlightStats;
use crate::mask::FileMask;

pub(crate) fn default_true() -> bool {
    true
}

/// Which files a step visits and how it reacts to failures.
#[derive(Debug, Clone, Deserialize)]
pub struct WalkOptions {
    /// Directory to read files from.
    pub base_dir: PathBuf,
    /// File name mask; each step has its own default.
    #[serde(default)]
    pub file_mask: Option<String>,
    /// Descend into subdirectories.
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Fail the run on the first failing file instead of logging and continuing.
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
}

impl WalkOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            file_mask: None,
            recursive: true,
            fail_on_error: true,
        }
    }

    pub fn with_file_mask(mut self, mask: impl Into<String>) -> Self {
        self.file_mask = Some(mask.into());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    pub(crate) fn resolve_paths(&mut self, root: &Path) {
        self.base_dir = root.join(&self.base_dir);
    }
}

/// Check that `base_dir` exists and is a directory.
pub fn validate_base_dir(base_dir: &Path) -> Result<()> {
    if !base_dir.exists() {
        return Err(Error::MissingBaseDir(base_dir.to_path_buf()));
    }
    if !base_dir.is_dir() {
        return Err(Error::NotADirectory(base_dir.to_path_buf()));
    }
    Ok(())
}

/// Files under `walk.base_dir` whose name matches the mask, sorted by path.
pub fn collect_files(walk: &WalkOptions, default_mask: &str) -> Result<Vec<PathBuf>> {
    validate_base_dir(&walk.base_dir)?;
    let mask = FileMask::new(walk.file_mask.as_deref().unwrap_or(default_mask))?;

    let mut walker = WalkDir::new(&walk.base_dir).min_depth(1).sort_by_file_name();
    if !walk.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if !walk.fail_on_error => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(|name| mask.matches(name))
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `path` relative to `base`, or the file name alone if it is not below `base`.
pub(crate) fn relative_path(path: &Path, base: &Path) -> PathBuf {
    match path.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
    }
}

/// What processing one file produced.
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub bytes_input: u64,
    pub bytes_output: u64,
    pub highlight: HighlightStats,
}

/// Statistics from one step.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// Number of files processed successfully.
    pub files_processed: usize,
    /// Number of files that failed (only with `fail_on_error = false`).
    pub files_failed: usize,
    /// Number of code blocks highlighted.
    pub blocks_highlighted: usize,
    /// Number of code blocks left alone because their language is unknown.
    pub blocks_skipped: usize,
    /// Languages that were not supported, in first-seen order.
    pub unsupported_languages: Vec<String>,
    /// Total bytes read.
    pub bytes_input: u64,
    /// Total bytes written.
    pub bytes_output: u64,
    pub duration: Duration,
}

impl RunStats {
    fn record(&mut self, outcome: FileOutcome) {
        self.files_processed += 1;
        self.bytes_input += outcome.bytes_input;
        self.bytes_output += outcome.bytes_output;
        self.absorb_highlight(outcome.highlight);
    }

    fn absorb_highlight(&mut self, highlight: HighlightStats) {
        self.blocks_highlighted += highlight.blocks_highlighted;
        self.blocks_skipped += highlight.blocks_skipped;
        for lang in highlight.unsupported_languages {
            if !self.unsupported_languages.contains(&lang) {
                self.unsupported_languages.push(lang);
            }
        }
    }

    /// Fold the stats of another step into these.
    pub fn merge(&mut self, other: RunStats) {
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.bytes_input += other.bytes_input;
        self.bytes_output += other.bytes_output;
        self.duration += other.duration;
        self.absorb_highlight(HighlightStats {
            blocks_highlighted: other.blocks_highlighted,
            blocks_skipped: other.blocks_skipped,
            unsupported_languages: other.unsupported_languages,
        });
    }

    /// Output growth as a percentage of input ((output - input) / input * 100).
    pub fn inflation_percent(&self) -> f64 {
        if self.bytes_input == 0 {
            0.0
        } else {
            (self.bytes_output as f64 - self.bytes_input as f64) / self.bytes_input as f64 * 100.0
        }
    }

    /// Processing throughput in MB/s.
    pub fn throughput_mb_s(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            (self.bytes_input as f64 / (1024.0 * 1024.0)) / secs
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        progress.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    progress
}

/// Run `process` over `files` in parallel and aggregate the outcomes.
///
/// With `fail_on_error` the first failure (in path order) is returned once
/// all files have been attempted; otherwise failures are logged and counted.
pub fn process_files<F>(step: &str, files: &[PathBuf], fail_on_error: bool, process: F) -> Result<RunStats>
where
    F: Fn(&Path) -> Result<FileOutcome> + Sync,
{
    let progress = progress_bar(files.len());
    let start = Instant::now();

    let results: Vec<(&PathBuf, Result<FileOutcome>)> = files
        .par_iter()
        .map(|path| {
            debug!(step, path = %path.display(), "processing");
            let result = process(path);
            progress.inc(1);
            (path, result)
        })
        .collect();

    progress.finish_and_clear();

    let mut stats = RunStats::default();
    for (path, result) in results {
        match result {
            Ok(outcome) => stats.record(outcome),
            Err(err) if fail_on_error => return Err(err),
            Err(err) => {
                warn!(step, path = %path.display(), error = %err, "failed to process file");
                stats.files_failed += 1;
            }
        }
    }
    stats.duration = start.elapsed();

    info!(
        step,
        files = stats.files_processed,
        failed = stats.files_failed,
        elapsed_ms = stats.duration.as_millis() as u64,
        "step finished"
    );
    Ok(stats)
}
