//! Copying front-end artifacts (stylesheets, scripts, images) into the output tree.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::processor::{
    FileOutcome, RunStats, WalkOptions, collect_files, process_files, relative_path,
    validate_base_dir,
};

/// Options for [`copy_artifacts`].
#[derive(Debug, Clone, Deserialize)]
pub struct CopyOptions {
    #[serde(flatten)]
    pub walk: WalkOptions,
    pub output_dir: PathBuf,
}

impl CopyOptions {
    pub fn new(walk: WalkOptions, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            walk,
            output_dir: output_dir.into(),
        }
    }

    pub(crate) fn resolve_paths(&mut self, root: &Path) {
        self.walk.resolve_paths(root);
        self.output_dir = root.join(&self.output_dir);
    }
}

fn copy_file(path: &Path, base_dir: &Path, output_dir: &Path) -> Result<FileOutcome> {
    let target = output_dir.join(relative_path(path, base_dir));
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = fs::copy(path, &target)?;
    Ok(FileOutcome {
        bytes_input: bytes,
        bytes_output: bytes,
        ..FileOutcome::default()
    })
}

/// Copy every matching file (default `*`) to the same relative path under `output_dir`.
pub fn copy_artifacts(options: &CopyOptions) -> Result<RunStats> {
    let files = collect_files(&options.walk, "*")?;
    process_files("copy", &files, options.walk.fail_on_error, |path| {
        copy_file(path, &options.walk.base_dir, &options.output_dir)
    })
}

/// Where an output directory sits relative to the tree it is produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Both paths name the same directory.
    Same,
    /// Neither directory contains the other.
    Separate,
}

/// Resolve `path` through the filesystem. A missing tail is appended to the
/// deepest ancestor that exists.
fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(resolved) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(resolved, |acc: PathBuf, part| acc.join(part)));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(io::Error::new(
                        err.kind(),
                        format!("cannot resolve {}: {err}", path.display()),
                    )
                    .into());
                };
                missing.push(name.to_owned());
                existing = parent;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Compare the resolved paths. Fails when one directory contains the other.
pub(crate) fn output_placement(input_dir: &Path, output_dir: &Path) -> Result<Placement> {
    let input = resolve_path(input_dir)?;
    let output = resolve_path(output_dir)?;
    if input == output {
        Ok(Placement::Same)
    } else if input.starts_with(&output) || output.starts_with(&input) {
        Err(Error::OutputOverlapsInput { input, output })
    } else {
        Ok(Placement::Separate)
    }
}

/// Clone a whole directory tree, replacing whatever is at `output_dir`.
///
/// Refuses an `output_dir` that overlaps `input_dir` in either direction.
pub fn copy_tree(input_dir: &Path, output_dir: &Path) -> Result<()> {
    validate_base_dir(input_dir)?;
    if output_placement(input_dir, output_dir)? == Placement::Same {
        return Err(Error::OutputOverlapsInput {
            input: input_dir.to_path_buf(),
            output: output_dir.to_path_buf(),
        });
    }
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    clonetree::clone_tree(input_dir, output_dir, &clonetree::Options::new())
        .map_err(|e| io::Error::other(e.to_string()))?;
    Ok(())
}
