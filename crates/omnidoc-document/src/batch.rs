// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch folder helpers: deterministic listing, one-file-at-a-time processing
// with per-file failure isolation, progress reported after each file.

use std::path::{Path, PathBuf};

use omnidoc_core::error::{OmnidocError, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Progress snapshot handed to the caller after each file completes.
/// Serializable so collaborators can forward it to a progress display
/// verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    /// Files finished so far (including the one just completed).
    pub completed: usize,
    pub total: usize,
    pub current: PathBuf,
    /// Whether the file just completed succeeded.
    pub succeeded: bool,
}

/// Outcome of a whole folder run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, OmnidocError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// List every `*.pdf` directly inside `folder`, sorted by filename.
///
/// The sort gives batch runs a stable, deterministic order regardless of
/// directory-listing order.
#[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
pub fn pdf_files_in(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    files_with_extensions(folder, &["pdf"])
}

/// List files directly inside `folder` whose extension (case-insensitive)
/// matches one of `extensions`, sorted by filename.
pub fn files_with_extensions(
    folder: impl AsRef<Path>,
    extensions: &[&str],
) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        let lower = ext.to_ascii_lowercase();
                        extensions.iter().any(|e| *e == lower)
                    })
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Run `operation` over every `*.pdf` in `folder`, one file at a time.
///
/// A failure on one file is recorded and the run continues with the next;
/// `progress` fires after each file completes. Each document's handles are
/// scoped inside its own `operation` call, so a failure cannot leak state
/// onto the next file.
#[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
pub fn for_each_pdf(
    folder: impl AsRef<Path>,
    mut operation: impl FnMut(&Path) -> Result<()>,
    mut progress: impl FnMut(&BatchProgress),
) -> Result<BatchReport> {
    let files = pdf_files_in(folder)?;
    let total = files.len();
    let mut report = BatchReport::default();

    for (index, file) in files.iter().enumerate() {
        let outcome = operation(file);
        let succeeded = outcome.is_ok();
        match outcome {
            Ok(()) => report.succeeded.push(file.clone()),
            Err(err) => {
                warn!(file = %file.display(), %err, "Batch item failed, continuing");
                report.failed.push((file.clone(), err));
            }
        }
        progress(&BatchProgress {
            completed: index + 1,
            total,
            current: file.clone(),
            succeeded,
        });
    }

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Batch run complete"
    );
    Ok(report)
}
