// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merger — concatenate multiple PDF documents, each contributing its full
// page set in original order.

use std::path::{Path, PathBuf};

use omnidoc_core::error::{OmnidocError, Result};
use tracing::{info, instrument, warn};

use crate::pdf::assembler::{DocumentAssembler, PageDraw};

/// Default output filename for a manually selected file list.
pub const DEFAULT_MANUAL_OUTPUT: &str = "merged_manual.pdf";
/// Default output filename for a folder scan.
pub const DEFAULT_FOLDER_OUTPUT: &str = "merged_folder.pdf";

/// Result of a merge run.
#[derive(Debug)]
pub struct MergeReport {
    pub output: PathBuf,
    /// Inputs that contributed pages, in merge order.
    pub merged: Vec<PathBuf>,
    /// Inputs that failed to load and were skipped.
    pub skipped: Vec<(PathBuf, OmnidocError)>,
    pub total_pages: usize,
}

/// Concatenates PDF documents in caller-supplied order.
pub struct Merger;

impl Merger {
    /// Merge `inputs` in order into `output`.
    ///
    /// Inputs that fail to load are skipped with a warning and recorded in
    /// the report; the merge aborts only when the input list is empty
    /// (`NoInputs`) or every input fails.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn merge_files(inputs: &[PathBuf], output: impl AsRef<Path>) -> Result<MergeReport> {
        if inputs.is_empty() {
            return Err(OmnidocError::NoInputs);
        }
        let output = output.as_ref();

        let mut assembler = DocumentAssembler::new();
        let mut draws: Vec<PageDraw> = Vec::new();
        let mut merged = Vec::new();
        let mut skipped = Vec::new();

        for input in inputs {
            match assembler.add_source_from_path(input) {
                Ok(source) => {
                    let pages = assembler.source_page_count(source);
                    draws.extend((0..pages as u32).map(|i| PageDraw::page(source, i)));
                    merged.push(input.clone());
                }
                Err(err) => {
                    warn!(input = %input.display(), %err, "Skipping unreadable input");
                    skipped.push((input.clone(), err));
                }
            }
        }

        if merged.is_empty() {
            return Err(OmnidocError::Pdf(format!(
                "none of the {} inputs could be loaded",
                inputs.len()
            )));
        }

        assembler.assemble_to_file(&draws, output)?;

        info!(
            merged = merged.len(),
            skipped = skipped.len(),
            total_pages = draws.len(),
            output = %output.display(),
            "Merge complete"
        );

        Ok(MergeReport {
            output: output.to_path_buf(),
            merged,
            skipped,
            total_pages: draws.len(),
        })
    }

    /// Merge every `*.pdf` in `folder` (non-recursive, alphabetical order).
    ///
    /// When `output` is `None`, writes `merged_folder.pdf` into the scanned
    /// folder itself.
    #[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
    pub fn merge_folder(
        folder: impl AsRef<Path>,
        output: Option<PathBuf>,
    ) -> Result<MergeReport> {
        let folder = folder.as_ref();
        let inputs = crate::batch::pdf_files_in(folder)?;
        if inputs.is_empty() {
            return Err(OmnidocError::NoInputs);
        }

        let output = output.unwrap_or_else(|| folder.join(DEFAULT_FOLDER_OUTPUT));
        Self::merge_files(&inputs, output)
    }

    /// Default output path for a manual merge: `merged_manual.pdf` next to
    /// the first input.
    pub fn default_manual_output(inputs: &[PathBuf]) -> Result<PathBuf> {
        let first = inputs.first().ok_or(OmnidocError::NoInputs)?;
        let dir = first.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(DEFAULT_MANUAL_OUTPUT))
    }
}
