// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session — explicit state for the scan editor workflow. The session is
// owned by the calling collaborator; the core holds nothing across calls.
// Each original image gets processed (adjusted, optionally enhanced) into a
// PNG inside the session work directory; finalizing assembles the processed
// images, in original order, into one timestamped PDF and clears the
// session's temporary files.

use std::path::{Path, PathBuf};

use chrono::Local;
use omnidoc_core::error::{OmnidocError, Result};
use omnidoc_core::{AdjustSettings, PaperSize};
use tracing::{debug, info, instrument, warn};

use crate::image::adjust::ImageAdjustPipeline;
use crate::image::processor::ImageProcessor;
use crate::pdf::writer::PdfWriter;
use crate::scan::enhance::ScanEnhancer;

/// One scan editor session: the ordered originals and their processed
/// counterparts.
#[derive(Debug)]
pub struct ScanSession {
    /// Originals in the order they were supplied; this order is the page
    /// order of the final PDF.
    originals: Vec<PathBuf>,
    /// Processed PNG per original, filled in by [`ScanSession::process`].
    processed: Vec<Option<PathBuf>>,
    /// Directory for intermediate PNGs.
    work_dir: PathBuf,
    paper_size: PaperSize,
}

impl ScanSession {
    /// Start a session over the given images.
    ///
    /// # Errors
    ///
    /// `NoInputs` for an empty image list; `Io` if the work directory cannot
    /// be created.
    #[instrument(skip_all, fields(images = originals.len(), work_dir = %work_dir.as_ref().display()))]
    pub fn new(
        originals: Vec<PathBuf>,
        work_dir: impl AsRef<Path>,
        paper_size: PaperSize,
    ) -> Result<Self> {
        if originals.is_empty() {
            return Err(OmnidocError::NoInputs);
        }
        let work_dir = work_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&work_dir)?;

        let processed = vec![None; originals.len()];
        Ok(Self {
            originals,
            processed,
            work_dir,
            paper_size,
        })
    }

    /// Number of originals in the session.
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// How many originals have been processed so far.
    pub fn processed_count(&self) -> usize {
        self.processed.iter().filter(|p| p.is_some()).count()
    }

    /// Process one original with the given adjustments, optionally applying
    /// the black-and-white scan enhancement afterwards.
    ///
    /// Re-processing an already-processed original replaces its previous
    /// output (last write wins).
    #[instrument(skip(self, settings, image_path), fields(image = %image_path.as_ref().display(), enhance))]
    pub fn process(
        &mut self,
        image_path: impl AsRef<Path>,
        settings: &AdjustSettings,
        enhance: bool,
    ) -> Result<PathBuf> {
        let image_path = image_path.as_ref();
        let index = self
            .originals
            .iter()
            .position(|p| p == image_path)
            .ok_or_else(|| {
                OmnidocError::Image(format!(
                    "image {} is not part of this session",
                    image_path.display()
                ))
            })?;

        let image = ImageProcessor::open(image_path)?.into_dynamic();
        let mut adjusted = ImageAdjustPipeline::apply(settings, &image)?;
        if enhance {
            adjusted = ScanEnhancer::from_dynamic(adjusted).enhance_scan().into_dynamic();
        }

        let output = self.work_dir.join(format!("processed_{index:04}.png"));
        ImageProcessor::from_dynamic(adjusted).save(&output)?;

        debug!(index, output = %output.display(), "Image processed");
        self.processed[index] = Some(output.clone());
        Ok(output)
    }

    /// Assemble all processed images, in original order, into one PDF.
    ///
    /// The output lands in `output_folder` (default: the first original's
    /// directory) as `scanned_document_<timestamp>.pdf`. Originals that were
    /// never processed are skipped with a warning. On success the session's
    /// processed state and temporary files are cleared.
    ///
    /// # Errors
    ///
    /// `NoInputs` when nothing has been processed yet.
    #[instrument(skip_all)]
    pub fn finalize(&mut self, output_folder: Option<&Path>) -> Result<PathBuf> {
        let ordered: Vec<(usize, &PathBuf)> = self
            .processed
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|path| (i, path)))
            .collect();

        if ordered.is_empty() {
            return Err(OmnidocError::NoInputs);
        }
        for (i, original) in self.originals.iter().enumerate() {
            if self.processed[i].is_none() {
                warn!(image = %original.display(), "Original never processed, skipping");
            }
        }

        let mut images = Vec::with_capacity(ordered.len());
        for (_, path) in &ordered {
            images.push(std::fs::read(path)?);
        }

        let output_dir = match output_folder {
            Some(dir) => dir.to_path_buf(),
            None => self.originals[0]
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };
        std::fs::create_dir_all(&output_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let output = output_dir.join(format!("scanned_document_{timestamp}.pdf"));

        let mut writer = PdfWriter::new(self.paper_size);
        writer.set_title("Omnidoc Scan");
        writer.write_images_to_file(&images, &output)?;

        info!(
            pages = images.len(),
            output = %output.display(),
            "Scan PDF finalized"
        );

        self.cleanup();
        Ok(output)
    }

    /// Remove temporary processed files and reset session state.
    fn cleanup(&mut self) {
        for processed in self.processed.iter_mut() {
            if let Some(path) = processed.take()
                && let Err(err) = std::fs::remove_file(&path)
            {
                warn!(path = %path.display(), %err, "Could not remove temporary file");
            }
        }
    }
}
