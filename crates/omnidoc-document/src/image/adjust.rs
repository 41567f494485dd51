// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan-cleanup adjustment pipeline. The pipeline owns the operation order —
// crop, rotate, brightness, contrast, sharpness — so results are
// deterministic no matter how the caller populated the settings. The
// adjustment history keeps per-session undo/redo of settings snapshots.

use image::DynamicImage;
use omnidoc_core::AdjustSettings;
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{info, instrument};

use crate::image::processor::ImageProcessor;

/// Applies [`AdjustSettings`] to an image in a fixed order.
pub struct ImageAdjustPipeline;

impl ImageAdjustPipeline {
    /// Apply `settings` to `image`, returning a new image. The input is
    /// never mutated.
    ///
    /// # Errors
    ///
    /// `Image` when a multiplier falls outside (0, 3.0].
    #[instrument(skip(image), fields(
        width = image.width(),
        height = image.height(),
        rotation = settings.rotation.degrees(),
    ))]
    pub fn apply(settings: &AdjustSettings, image: &DynamicImage) -> Result<DynamicImage> {
        settings.validate().map_err(OmnidocError::Image)?;

        let mut processor = ImageProcessor::from_dynamic(image.clone());

        if let Some(crop) = settings.crop {
            processor = processor.crop(crop.x, crop.y, crop.width, crop.height);
        }
        processor = processor
            .rotate(settings.rotation)
            .adjust_brightness(settings.brightness)
            .adjust_contrast(settings.contrast)
            .adjust_sharpness(settings.sharpness);

        info!("Adjustment pipeline applied");
        Ok(processor.into_dynamic())
    }

    /// Load, apply, and re-encode as PNG in one step.
    pub fn apply_to_file(
        settings: &AdjustSettings,
        input: impl AsRef<std::path::Path>,
        output: impl AsRef<std::path::Path>,
    ) -> Result<()> {
        let image = ImageProcessor::open(input)?.into_dynamic();
        let adjusted = Self::apply(settings, &image)?;
        ImageProcessor::from_dynamic(adjusted).save(output)
    }
}

/// Per-session undo/redo history of adjustment snapshots.
///
/// Stack discipline: `push` records a new snapshot and clears the redo
/// stack; `undo` moves the latest snapshot onto the redo stack; `redo`
/// moves it back. `current` is the snapshot in effect, or `None` when
/// everything has been undone.
#[derive(Debug, Default, Clone)]
pub struct AdjustmentHistory {
    undo: Vec<AdjustSettings>,
    redo: Vec<AdjustSettings>,
}

impl AdjustmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new adjustment. Any redoable snapshots are discarded.
    pub fn push(&mut self, settings: AdjustSettings) {
        self.undo.push(settings);
        self.redo.clear();
    }

    /// Step back one snapshot. Returns the snapshot now in effect.
    pub fn undo(&mut self) -> Option<&AdjustSettings> {
        let popped = self.undo.pop()?;
        self.redo.push(popped);
        self.current()
    }

    /// Re-apply the most recently undone snapshot and return it.
    pub fn redo(&mut self) -> Option<&AdjustSettings> {
        let restored = self.redo.pop()?;
        self.undo.push(restored);
        self.current()
    }

    /// The snapshot currently in effect.
    pub fn current(&self) -> Option<&AdjustSettings> {
        self.undo.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of snapshots currently applied.
    pub fn depth(&self) -> usize {
        self.undo.len()
    }
}
