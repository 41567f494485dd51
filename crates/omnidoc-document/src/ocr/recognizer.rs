// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs`-backed text recognition, a pure-Rust OCR engine executing neural
// network models via `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// omnidoc-document = { path = "crates/omnidoc-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Models can be downloaded from the ocrs-models repository, or obtained
// automatically by running the `ocrs-cli` tool once:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png  # downloads models to ~/.cache/ocrs/
//   ```
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use omnidoc_core::error::{OmnidocError, Result};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::ocr::{OcrToken, TextRecognizer};

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
/// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        // Last resort — current directory.
        PathBuf::from("ocrs-models")
    }
}

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Configuration for constructing an [`OcrsRecognizer`].
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for RecognizerConfig {
    /// Returns a config pointing at the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl RecognizerConfig {
    /// Create a config with an explicit model directory.
    ///
    /// Expects the directory to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Create a config pointing at two specific model files.
    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(OmnidocError::Recognition {
                    page: 0,
                    message: format!(
                        "{kind} model not found at {}; run `ocrs-cli` once to download models",
                        path.display()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Check whether OCR model files exist in the default cache location.
pub fn models_available() -> bool {
    let config = RecognizerConfig::default();
    config.detection_model_path.exists() && config.recognition_model_path.exists()
}

/// Word-level text recognition backed by the `ocrs` engine.
///
/// Model loading is the expensive step — keep the recognizer around and feed
/// it one page raster at a time.
///
/// **Important:** the `ocrs` and `rten` crates must be compiled in release
/// mode; debug builds are 10-100x slower.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load models from the paths in `config` and initialise the engine.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            OmnidocError::Recognition {
                page: 0,
                message: format!(
                    "failed to load detection model from {}: {}",
                    config.detection_model_path.display(),
                    err
                ),
            }
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                OmnidocError::Recognition {
                    page: 0,
                    message: format!(
                        "failed to load recognition model from {}: {}",
                        config.recognition_model_path.display(),
                        err
                    ),
                }
            })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| OmnidocError::Recognition {
            page: 0,
            message: format!("failed to initialise OCR engine: {}", err),
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Create a recognizer using the default model cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(RecognizerConfig::default())
    }
}

impl TextRecognizer for OcrsRecognizer {
    /// Detect words, group them into lines, recognize each line, and emit
    /// per-word tokens with image-pixel bounding boxes.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrToken>> {
        let recognition = |message: String| OmnidocError::Recognition { page: 0, message };

        // Convert to RGB8 — the format expected by ocrs.
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height))
            .map_err(|err| recognition(format!("failed to create image source: {}", err)))?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| recognition(format!("OCR preprocessing failed: {}", err)))?;

        // Step 1: Detect word bounding boxes.
        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| recognition(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        // Step 2: Group words into text lines.
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(line_count = line_rects.len(), "Text lines found");

        // Step 3: Recognise characters within each line.
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| recognition(format!("line recognition failed: {}", err)))?;

        // Emit one token per word, tagged with its line index.
        let mut tokens = Vec::new();
        for (line_index, line) in line_texts.iter().enumerate() {
            let Some(line) = line else {
                continue;
            };
            for word in line.words() {
                let text = word.to_string();
                if text.trim().is_empty() {
                    continue;
                }
                let rect = word.rotated_rect().bounding_rect();
                tokens.push(OcrToken {
                    text,
                    line: line_index,
                    x: rect.left(),
                    y: rect.top(),
                    width: rect.width(),
                    height: rect.height(),
                });
            }
        }

        debug!(tokens = tokens.len(), "Recognition complete");
        Ok(tokens)
    }
}
