// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::types::PaperSize;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default paper size for generated PDF pages (scan output).
    pub default_paper_size: PaperSize,
    /// OCR settings.
    pub ocr: OcrSettings,
    /// Scan adjustment defaults, pre-filled into the scan editor.
    pub scan: ScanSettings,
}

/// OCR behaviour knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Re-run recognition even when the page already carries extractable text.
    pub force: bool,
    /// Directory holding the detection/recognition model files; `None` uses
    /// the default model cache.
    pub model_dir: Option<std::path::PathBuf>,
}

/// Default multipliers for the scan cleanup pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_paper_size: PaperSize::A4,
            ocr: OcrSettings {
                force: false,
                model_dir: None,
            },
            scan: ScanSettings {
                brightness: 1.0,
                contrast: 1.5,
                sharpness: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scan.contrast, 1.5);
        assert!(!back.ocr.force);
        assert_eq!(back.default_paper_size, PaperSize::A4);
    }
}
