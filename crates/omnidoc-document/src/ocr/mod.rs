// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR subsystem.
//
// Each page moves through an explicit state machine (decision →
// rasterization → recognition → projection → done), with failures isolated
// per page. Recognition itself sits behind the [`TextRecognizer`] trait; the
// `ocr` cargo feature provides the `ocrs`-backed implementation, and tests
// substitute fakes.
//
// Two output modes: plain text (pages joined by a page-break marker) and
// searchable PDF (an invisible, positioned text layer appended onto the
// original pages).

pub mod overlay;
pub mod pipeline;
pub mod raster;

#[cfg(feature = "ocr")]
pub mod recognizer;

use image::DynamicImage;
use omnidoc_core::error::Result;

/// One recognized token (word) in image-pixel space, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub text: String,
    /// Index of the text line this token belongs to, for text reassembly.
    pub line: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A token projected into page-point space, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedToken {
    pub text: String,
    pub line: usize,
    pub x_pts: f32,
    /// Distance from the top of the page to the top of the token box.
    pub y_pts: f32,
    pub width_pts: f32,
    pub height_pts: f32,
}

/// Text recognition over a rasterized page image.
///
/// Implementations return per-word tokens with bounding boxes in the pixel
/// space of the input image.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrToken>>;
}

/// Reassemble recognized tokens into plain text: words joined by spaces
/// within a line, lines joined by newlines, in token order.
pub fn tokens_to_text(tokens: &[OcrToken]) -> String {
    let mut out = String::new();
    let mut current_line: Option<usize> = None;

    for token in tokens {
        match current_line {
            None => {}
            Some(line) if line == token.line => out.push(' '),
            Some(_) => out.push('\n'),
        }
        out.push_str(&token.text);
        current_line = Some(token.line);
    }
    out
}
