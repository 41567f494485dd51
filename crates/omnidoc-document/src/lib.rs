// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// omnidoc-document — Document processing for the Omnidoc toolkit.
//
// Provides PDF operations (read, assemble, split, merge, reorder), text
// conversion, OCR with searchable-PDF output, image adjustment for scan
// cleanup, and the scan-to-PDF session.

pub mod batch;
pub mod convert;
pub mod image;
pub mod merge;
pub mod ocr;
pub mod pdf;
pub mod reorder;
pub mod scan;
pub mod split;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the primary types so callers can use `omnidoc_document::Splitter` etc.
pub use crate::image::adjust::{AdjustmentHistory, ImageAdjustPipeline};
pub use crate::image::processor::ImageProcessor;
pub use merge::Merger;
pub use ocr::pipeline::{OcrMode, OcrPipeline};
pub use pdf::assembler::{DocumentAssembler, PageDraw, SourceId};
pub use pdf::range::parse_range_set;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use reorder::ReorderEngine;
pub use scan::session::ScanSession;
pub use split::Splitter;

#[cfg(feature = "ocr")]
pub use ocr::recognizer::{OcrsRecognizer, RecognizerConfig};
