// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Omnidoc.

use thiserror::Error;

/// Top-level error type for all Omnidoc operations.
#[derive(Debug, Error)]
pub enum OmnidocError {
    // -- Page range errors --
    #[error("malformed page range token: {0}")]
    RangeSyntax(String),

    #[error("page {page} out of range (document has {page_count} pages)")]
    RangeBounds { page: u32, page_count: u32 },

    // -- Assembly errors --
    #[error("no page at index {index} in source '{src}'")]
    PageReference { src: String, index: u32 },

    #[error("document has no pages: {0}")]
    EmptySource(String),

    #[error("no input documents given")]
    NoInputs,

    // -- OCR errors (per-page, recoverable) --
    #[error("recognition failed on page {page}: {message}")]
    Recognition { page: u32, message: String },

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OmnidocError {
    /// Stable machine-readable kind, used by the editor protocol when a
    /// failure is reported back as JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RangeSyntax(_) => "range_syntax",
            Self::RangeBounds { .. } => "range_bounds",
            Self::PageReference { .. } => "page_reference",
            Self::EmptySource(_) => "empty_source",
            Self::NoInputs => "no_inputs",
            Self::Recognition { .. } => "recognition",
            Self::Pdf(_) => "pdf",
            Self::Image(_) => "image",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OmnidocError>;
