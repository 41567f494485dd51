// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents using the `lopdf`
// crate. Assembly of new documents lives in `assembler`.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{debug, info, instrument};

/// Default media box (US Letter in points) used when a page carries none.
const FALLBACK_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Reads and inspects existing PDF files.
///
/// Wraps `lopdf::Document` and provides the page-level views the pipeline
/// needs: ordered page ids, stored rotation, media box, and a probe for
/// extractable text.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            OmnidocError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            OmnidocError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Page object ids in document order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // get_pages is keyed by 1-indexed page number; BTreeMap iteration
        // yields them in order.
        self.document.get_pages().values().copied().collect()
    }

    /// Object id for a 0-based page index.
    pub fn page_id(&self, index: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages
            .get(&(index + 1))
            .copied()
            .ok_or_else(|| OmnidocError::PageReference {
                src: self.label(),
                index,
            })
    }

    /// The `/Rotate` value stored on a page (0-based index), default 0,
    /// normalized into [0, 360).
    pub fn page_rotation(&self, index: u32) -> Result<i64> {
        let page_id = self.page_id(index)?;
        let rotation = self
            .document
            .get_object(page_id)
            .ok()
            .and_then(|obj| match obj {
                Object::Dictionary(dict) => {
                    dict.get(b"Rotate").ok().and_then(|r| r.as_i64().ok())
                }
                _ => None,
            })
            .unwrap_or(0);
        Ok(rotation.rem_euclid(360))
    }

    /// Media box of a page (0-based index) as `[x0, y0, x1, y1]` in points.
    ///
    /// Handles inline and referenced arrays and walks up the page tree; a
    /// depth limit guards against malformed `/Parent` cycles.
    pub fn media_box(&self, index: u32) -> Result<[f32; 4]> {
        let page_id = self.page_id(index)?;
        let page_obj = self.document.get_object(page_id).map_err(|err| {
            OmnidocError::Pdf(format!("cannot read page object {:?}: {}", page_id, err))
        })?;
        Ok(media_box_recursive(&self.document, page_obj, 10))
    }

    /// Whether a page (0-based index) already carries extractable text.
    ///
    /// Decode failures count as "no text" — the page then goes through
    /// recognition like any scanned page.
    pub fn has_extractable_text(&self, index: u32) -> bool {
        self.document
            .extract_text(&[index + 1])
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }

    /// Extract the embedded text of a page (0-based index).
    pub fn extract_page_text(&self, index: u32) -> Result<String> {
        self.document.extract_text(&[index + 1]).map_err(|err| {
            OmnidocError::Pdf(format!("text extraction failed on page {}: {}", index + 1, err))
        })
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume the reader and return the underlying document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Label used in error messages: the source path, or a placeholder for
    /// in-memory documents.
    pub fn label(&self) -> String {
        self.source_path
            .clone()
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

/// Resolve the `/MediaBox` for a page dictionary, following `/Parent` links.
fn media_box_recursive(doc: &Document, page_obj: &Object, depth: usize) -> [f32; 4] {
    if depth == 0 {
        return FALLBACK_MEDIA_BOX;
    }

    let Object::Dictionary(dict) = page_obj else {
        return FALLBACK_MEDIA_BOX;
    };

    if let Ok(media_box_obj) = dict.get(b"MediaBox") {
        // Resolve an indirect reference if needed.
        let arr = match media_box_obj {
            Object::Array(arr) => Some(arr.clone()),
            Object::Reference(ref_id) => match doc.get_object(*ref_id) {
                Ok(Object::Array(arr)) => Some(arr.clone()),
                _ => None,
            },
            _ => None,
        };

        if let Some(arr) = arr
            && arr.len() == 4
        {
            let values: Vec<f32> = arr
                .iter()
                .filter_map(|o| match o {
                    Object::Integer(i) => Some(*i as f32),
                    Object::Real(r) => Some(*r),
                    _ => None,
                })
                .collect();
            if values.len() == 4 {
                return [values[0], values[1], values[2], values[3]];
            }
        }
    }

    // Inherited from the parent Pages node.
    if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent")
        && let Ok(parent) = doc.get_object(*parent_id)
    {
        return media_box_recursive(doc, parent, depth - 1);
    }

    FALLBACK_MEDIA_BOX
}
