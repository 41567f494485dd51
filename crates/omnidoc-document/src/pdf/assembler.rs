// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — the generic projection primitive behind split, merge,
// and reorder. Given one or more source documents and an ordered list of
// (source, page index, rotation) draws, it produces a new document whose
// pages are deep clones of the referenced source pages.

use std::collections::BTreeMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use omnidoc_core::Rotation;
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{debug, info, instrument, warn};

use crate::pdf::reader::PdfReader;

/// Handle to a source document registered with a [`DocumentAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

/// One output page: which source page to draw next, and the rotation delta
/// to compose onto whatever `/Rotate` the page already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDraw {
    pub source: SourceId,
    /// 0-based page index within the source document.
    pub page_index: u32,
    pub rotation: Rotation,
}

impl PageDraw {
    /// Draw a page unrotated.
    pub fn page(source: SourceId, page_index: u32) -> Self {
        Self {
            source,
            page_index,
            rotation: Rotation::None,
        }
    }
}

struct Source {
    document: Document,
    label: String,
}

/// Assembles new PDF documents from pages of registered sources.
///
/// The assembler is a projection, not a permutation validator: draws may
/// subset, duplicate, and interleave source pages freely. Output page order
/// is exactly draw order; output page count is exactly the draw count.
#[derive(Default)]
pub struct DocumentAssembler {
    sources: Vec<Source>,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Source registration --------------------------------------------------

    /// Register an already-loaded document under a diagnostic label.
    pub fn add_source(&mut self, document: Document, label: impl Into<String>) -> SourceId {
        let id = SourceId(self.sources.len());
        self.sources.push(Source {
            document,
            label: label.into(),
        });
        id
    }

    /// Register a document read from disk; the path becomes the label.
    pub fn add_source_from_path(&mut self, path: impl AsRef<std::path::Path>) -> Result<SourceId> {
        let reader = PdfReader::open(path.as_ref())?;
        let label = reader.label();
        Ok(self.add_source(reader.into_document(), label))
    }

    /// Register the document held by a [`PdfReader`].
    pub fn add_reader(&mut self, reader: PdfReader) -> SourceId {
        let label = reader.label();
        self.add_source(reader.into_document(), label)
    }

    /// Number of pages in a registered source.
    pub fn source_page_count(&self, source: SourceId) -> usize {
        self.sources[source.0].document.get_pages().len()
    }

    // -- Assembly -------------------------------------------------------------

    /// Produce a new document from the given draws.
    ///
    /// Each referenced page is deep-cloned into the output (content streams,
    /// fonts, and page-box metadata copied; `/Parent` re-patched onto the new
    /// page tree) and its `/Rotate` set to `(existing + delta) mod 360`.
    #[instrument(skip_all, fields(draws = draws.len(), sources = self.sources.len()))]
    pub fn assemble(&self, draws: &[PageDraw]) -> Result<Document> {
        info!(draws = draws.len(), "Assembling document");

        let mut output = Document::with_version("1.5");
        let pages_id = output.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(draws.len());

        for draw in draws {
            let source = self
                .sources
                .get(draw.source.0)
                .ok_or_else(|| OmnidocError::Pdf(format!(
                    "unknown source id {}",
                    draw.source.0
                )))?;

            let source_pages = source.document.get_pages();
            let page_id = *source_pages.get(&(draw.page_index + 1)).ok_or_else(|| {
                OmnidocError::PageReference {
                    src: source.label.clone(),
                    index: draw.page_index,
                }
            })?;

            let cloned_id = clone_page_into(&source.document, &mut output, page_id)?;
            apply_rotation(&source.document, &mut output, page_id, cloned_id, draw.rotation);

            // Patch the cloned page onto the output page tree.
            if let Ok(Object::Dictionary(page_dict)) = output.get_object_mut(cloned_id) {
                page_dict.set("Parent", Object::Reference(pages_id));
            }
            kids.push(Object::Reference(cloned_id));
        }

        let pages_dict = lopdf::dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => Object::Array(kids),
        };
        output
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = output.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        output.trailer.set("Root", Object::Reference(catalog_id));

        debug!(pages = draws.len(), "Assembly complete");
        Ok(output)
    }

    /// Assemble and serialize in one step.
    pub fn assemble_to_bytes(&self, draws: &[PageDraw]) -> Result<Vec<u8>> {
        let mut document = self.assemble(draws)?;
        let mut buffer = Vec::new();
        document.save_to(&mut buffer).map_err(|err| {
            OmnidocError::Pdf(format!("failed to serialise assembled PDF: {}", err))
        })?;
        Ok(buffer)
    }

    /// Assemble and write to a file.
    pub fn assemble_to_file(
        &self,
        draws: &[PageDraw],
        path: impl AsRef<std::path::Path>,
    ) -> Result<()> {
        let bytes = self.assemble_to_bytes(draws)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote assembled PDF to {}", path.as_ref().display());
        Ok(())
    }
}

/// Set the cloned page's `/Rotate` to the source page's stored rotation plus
/// the draw's delta, normalized into [0, 360).
fn apply_rotation(
    source: &Document,
    output: &mut Document,
    source_page_id: ObjectId,
    cloned_id: ObjectId,
    rotation: Rotation,
) {
    let existing = source
        .get_object(source_page_id)
        .ok()
        .and_then(|obj| match obj {
            Object::Dictionary(dict) => dict.get(b"Rotate").ok().and_then(|r| r.as_i64().ok()),
            _ => None,
        })
        .unwrap_or(0);

    let combined = (existing + rotation.degrees()).rem_euclid(360);

    if let Ok(Object::Dictionary(dict)) = output.get_object_mut(cloned_id) {
        if combined == 0 {
            dict.remove(b"Rotate");
        } else {
            dict.set("Rotate", Object::Integer(combined));
        }
    }
}

/// Clone a single page object (and its referenced resources) from `source`
/// into `target`, returning the new page's object id. The caller is
/// responsible for wiring `/Parent` and the target page tree.
///
/// Each call clones the page subtree afresh, so drawing the same source page
/// twice yields two independent output pages (with independently settable
/// `/Rotate`).
fn clone_page_into(source: &Document, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
    let page_object = source.get_object(page_id).map_err(|err| {
        OmnidocError::Pdf(format!("cannot read page object {:?}: {}", page_id, err))
    })?;

    // The map from source ids to target ids breaks reference cycles (an
    // annotation's /P points back at its page) and keeps resources shared
    // within the page subtree shared in the output. Reserving the page's own
    // id up front routes back-references to the clone.
    let mut visited = BTreeMap::new();
    let new_page_id = target.new_object_id();
    visited.insert(page_id, new_page_id);

    let cloned = deep_clone_object(source, target, page_object, &mut visited)?;
    target.objects.insert(new_page_id, cloned);
    Ok(new_page_id)
}

/// Deep-clone a single lopdf Object, recursively resolving references.
/// `/Parent` is deliberately skipped (the caller patches it onto the new
/// page tree); every other reference is cloned once and remembered in
/// `visited`.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    visited: &mut BTreeMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = deep_clone_object(source, target, value, visited)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(deep_clone_object(source, target, item, visited)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => {
            if let Some(&mapped) = visited.get(ref_id) {
                return Ok(Object::Reference(mapped));
            }
            // Resolve the reference in the source, clone it, and return a new
            // reference in the target.
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    // Register before recursing so cycles terminate.
                    visited.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, referenced, visited)?;
                    target.objects.insert(new_id, cloned);
                    Ok(Object::Reference(new_id))
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Ok(Object::Null)
                }
            }
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = deep_clone_object(source, target, value, visited)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Stream(lopdf::Stream::new(
                new_dict,
                stream.content.clone(),
            )))
        }
        // All other object types (Boolean, Integer, Real, String, Name, Null)
        // are trivially cloneable.
        other => Ok(other.clone()),
    }
}
