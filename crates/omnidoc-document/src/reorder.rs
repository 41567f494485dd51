// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reorder engine — apply the permutation and per-page rotations captured by
// the reorder editor to a source document.

use std::path::{Path, PathBuf};

use omnidoc_core::ReorderSpec;
use omnidoc_core::error::Result;
use tracing::{info, instrument};

use crate::pdf::assembler::{DocumentAssembler, PageDraw};

/// Suffix appended to the source stem for the reordered output.
pub const REORDER_SUFFIX: &str = "_reordered";

/// Applies a [`ReorderSpec`] to a single document.
///
/// The spec is honored verbatim: omitted pages are dropped, repeated pages
/// are duplicated, and each entry's rotation delta is composed onto the
/// page's stored rotation.
pub struct ReorderEngine;

impl ReorderEngine {
    /// Derived output path: `<stem>_reordered.pdf` next to the source.
    pub fn output_path_for(source: impl AsRef<Path>) -> PathBuf {
        let source = source.as_ref();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        dir.join(format!("{stem}{REORDER_SUFFIX}.pdf"))
    }

    /// Apply `spec` to the document at `source` and write the derived output.
    ///
    /// Returns the output path. An entry referencing a page outside the
    /// source propagates `PageReference`.
    #[instrument(skip_all, fields(source = %source.as_ref().display(), entries = spec.len()))]
    pub fn apply(source: impl AsRef<Path>, spec: &ReorderSpec) -> Result<PathBuf> {
        let source = source.as_ref();
        let output = Self::output_path_for(source);
        Self::apply_to(source, spec, &output)?;
        Ok(output)
    }

    /// Apply `spec`, writing to an explicit output path.
    pub fn apply_to(
        source: impl AsRef<Path>,
        spec: &ReorderSpec,
        output: impl AsRef<Path>,
    ) -> Result<()> {
        let mut assembler = DocumentAssembler::new();
        let src = assembler.add_source_from_path(source.as_ref())?;

        let draws: Vec<PageDraw> = spec
            .entries
            .iter()
            .map(|entry| PageDraw {
                source: src,
                // Out-of-bounds (including page 0 wrapping to u32::MAX) is
                // caught by the assembler's page lookup.
                page_index: entry.page_number.wrapping_sub(1),
                rotation: entry.rotation,
            })
            .collect();

        assembler.assemble_to_file(&draws, output.as_ref())?;

        info!(
            pages = draws.len(),
            output = %output.as_ref().display(),
            "Reorder applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_test_pdf;
    use lopdf::{Document, Object};
    use omnidoc_core::error::OmnidocError;
    use omnidoc_core::{ReorderEntry, Rotation};
    use tempfile::TempDir;

    fn entry(page_number: u32, degrees: i64) -> ReorderEntry {
        ReorderEntry {
            page_number,
            rotation: Rotation::from_degrees(degrees).unwrap(),
        }
    }

    fn page_info(path: &Path) -> Vec<(String, i64)> {
        let doc = Document::load(path).unwrap();
        let pages = doc.get_pages();
        let mut info = Vec::new();
        for (num, page_id) in pages {
            let text = doc.extract_text(&[num]).unwrap_or_default().trim().to_string();
            let rotation = doc
                .get_object(page_id)
                .ok()
                .and_then(|obj| match obj {
                    Object::Dictionary(dict) => {
                        dict.get(b"Rotate").ok().and_then(|r| r.as_i64().ok())
                    }
                    _ => None,
                })
                .unwrap_or(0);
            info.push((text, rotation));
        }
        info
    }

    #[test]
    fn permutation_with_rotations() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, build_test_pdf(3)).unwrap();

        let spec = ReorderSpec::new(vec![entry(3, 90), entry(1, 0), entry(2, 180)]);
        let output = ReorderEngine::apply(&source, &spec).unwrap();

        assert_eq!(output, dir.path().join("doc_reordered.pdf"));
        assert_eq!(
            page_info(&output),
            vec![
                ("Page 3".to_string(), 90),
                ("Page 1".to_string(), 0),
                ("Page 2".to_string(), 180),
            ]
        );
    }

    #[test]
    fn omitted_pages_are_dropped_silently() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, build_test_pdf(4)).unwrap();

        let spec = ReorderSpec::new(vec![entry(4, 0), entry(2, 0)]);
        let output = ReorderEngine::apply(&source, &spec).unwrap();

        let info = page_info(&output);
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].0, "Page 4");
        assert_eq!(info[1].0, "Page 2");
    }

    #[test]
    fn repeated_pages_are_duplicated() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, build_test_pdf(2)).unwrap();

        let spec = ReorderSpec::new(vec![entry(1, 0), entry(1, 90)]);
        let output = ReorderEngine::apply(&source, &spec).unwrap();

        let info = page_info(&output);
        assert_eq!(info.len(), 2);
        assert_eq!(info[0], ("Page 1".to_string(), 0));
        assert_eq!(info[1], ("Page 1".to_string(), 90));
    }

    #[test]
    fn out_of_bounds_page_propagates_reference_error() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, build_test_pdf(2)).unwrap();

        let spec = ReorderSpec::new(vec![entry(7, 0)]);
        let err = ReorderEngine::apply(&source, &spec).unwrap_err();
        assert!(matches!(err, OmnidocError::PageReference { index: 6, .. }));
    }
}
