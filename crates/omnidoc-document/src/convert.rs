// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text converter — extract the embedded text of a PDF into a .txt or .md
// file, one slot per page joined by the format's page-break marker. Pages
// without embedded text come out empty; use OCR for scanned documents.

use std::path::{Path, PathBuf};

use omnidoc_core::TextFormat;
use omnidoc_core::error::Result;
use tracing::{info, instrument};

use crate::batch::{BatchProgress, BatchReport, for_each_pdf};
use crate::pdf::reader::PdfReader;

/// Convert a single PDF to text, returning the output path
/// (`<stem>.<txt|md>` next to the source).
#[instrument(skip_all, fields(path = %path.as_ref().display(), ?format))]
pub fn pdf_to_text(path: impl AsRef<Path>, format: TextFormat) -> Result<PathBuf> {
    let path = path.as_ref();
    let reader = PdfReader::open(path)?;

    let mut pages = Vec::with_capacity(reader.page_count());
    for index in 0..reader.page_count() as u32 {
        // Undecodable pages become empty slots rather than aborting the file.
        let text = reader.extract_page_text(index).unwrap_or_default();
        pages.push(text);
    }

    let combined = pages.join(format.page_break());
    let output = path.with_extension(format.extension());
    std::fs::write(&output, combined)?;

    info!(
        pages = pages.len(),
        output = %output.display(),
        "Text conversion complete"
    );
    Ok(output)
}

/// Convert every `*.pdf` in `folder`, alphabetical order, per-file isolation.
pub fn convert_folder(
    folder: impl AsRef<Path>,
    format: TextFormat,
    progress: impl FnMut(&BatchProgress),
) -> Result<BatchReport> {
    for_each_pdf(
        folder,
        |path| pdf_to_text(path, format).map(|_| ()),
        progress,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_test_pdf;
    use tempfile::TempDir;

    #[test]
    fn txt_output_joins_pages_with_form_feed() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, build_test_pdf(3)).unwrap();

        let output = pdf_to_text(&source, TextFormat::Txt).unwrap();
        assert_eq!(output, dir.path().join("doc.txt"));

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.matches('\u{0C}').count(), 2);
        assert!(text.contains("Page 1"));
        assert!(text.contains("Page 3"));
    }

    #[test]
    fn md_output_uses_rule_separator() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, build_test_pdf(2)).unwrap();

        let output = pdf_to_text(&source, TextFormat::Md).unwrap();
        assert_eq!(output, dir.path().join("doc.md"));

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.matches("\n\n---\n\n").count(), 1);
    }

    #[test]
    fn folder_conversion_continues_past_bad_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.pdf"), build_test_pdf(1)).unwrap();
        std::fs::write(dir.path().join("bad.pdf"), b"not a pdf").unwrap();

        let report = convert_folder(dir.path(), TextFormat::Txt, |_| {}).unwrap();
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(dir.path().join("good.txt").exists());
    }
}
