// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Splitter — cut one document into per-group outputs plus an optional
// leftover document, driven by a user range-set expression.

use std::path::{Path, PathBuf};

use lopdf::Document;
use omnidoc_core::error::{OmnidocError, Result};
use omnidoc_core::{PageRange, RangeSet};
use serde::Serialize;
use tracing::{info, instrument};

use crate::pdf::assembler::{DocumentAssembler, PageDraw, SourceId};
use crate::pdf::range::parse_range_set;
use crate::pdf::reader::PdfReader;

/// One file written by a split run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOutput {
    pub path: PathBuf,
    /// 1-based page numbers that went into this output, in order.
    pub pages: Vec<u32>,
    /// Whether this is the implicit leftover output.
    pub leftover: bool,
}

/// Splits a single PDF according to a range-set expression.
///
/// Every explicit group becomes one output in parse order; uncovered pages
/// become one additional leftover output. Overlapping groups duplicate pages
/// across outputs — the expression is honored verbatim.
pub struct Splitter {
    assembler: DocumentAssembler,
    source: SourceId,
    stem: String,
    page_count: u32,
}

impl Splitter {
    /// Open the source document.
    ///
    /// # Errors
    ///
    /// `EmptySource` if the document has zero pages.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = PdfReader::open(path)?;
        let page_count = reader.page_count() as u32;
        if page_count == 0 {
            return Err(OmnidocError::EmptySource(path.display().to_string()));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut assembler = DocumentAssembler::new();
        let source = assembler.add_reader(reader);

        Ok(Self {
            assembler,
            source,
            stem,
            page_count,
        })
    }

    /// Wrap an already-loaded document (used by tests and in-memory callers).
    pub fn from_document(document: Document, stem: impl Into<String>) -> Result<Self> {
        let stem = stem.into();
        let page_count = document.get_pages().len() as u32;
        if page_count == 0 {
            return Err(OmnidocError::EmptySource(stem));
        }
        let mut assembler = DocumentAssembler::new();
        let source = assembler.add_source(document, stem.clone());
        Ok(Self {
            assembler,
            source,
            stem,
            page_count,
        })
    }

    /// Number of pages in the source.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Parse `expression` and write one PDF per group into `output_dir`.
    ///
    /// Parser errors propagate unchanged. Returns the written outputs in
    /// emission order (explicit groups first, leftover last).
    #[instrument(skip(self), fields(expression, output_dir = %output_dir.as_ref().display()))]
    pub fn split(&self, expression: &str, output_dir: impl AsRef<Path>) -> Result<Vec<SplitOutput>> {
        let output_dir = output_dir.as_ref();
        let range_set = parse_range_set(expression, self.page_count)?;

        std::fs::create_dir_all(output_dir)?;

        let mut outputs = Vec::with_capacity(range_set.groups.len() + 1);

        for group in &range_set.groups {
            let pages: Vec<u32> = group.pages().collect();
            let path = output_dir.join(self.group_filename(group));
            self.write_pages(&pages, &path)?;
            outputs.push(SplitOutput {
                path,
                pages,
                leftover: false,
            });
        }

        if !range_set.leftover.is_empty() {
            let path = output_dir.join(format!("{}_leftover.pdf", self.stem));
            self.write_pages(&range_set.leftover, &path)?;
            outputs.push(SplitOutput {
                path,
                pages: range_set.leftover.clone(),
                leftover: true,
            });
        }

        info!(
            outputs = outputs.len(),
            source_pages = self.page_count,
            "Split complete"
        );
        Ok(outputs)
    }

    /// Parse an expression without writing anything (preview for the caller).
    pub fn plan(&self, expression: &str) -> Result<RangeSet> {
        parse_range_set(expression, self.page_count)
    }

    fn group_filename(&self, group: &PageRange) -> String {
        format!("{}_pages_{}-{}.pdf", self.stem, group.start, group.end)
    }

    fn write_pages(&self, pages: &[u32], path: &Path) -> Result<()> {
        let draws: Vec<PageDraw> = pages
            .iter()
            .map(|&page| PageDraw::page(self.source, page - 1))
            .collect();
        self.assembler.assemble_to_file(&draws, path)
    }
}
