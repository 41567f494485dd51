// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page OCR state machine and the document-level driver.
//
// Each page walks NeedsDecision → (TextExtracted | NeedsRasterization →
// NeedsRecognition → NeedsProjection) → Done, collapsing to Failed on any
// error. One failed page never aborts the document: text mode skips it with
// a recorded warning, searchable mode leaves the original page untouched.

use std::path::{Path, PathBuf};

use lopdf::Document;
use omnidoc_core::TextFormat;
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{debug, info, instrument, warn};

use crate::batch::{BatchProgress, BatchReport, for_each_pdf};
use crate::ocr::raster::{PageRaster, extract_page_raster};
use crate::ocr::{OcrToken, ProjectedToken, TextRecognizer, overlay, tokens_to_text};
use crate::pdf::reader::PdfReader;

/// Output mode for an OCR run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Concatenated page text joined by the format's page-break marker,
    /// written to `<stem>.ocr.<ext>`.
    Text(TextFormat),
    /// Invisible positioned text layer over the original pages, written to
    /// `<stem>.searchable.pdf`.
    SearchablePdf,
}

/// The per-page state machine.
#[derive(Debug)]
pub enum PageState {
    /// Inspect the page for extractable text (unless forced to OCR).
    NeedsDecision,
    /// The page already carries text; recognition is skipped.
    TextExtracted { text: String },
    /// Render the page to an image.
    NeedsRasterization,
    /// Run recognition over the raster.
    NeedsRecognition { raster: PageRaster },
    /// Scale token boxes from image pixels into page points.
    NeedsProjection {
        tokens: Vec<OcrToken>,
        width_px: u32,
        height_px: u32,
    },
    /// Terminal success state.
    Done(PageOutcome),
    /// Terminal failure state; processing of other pages continues.
    Failed { cause: String },
}

/// What a finished page produced.
#[derive(Debug)]
pub enum PageOutcome {
    /// Text taken from the page itself, no recognition run.
    ExtractedText { text: String },
    /// Recognized tokens with projected positions.
    Recognized { tokens: Vec<ProjectedToken> },
}

impl PageOutcome {
    /// The page's text, for text-mode output.
    pub fn text(&self) -> String {
        match self {
            Self::ExtractedText { text } => text.clone(),
            Self::Recognized { tokens } => {
                let plain: Vec<OcrToken> = tokens
                    .iter()
                    .map(|t| OcrToken {
                        text: t.text.clone(),
                        line: t.line,
                        x: t.x_pts,
                        y: t.y_pts,
                        width: t.width_pts,
                        height: t.height_pts,
                    })
                    .collect();
                tokens_to_text(&plain)
            }
        }
    }
}

/// Summary of one page after a run.
#[derive(Debug)]
pub struct PageReport {
    /// 0-based page index.
    pub index: u32,
    /// Terminal state the page reached.
    pub state: PageState,
}

/// Result of an OCR run over one document.
#[derive(Debug)]
pub struct OcrRunReport {
    pub output: PathBuf,
    pub pages: Vec<PageReport>,
    /// One warning per failed page.
    pub warnings: Vec<String>,
}

/// Drives the per-page state machine over whole documents.
pub struct OcrPipeline<'a, R: TextRecognizer> {
    recognizer: &'a R,
    /// Re-run recognition even when the page already carries text.
    force: bool,
}

impl<'a, R: TextRecognizer> OcrPipeline<'a, R> {
    pub fn new(recognizer: &'a R, force: bool) -> Self {
        Self { recognizer, force }
    }

    // -- Per-page state machine ----------------------------------------------

    /// Walk one page to a terminal state. Never returns a non-terminal state.
    #[instrument(skip(self, reader), fields(page = index))]
    pub fn process_page(&self, reader: &PdfReader, index: u32) -> PageState {
        let mut state = PageState::NeedsDecision;
        loop {
            state = match state {
                PageState::NeedsDecision => {
                    if !self.force && reader.has_extractable_text(index) {
                        match reader.extract_page_text(index) {
                            Ok(text) => PageState::TextExtracted { text },
                            Err(err) => PageState::Failed {
                                cause: err.to_string(),
                            },
                        }
                    } else {
                        PageState::NeedsRasterization
                    }
                }

                PageState::TextExtracted { text } => {
                    debug!("Using existing page text");
                    PageState::Done(PageOutcome::ExtractedText { text })
                }

                PageState::NeedsRasterization => {
                    match reader
                        .page_id(index)
                        .and_then(|page_id| extract_page_raster(reader.document(), page_id))
                    {
                        Ok(raster) => PageState::NeedsRecognition { raster },
                        Err(err) => PageState::Failed {
                            cause: err.to_string(),
                        },
                    }
                }

                PageState::NeedsRecognition { raster } => {
                    match self.recognizer.recognize(&raster.image) {
                        Ok(tokens) => PageState::NeedsProjection {
                            tokens,
                            width_px: raster.width_px,
                            height_px: raster.height_px,
                        },
                        Err(err) => PageState::Failed {
                            cause: err.to_string(),
                        },
                    }
                }

                PageState::NeedsProjection {
                    tokens,
                    width_px,
                    height_px,
                } => match reader.media_box(index) {
                    Ok(media_box) => {
                        let projected =
                            project_tokens(&tokens, width_px, height_px, &media_box);
                        PageState::Done(PageOutcome::Recognized { tokens: projected })
                    }
                    Err(err) => PageState::Failed {
                        cause: err.to_string(),
                    },
                },

                terminal @ (PageState::Done(_) | PageState::Failed { .. }) => {
                    return terminal;
                }
            };
        }
    }

    // -- Document drivers -----------------------------------------------------

    /// Run OCR over every page of `path` in the given mode.
    pub fn run(&self, path: impl AsRef<Path>, mode: OcrMode) -> Result<OcrRunReport> {
        match mode {
            OcrMode::Text(format) => self.run_text(path, format),
            OcrMode::SearchablePdf => self.run_searchable(path),
        }
    }

    /// Text mode: Done pages in page order, joined by the page-break marker.
    /// Empty pages occupy an empty slot; Failed pages are skipped with a
    /// warning. Writes `<stem>.ocr.<ext>` next to the source.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), ?format))]
    pub fn run_text(&self, path: impl AsRef<Path>, format: TextFormat) -> Result<OcrRunReport> {
        let path = path.as_ref();
        let reader = PdfReader::open(path)?;

        let (pages, warnings) = self.process_document(&reader);

        let slots: Vec<String> = pages
            .iter()
            .filter_map(|page| match &page.state {
                PageState::Done(outcome) => Some(outcome.text()),
                _ => None,
            })
            .collect();
        let combined = slots.join(format.page_break());

        let output = ocr_text_output_path(path, format);
        std::fs::write(&output, combined)?;

        info!(
            pages = pages.len(),
            failed = warnings.len(),
            output = %output.display(),
            "OCR text run complete"
        );
        Ok(OcrRunReport {
            output,
            pages,
            warnings,
        })
    }

    /// Searchable mode: appends an invisible text layer to every recognized
    /// page of a copy of the source, leaving the visible rendering
    /// unchanged. Writes `<stem>.searchable.pdf` next to the source.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn run_searchable(&self, path: impl AsRef<Path>) -> Result<OcrRunReport> {
        let path = path.as_ref();
        let reader = PdfReader::open(path)?;

        let (pages, warnings) = self.process_document(&reader);

        // Work on a second load of the same file so the reader's view stays
        // pristine while pages gain overlay streams.
        let mut document = Document::load(path)
            .map_err(|err| OmnidocError::Pdf(format!("failed to reload {}: {}", path.display(), err)))?;
        let page_ids = reader.page_ids();

        for page in &pages {
            if let PageState::Done(PageOutcome::Recognized { tokens }) = &page.state {
                let media_box = reader.media_box(page.index)?;
                let page_height = media_box[3] - media_box[1];
                overlay::add_invisible_text_layer(
                    &mut document,
                    page_ids[page.index as usize],
                    tokens,
                    page_height,
                )?;
            }
        }

        let output = searchable_output_path(path);
        document
            .save(&output)
            .map_err(|err| OmnidocError::Pdf(format!("failed to save searchable PDF: {}", err)))?;

        info!(
            pages = pages.len(),
            failed = warnings.len(),
            output = %output.display(),
            "Searchable PDF run complete"
        );
        Ok(OcrRunReport {
            output,
            pages,
            warnings,
        })
    }

    /// Run one mode over every `*.pdf` in `folder`, per-file isolation.
    pub fn run_folder(
        &self,
        folder: impl AsRef<Path>,
        mode: OcrMode,
        progress: impl FnMut(&BatchProgress),
    ) -> Result<BatchReport> {
        for_each_pdf(folder, |path| self.run(path, mode).map(|_| ()), progress)
    }

    /// Walk every page of an open document to its terminal state.
    fn process_document(&self, reader: &PdfReader) -> (Vec<PageReport>, Vec<String>) {
        let mut pages = Vec::with_capacity(reader.page_count());
        let mut warnings = Vec::new();

        for index in 0..reader.page_count() as u32 {
            let state = self.process_page(reader, index);
            if let PageState::Failed { cause } = &state {
                let message = format!("page {} failed: {}", index + 1, cause);
                warn!(page = index + 1, cause, "Page OCR failed, continuing");
                warnings.push(message);
            }
            pages.push(PageReport { index, state });
        }
        (pages, warnings)
    }
}

/// Scale token boxes from image-pixel space into page-point space.
///
/// The axes scale independently — `(page_width_pts / width_px,
/// page_height_pts / height_px)` — so non-square rasters project correctly.
pub fn project_tokens(
    tokens: &[OcrToken],
    width_px: u32,
    height_px: u32,
    media_box: &[f32; 4],
) -> Vec<ProjectedToken> {
    let page_width_pts = media_box[2] - media_box[0];
    let page_height_pts = media_box[3] - media_box[1];
    let sx = page_width_pts / width_px.max(1) as f32;
    let sy = page_height_pts / height_px.max(1) as f32;

    tokens
        .iter()
        .map(|token| ProjectedToken {
            text: token.text.clone(),
            line: token.line,
            x_pts: token.x * sx,
            y_pts: token.y * sy,
            width_pts: token.width * sx,
            height_pts: token.height * sy,
        })
        .collect()
}

/// `<stem>.ocr.<ext>` next to the source.
pub fn ocr_text_output_path(source: &Path, format: TextFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{stem}.ocr.{}", format.extension()))
}

/// `<stem>.searchable.pdf` next to the source.
pub fn searchable_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{stem}.searchable.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{build_scanned_pdf, build_test_pdf};
    use image::DynamicImage;
    use tempfile::TempDir;

    /// Recognizer returning a fixed token list.
    struct FixedRecognizer {
        tokens: Vec<OcrToken>,
    }

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<OcrToken>> {
            Ok(self.tokens.clone())
        }
    }

    /// Recognizer that always fails.
    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<OcrToken>> {
            Err(OmnidocError::Recognition {
                page: 0,
                message: "model exploded".into(),
            })
        }
    }

    fn word(text: &str, line: usize, x: f32, y: f32) -> OcrToken {
        OcrToken {
            text: text.to_string(),
            line,
            x,
            y,
            width: 60.0,
            height: 20.0,
        }
    }

    #[test]
    fn page_with_text_short_circuits_to_extracted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_test_pdf(1)).unwrap();

        let recognizer = FailingRecognizer;
        let pipeline = OcrPipeline::new(&recognizer, false);
        let reader = PdfReader::open(&path).unwrap();

        // The failing recognizer is never reached: the page has text.
        let state = pipeline.process_page(&reader, 0);
        assert!(matches!(
            state,
            PageState::Done(PageOutcome::ExtractedText { .. })
        ));
    }

    #[test]
    fn force_flag_bypasses_text_detection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_test_pdf(1)).unwrap();

        let recognizer = FailingRecognizer;
        let pipeline = OcrPipeline::new(&recognizer, true);
        let reader = PdfReader::open(&path).unwrap();

        // Forced OCR on a text page: no raster to extract, so it fails —
        // but through the rasterization path, not the text path.
        let state = pipeline.process_page(&reader, 0);
        assert!(matches!(state, PageState::Failed { .. }));
    }

    #[test]
    fn scanned_page_goes_through_recognition_and_projection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        // 200x400 px raster on a 600x800 pt page: sx = 3.0, sy = 2.0.
        std::fs::write(&path, build_scanned_pdf(200, 400, 600.0, 800.0)).unwrap();

        let recognizer = FixedRecognizer {
            tokens: vec![word("hello", 0, 10.0, 20.0)],
        };
        let pipeline = OcrPipeline::new(&recognizer, false);
        let reader = PdfReader::open(&path).unwrap();

        let state = pipeline.process_page(&reader, 0);
        let PageState::Done(PageOutcome::Recognized { tokens }) = state else {
            panic!("expected recognized outcome, got {state:?}");
        };
        assert_eq!(tokens.len(), 1);
        let token = &tokens[0];
        assert_eq!(token.x_pts, 30.0); // 10 * 3.0
        assert_eq!(token.y_pts, 40.0); // 20 * 2.0
        assert_eq!(token.width_pts, 180.0); // 60 * 3.0
        assert_eq!(token.height_pts, 40.0); // 20 * 2.0
    }

    #[test]
    fn text_mode_keeps_empty_page_slots() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, build_scanned_pdf(100, 100, 500.0, 500.0)).unwrap();

        // Zero tokens: the page is Done with empty text, not omitted.
        let recognizer = FixedRecognizer { tokens: Vec::new() };
        let pipeline = OcrPipeline::new(&recognizer, false);

        let report = pipeline.run_text(&path, TextFormat::Md).unwrap();
        assert_eq!(report.output, dir.path().join("scan.ocr.md"));
        assert!(report.warnings.is_empty());

        let text = std::fs::read_to_string(&report.output).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn failed_pages_are_skipped_with_warnings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, build_scanned_pdf(100, 100, 500.0, 500.0)).unwrap();

        let recognizer = FailingRecognizer;
        let pipeline = OcrPipeline::new(&recognizer, false);

        let report = pipeline.run_text(&path, TextFormat::Txt).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("page 1"));
        assert!(matches!(report.pages[0].state, PageState::Failed { .. }));
    }

    #[test]
    fn searchable_run_appends_layer_and_keeps_page_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, build_scanned_pdf(100, 100, 500.0, 500.0)).unwrap();

        let recognizer = FixedRecognizer {
            tokens: vec![word("findme", 0, 5.0, 5.0)],
        };
        let pipeline = OcrPipeline::new(&recognizer, false);

        let report = pipeline.run_searchable(&path).unwrap();
        assert_eq!(report.output, dir.path().join("scan.searchable.pdf"));

        let doc = Document::load(&report.output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        // The overlay stream is appended after the original content.
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(matches!(
            page.get(b"Contents"),
            Ok(lopdf::Object::Array(arr)) if arr.len() == 2
        ));
    }

    #[test]
    fn searchable_run_on_failed_page_keeps_original_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, build_scanned_pdf(100, 100, 500.0, 500.0)).unwrap();

        let recognizer = FailingRecognizer;
        let pipeline = OcrPipeline::new(&recognizer, false);

        let report = pipeline.run_searchable(&path).unwrap();
        assert_eq!(report.warnings.len(), 1);

        let doc = Document::load(&report.output).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        // No overlay: Contents stays a single reference.
        assert!(matches!(
            page.get(b"Contents"),
            Ok(lopdf::Object::Reference(_))
        ));
    }

    #[test]
    fn folder_run_isolates_per_file_failures() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.pdf"), build_test_pdf(1)).unwrap();
        std::fs::write(dir.path().join("z.pdf"), b"garbage").unwrap();

        let recognizer = FixedRecognizer { tokens: Vec::new() };
        let pipeline = OcrPipeline::new(&recognizer, false);

        let mut seen = Vec::new();
        let report = pipeline
            .run_folder(dir.path(), OcrMode::Text(TextFormat::Txt), |p| {
                seen.push(p.completed)
            })
            .unwrap();

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(seen, vec![1, 2]);
    }
}
