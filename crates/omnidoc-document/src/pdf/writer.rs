// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — create new PDF documents from raster images using `printpdf`
// 0.8. Used by the scan session to assemble processed page images.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use omnidoc_core::PaperSize;
use omnidoc_core::error::{OmnidocError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Creates new PDF documents from raster images.
pub struct PdfWriter {
    /// Paper size for page creation.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Create a new writer defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Create a single-page PDF containing the given image.
    #[instrument(skip(self, image_bytes), fields(bytes_len = image_bytes.len()))]
    pub fn create_from_image(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        self.create_from_images(std::slice::from_ref(&image_bytes))
    }

    /// Create a PDF with one page per input image, in input order.
    ///
    /// Each image is scaled to fit within the page margins while preserving
    /// its aspect ratio, and centered on its page.
    #[instrument(skip_all, fields(image_count = images.len()))]
    pub fn create_from_images(&self, images: &[impl AsRef<[u8]>]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(OmnidocError::NoInputs);
        }

        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Omnidoc Scan");

        info!(paper = ?self.paper_size, title, pages = images.len(), "Creating image PDF");

        let mut doc = PdfDocument::new(title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for (index, image_bytes) in images.iter().enumerate() {
            let image_bytes = image_bytes.as_ref();

            // Decode the image to get its dimensions and pixel data.
            let dynamic_image = ::image::load_from_memory(image_bytes).map_err(|err| {
                OmnidocError::Image(format!(
                    "failed to decode image {} for PDF: {}",
                    index + 1,
                    err
                ))
            })?;

            let img_width = dynamic_image.width() as usize;
            let img_height = dynamic_image.height() as usize;

            // Convert to RGB8 for printpdf.
            let rgb_image = dynamic_image.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb_image.into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };

            let xobject_id = doc.add_image(&raw);

            // Compute transform to place the image on the page with margins.
            let margin_mm: f32 = 15.0;
            let usable_w_pt = Mm(page_w.0 - 2.0 * margin_mm).into_pt().0;
            let usable_h_pt = Mm(page_h.0 - 2.0 * margin_mm).into_pt().0;

            // Image native size at a default DPI of 150 (reasonable for print).
            let dpi: f32 = 150.0;
            let img_w_pt = img_width as f32 / dpi * 72.0;
            let img_h_pt = img_height as f32 / dpi * 72.0;

            // Scale to fit while preserving aspect ratio; do not upscale.
            let scale_x = usable_w_pt / img_w_pt;
            let scale_y = usable_h_pt / img_h_pt;
            let scale = scale_x.min(scale_y).min(1.0);

            let rendered_w_pt = img_w_pt * scale;
            let rendered_h_pt = img_h_pt * scale;

            // Centre the image on the page.
            let margin_pt = Mm(margin_mm).into_pt().0;
            let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
            let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(x_offset)),
                    translate_y: Some(Pt(y_offset)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(dpi),
                    rotate: None,
                },
            }];

            pages.push(PdfPage::new(page_w, page_h, ops));
            debug!(page = index + 1, rendered_w_pt, rendered_h_pt, scale, "Image placed");
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        Ok(output)
    }

    /// Create an image PDF and write it directly to a file.
    pub fn write_images_to_file(
        &self,
        images: &[impl AsRef<[u8]>],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.create_from_images(images)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote image PDF to {}", path.as_ref().display());
        Ok(())
    }
}
