// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization for OCR.
//
// The stack carried here has no vector renderer, so "rasterize" means
// extracting the page's dominant embedded image XObject — which is exactly
// what a scanned page is: one full-page raster. JPEG (DCTDecode) streams are
// decoded with the `image` crate; uncompressed or Flate-compressed gray/RGB
// streams are interpreted straight from the stream dictionary. Pages without
// a usable embedded raster fail recognition for that page only.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Document, Object, ObjectId};
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{debug, instrument};

/// A page raster ready for recognition.
pub struct PageRaster {
    pub image: DynamicImage,
    pub width_px: u32,
    pub height_px: u32,
}

impl std::fmt::Debug for PageRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRaster")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish_non_exhaustive()
    }
}

/// Extract the dominant (largest-area) embedded image of a page.
#[instrument(skip(doc), fields(?page_id))]
pub fn extract_page_raster(doc: &Document, page_id: ObjectId) -> Result<PageRaster> {
    let images = image_xobjects(doc, page_id)?;

    let (name, stream_id) = images
        .into_iter()
        .max_by_key(|(_, id)| {
            image_dimensions(doc, *id)
                .map(|(w, h)| w as u64 * h as u64)
                .unwrap_or(0)
        })
        .ok_or_else(|| {
            OmnidocError::Pdf("page has no embedded image to rasterize".to_string())
        })?;

    debug!(name = %String::from_utf8_lossy(&name), "Decoding page image");
    decode_image_stream(doc, stream_id)
}

/// Collect (name, object id) of every image XObject in the page resources.
fn image_xobjects(doc: &Document, page_id: ObjectId) -> Result<Vec<(Vec<u8>, ObjectId)>> {
    let page = doc
        .get_object(page_id)
        .ok()
        .and_then(|obj| obj.as_dict().ok())
        .ok_or_else(|| OmnidocError::Pdf(format!("page object {:?} is not a dictionary", page_id)))?;

    let resources = match page.get(b"Resources") {
        Ok(obj) => resolve_dict(doc, obj)?,
        Err(_) => return Ok(Vec::new()),
    };

    let xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve_dict(doc, obj)?,
        Err(_) => return Ok(Vec::new()),
    };

    let mut images = Vec::new();
    for (name, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name().ok())
            .map(|n| n == b"Image".as_slice())
            .unwrap_or(false);
        if is_image {
            images.push((name.clone(), *id));
        }
    }
    Ok(images)
}

/// Resolve an object that may be an inline dictionary or a reference to one.
fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a lopdf::Dictionary> {
    match obj {
        Object::Dictionary(dict) => Ok(dict),
        Object::Reference(id) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| OmnidocError::Pdf(format!("unresolvable dictionary reference {:?}", id))),
        _ => Err(OmnidocError::Pdf("expected dictionary object".to_string())),
    }
}

fn image_dimensions(doc: &Document, stream_id: ObjectId) -> Option<(i64, i64)> {
    let Ok(Object::Stream(stream)) = doc.get_object(stream_id) else {
        return None;
    };
    let width = stream.dict.get(b"Width").ok()?.as_i64().ok()?;
    let height = stream.dict.get(b"Height").ok()?.as_i64().ok()?;
    Some((width, height))
}

/// Decode an image XObject stream into a [`PageRaster`].
fn decode_image_stream(doc: &Document, stream_id: ObjectId) -> Result<PageRaster> {
    let Ok(Object::Stream(stream)) = doc.get_object(stream_id) else {
        return Err(OmnidocError::Pdf(format!(
            "image object {:?} is not a stream",
            stream_id
        )));
    };

    let (width, height) = image_dimensions(doc, stream_id)
        .ok_or_else(|| OmnidocError::Pdf("image stream missing Width/Height".to_string()))?;
    let (width, height) = (width as u32, height as u32);

    let image = if has_filter(&stream.dict, b"DCTDecode") {
        // JPEG-compressed: hand the raw stream to the image decoder.
        image::load_from_memory(&stream.content).map_err(|err| {
            OmnidocError::Image(format!("embedded JPEG decode failed: {}", err))
        })?
    } else {
        // Uncompressed or Flate-compressed raw samples.
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        raw_samples_to_image(&stream.dict, &data, width, height)?
    };

    debug!(width, height, "Page raster extracted");
    Ok(PageRaster {
        width_px: image.width(),
        height_px: image.height(),
        image,
    })
}

/// Whether the stream's `/Filter` entry (name or array) names `filter`.
fn has_filter(dict: &lopdf::Dictionary, filter: &[u8]) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name.as_slice() == filter,
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| matches!(f, Object::Name(name) if name.as_slice() == filter)),
        _ => false,
    }
}

/// Interpret raw 8-bit samples according to the stream's color space.
fn raw_samples_to_image(
    dict: &lopdf::Dictionary,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<DynamicImage> {
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|b| b.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return Err(OmnidocError::Image(format!(
            "unsupported bits per component: {bits}"
        )));
    }

    let color_space: &[u8] = match dict.get(b"ColorSpace") {
        Ok(Object::Name(name)) => name.as_slice(),
        Ok(_) => {
            return Err(OmnidocError::Image(
                "unsupported non-name color space".to_string(),
            ));
        }
        Err(_) => b"DeviceGray",
    };

    let pixel_count = (width * height) as usize;
    match color_space {
        b"DeviceGray" => {
            if data.len() < pixel_count {
                return Err(OmnidocError::Image(format!(
                    "grayscale image data too short: {} < {}",
                    data.len(),
                    pixel_count
                )));
            }
            let gray = GrayImage::from_raw(width, height, data[..pixel_count].to_vec())
                .ok_or_else(|| OmnidocError::Image("grayscale buffer mismatch".to_string()))?;
            Ok(DynamicImage::ImageLuma8(gray))
        }
        b"DeviceRGB" => {
            let needed = pixel_count * 3;
            if data.len() < needed {
                return Err(OmnidocError::Image(format!(
                    "RGB image data too short: {} < {}",
                    data.len(),
                    needed
                )));
            }
            let rgb = RgbImage::from_raw(width, height, data[..needed].to_vec())
                .ok_or_else(|| OmnidocError::Image("RGB buffer mismatch".to_string()))?;
            Ok(DynamicImage::ImageRgb8(rgb))
        }
        other => Err(OmnidocError::Image(format!(
            "unsupported color space: {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::testutil::{build_scanned_pdf, build_test_pdf};

    #[test]
    fn scanned_page_yields_its_embedded_image() {
        let bytes = build_scanned_pdf(120, 160, 612.0, 792.0);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let page_id = reader.page_id(0).unwrap();

        let raster = extract_page_raster(reader.document(), page_id).unwrap();
        assert_eq!((raster.width_px, raster.height_px), (120, 160));
        // Mid-gray fill survives the round trip.
        assert_eq!(raster.image.to_luma8().get_pixel(10, 10).0[0], 0x80);
    }

    #[test]
    fn text_only_page_has_no_raster() {
        let bytes = build_test_pdf(1);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let page_id = reader.page_id(0).unwrap();

        let err = extract_page_raster(reader.document(), page_id).unwrap_err();
        assert!(matches!(err, OmnidocError::Pdf(_)));
    }
}
