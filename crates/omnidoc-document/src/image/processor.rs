// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — crop, quarter-turn rotation, grayscale, and
// brightness/contrast/sharpness adjustment. Operates on in-memory images
// using the `image` and `imageproc` crates.

use image::{DynamicImage, ImageFormat};
use imageproc::filter::gaussian_blur_f32;
use omnidoc_core::Rotation;
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{debug, info, instrument};

/// Blur radius used as the soft baseline for the sharpness blend.
const SHARPNESS_SIGMA: f32 = 2.0;

/// Image processing primitives operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns
/// a new `ImageProcessor` wrapping the transformed image, enabling method
/// chaining.
///
/// ```ignore
/// let result = ImageProcessor::open("scan.jpg")?
///     .crop(10, 10, 800, 600)
///     .rotate(Rotation::Quarter)
///     .adjust_contrast(1.5)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            OmnidocError::Image(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| OmnidocError::Image(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x).max(1);
        let safe_h = height.min(img_h - safe_y).max(1);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    /// Rotate by a quarter-turn multiple (lossless).
    #[instrument(skip(self), fields(degrees = rotation.degrees()))]
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::None => self.image,
            Rotation::Quarter => self.image.rotate90(),
            Rotation::Half => self.image.rotate180(),
            Rotation::ThreeQuarter => self.image.rotate270(),
        };
        Self { image }
    }

    /// Convert the image to grayscale (luma).
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Scale brightness by a factor. 1.0 is the identity; values below 1.0
    /// darken, above brighten. Channels are clamped to [0, 255].
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_brightness(self, factor: f32) -> Self {
        if factor == 1.0 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let brightened = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let adjust = |channel: u8| -> u8 {
                (channel as f32 * factor).clamp(0.0, 255.0) as u8
            };
            image::Rgba([adjust(r), adjust(g), adjust(b), a])
        });
        Self {
            image: DynamicImage::ImageRgba8(brightened),
        }
    }

    /// Adjust contrast by a factor around the mid-gray pivot. 1.0 is the
    /// identity; values above 1.0 increase contrast.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        if factor == 1.0 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let contrasted = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let adjust = |channel: u8| -> u8 {
                let val = factor * (channel as f32 - 128.0) + 128.0;
                val.clamp(0.0, 255.0) as u8
            };
            image::Rgba([adjust(r), adjust(g), adjust(b), a])
        });
        Self {
            image: DynamicImage::ImageRgba8(contrasted),
        }
    }

    /// Adjust sharpness by blending against a Gaussian-blurred baseline:
    /// `out = blurred + factor * (original - blurred)`. 1.0 is the identity;
    /// below 1.0 softens, above 1.0 sharpens.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_sharpness(self, factor: f32) -> Self {
        if factor == 1.0 {
            return self;
        }

        let rgb = self.image.to_rgb8();
        let blurred = gaussian_blur_f32(&rgb, SHARPNESS_SIGMA);

        let sharpened = image::ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
            let image::Rgb(orig) = *rgb.get_pixel(x, y);
            let image::Rgb(soft) = *blurred.get_pixel(x, y);
            let mut out = [0u8; 3];
            for c in 0..3 {
                let val = soft[c] as f32 + factor * (orig[c] as f32 - soft[c] as f32);
                out[c] = val.clamp(0.0, 255.0) as u8;
            }
            image::Rgb(out)
        });
        Self {
            image: DynamicImage::ImageRgb8(sharpened),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| OmnidocError::Image(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            OmnidocError::Image(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}
