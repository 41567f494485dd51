// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement — adaptive binarization for the "scanned document look",
// applied after the adjustment pipeline when the caller asks for it.

use image::{DynamicImage, GrayImage, Luma};
use tracing::{debug, info, instrument};

/// Enhances scanned document images for crisp black-and-white output.
///
/// Wraps a working image and offers adaptive (local-mean) binarization plus
/// a global Otsu fallback.
pub struct ScanEnhancer {
    /// The working image.
    image: DynamicImage,
}

impl ScanEnhancer {
    /// Wrap an existing `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Borrow the current working image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the enhancer and return the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Apply adaptive thresholding to produce a black-and-white image.
    ///
    /// Uses a local mean approach: for each pixel, the threshold is the mean
    /// intensity within a `block_radius` neighbourhood, minus a constant `c`.
    /// Pixels darker than the local threshold become black; others become
    /// white. A typical `block_radius` is 15 and `c` is 10.
    #[instrument(skip(self), fields(block_radius, c))]
    pub fn binarize(self, block_radius: u32, c: i32) -> Self {
        info!(block_radius, c, "Applying adaptive binarization");

        let gray = self.image.to_luma8();
        let (width, height) = gray.dimensions();

        // Integral image for fast local mean calculation.
        let integral = compute_integral_image(&gray);

        let mut output = GrayImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let local_mean = region_mean(&integral, width, height, x, y, block_radius);
                let threshold = (local_mean as i32 - c).clamp(0, 255) as u8;
                let pixel_val = gray.get_pixel(x, y).0[0];
                let binary = if pixel_val < threshold { 0u8 } else { 255u8 };
                output.put_pixel(x, y, Luma([binary]));
            }
        }

        debug!("Binarization complete");
        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// Global binarization with the threshold computed from the image
    /// histogram via Otsu's method.
    #[instrument(skip(self))]
    pub fn binarize_otsu(self) -> Self {
        info!("Applying Otsu binarization");

        let gray = self.image.to_luma8();
        let threshold = otsu_threshold(&gray);
        debug!(threshold, "Otsu threshold computed");

        let (width, height) = gray.dimensions();
        let mut output = GrayImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let val = gray.get_pixel(x, y).0[0];
                let binary = if val < threshold { 0u8 } else { 255u8 };
                output.put_pixel(x, y, Luma([binary]));
            }
        }

        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// The standard document cleanup: grayscale, then adaptive binarization
    /// with the typical parameters.
    #[instrument(skip(self))]
    pub fn enhance_scan(self) -> Self {
        info!("Running scan enhancement");
        let gray = Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        };
        gray.binarize(15, 10)
    }
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Compute the mean pixel value within a square region centred on (cx, cy)
/// with the given radius, using the precomputed integral image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    // Clamp the region to image bounds.
    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // Summed-area table lookup: S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Finds the threshold value that minimises the intra-class variance of the
/// black and white pixel groups.
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let mut sum_total: f64 = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += i as f64 * count as f64;
    }

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Half-dark, half-light test image with a clean bimodal histogram.
    fn bimodal_image() -> DynamicImage {
        let mut img = GrayImage::from_pixel(40, 40, Luma([40u8]));
        for y in 0..40 {
            for x in 20..40 {
                img.put_pixel(x, y, Luma([220u8]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn otsu_threshold_splits_bimodal_histogram() {
        let img = bimodal_image().to_luma8();
        let threshold = otsu_threshold(&img);
        assert!(
            (40..=220).contains(&threshold),
            "threshold {threshold} outside the two modes"
        );
    }

    #[test]
    fn binarize_otsu_outputs_pure_black_and_white() {
        let enhanced = ScanEnhancer::from_dynamic(bimodal_image()).binarize_otsu();
        let out = enhanced.into_dynamic().to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn adaptive_binarize_keeps_dimensions() {
        let enhanced = ScanEnhancer::from_dynamic(bimodal_image()).binarize(15, 10);
        let out = enhanced.into_dynamic();
        assert_eq!((out.width(), out.height()), (40, 40));
    }

    #[test]
    fn region_mean_of_uniform_image_is_the_pixel_value() {
        let img = GrayImage::from_pixel(10, 10, Luma([100u8]));
        let integral = compute_integral_image(&img);
        let mean = region_mean(&integral, 10, 10, 5, 5, 3);
        assert!((mean - 100.0).abs() < 1e-9);
    }

    #[test]
    fn enhance_scan_produces_binary_output() {
        let enhanced = ScanEnhancer::from_dynamic(bimodal_image()).enhance_scan();
        let out = enhanced.into_dynamic().to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}
