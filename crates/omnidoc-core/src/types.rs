// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Omnidoc toolkit.

use serde::{Deserialize, Serialize};

/// A quarter-turn page rotation, normalized to one of {0, 90, 180, 270}.
///
/// Rotations compose additively mod 360, both with each other and with the
/// `/Rotate` value already stored on a PDF page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Build from a degree value; any multiple of 90 (including negatives)
    /// is accepted and normalized.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(match degrees.rem_euclid(360) {
            0 => Self::None,
            90 => Self::Quarter,
            180 => Self::Half,
            _ => Self::ThreeQuarter,
        })
    }

    /// Normalized degree value in {0, 90, 180, 270}.
    pub fn degrees(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    /// Compose two rotations (mod-360 addition).
    pub fn compose(self, other: Self) -> Self {
        // Both operands are multiples of 90, so the sum always normalizes.
        Self::from_degrees(self.degrees() + other.degrees())
            .unwrap_or(Self::None)
    }
}

/// A closed interval of 1-based page numbers, as written by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// The 1-based page numbers in this range, in order.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.start..=self.end
    }

    /// Number of pages covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false // start <= end is guaranteed by the parser
    }
}

/// Parsed result of a user page-range expression: the explicit groups in the
/// order (and with the duplicates) the user wrote them, plus the implicit
/// leftover group of uncovered pages in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    pub groups: Vec<PageRange>,
    pub leftover: Vec<u32>,
    /// Page count of the source document the set was validated against.
    pub page_count: u32,
}

impl RangeSet {
    /// All explicit page numbers flattened in group order, duplicates kept.
    pub fn explicit_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.iter().flat_map(|g| g.pages())
    }
}

/// One entry of a reorder request: which original page goes next in the
/// output, and the rotation delta to compose onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderEntry {
    /// 1-based page number in the source document.
    pub page_number: u32,
    pub rotation: Rotation,
}

/// Ordered reorder/rotate instructions as captured by the reorder editor.
///
/// Deliberately permissive: pages the caller omits are dropped from the
/// output, pages repeated are duplicated. Length need not match the source
/// page count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderSpec {
    pub entries: Vec<ReorderEntry>,
}

impl ReorderSpec {
    pub fn new(entries: Vec<ReorderEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Plain-text output flavours for text conversion and OCR text mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextFormat {
    Txt,
    Md,
}

impl TextFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Md => "md",
        }
    }

    /// Marker inserted between consecutive pages. Empty pages still occupy
    /// a slot, so the marker count is stable regardless of content.
    pub fn page_break(self) -> &'static str {
        match self {
            Self::Txt => "\n\u{0C}\n",
            Self::Md => "\n\n---\n\n",
        }
    }
}

/// Crop rectangle in image pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scan-cleanup adjustment parameters.
///
/// Multipliers follow enhancement-factor semantics: brightness and sharpness
/// are identity at 1.0; contrast pivots at mid-gray so 1.0 is identity and
/// the 1.5 default visibly boosts document contrast. Valid range for each
/// multiplier is (0, 3.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustSettings {
    pub crop: Option<CropRect>,
    /// Quarter-turn rotation applied after cropping.
    pub rotation: Rotation,
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
}

impl Default for AdjustSettings {
    fn default() -> Self {
        Self {
            crop: None,
            rotation: Rotation::None,
            brightness: 1.0,
            contrast: 1.5,
            sharpness: 1.0,
        }
    }
}

/// Upper bound for adjustment multipliers.
pub const ADJUST_FACTOR_MAX: f32 = 3.0;

impl AdjustSettings {
    /// Check all multipliers fall in (0, ADJUST_FACTOR_MAX].
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("sharpness", self.sharpness),
        ] {
            if !(value > 0.0 && value <= ADJUST_FACTOR_MAX) {
                return Err(format!(
                    "{name} must be in (0, {ADJUST_FACTOR_MAX}], got {value}"
                ));
            }
        }
        Ok(())
    }
}

/// Standard paper sizes for generated PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_from_degrees_normalizes() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Quarter));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Quarter));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::ThreeQuarter));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn rotation_composes_mod_360() {
        let r = Rotation::Quarter;
        let full = r.compose(r).compose(r).compose(r);
        assert_eq!(full, Rotation::None);
        assert_eq!(Rotation::Half.compose(Rotation::Half), Rotation::None);
        assert_eq!(
            Rotation::ThreeQuarter.compose(Rotation::Half),
            Rotation::Quarter
        );
    }

    #[test]
    fn adjust_defaults_match_scan_editor() {
        let s = AdjustSettings::default();
        assert_eq!(s.brightness, 1.0);
        assert_eq!(s.contrast, 1.5);
        assert_eq!(s.sharpness, 1.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn adjust_rejects_out_of_range_factors() {
        let mut s = AdjustSettings::default();
        s.brightness = 0.0;
        assert!(s.validate().is_err());
        s.brightness = 3.5;
        assert!(s.validate().is_err());
        s.brightness = 3.0;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn page_break_markers_differ_by_format() {
        assert!(TextFormat::Md.page_break().contains("---"));
        assert!(TextFormat::Txt.page_break().contains('\u{0C}'));
    }
}
