// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON payload types for the two browser editors (reorder, scan cleanup).
//
// Transport is the collaborator's job; these types only fix the wire shapes
// and convert validated payloads into core types. Numeric fields arrive as
// strings in the reorder protocol because the editor serializes DOM
// attributes verbatim.

use serde::{Deserialize, Serialize};

use crate::error::OmnidocError;
use crate::types::{AdjustSettings, CropRect, ReorderEntry, ReorderSpec, Rotation};

// -- Reorder editor -----------------------------------------------------------

/// One page slot as posted by the reorder editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEntry {
    /// 1-based page number, as a string.
    #[serde(rename = "pageNum")]
    pub page_num: String,
    /// Rotation in degrees, one of "0" | "90" | "180" | "270".
    pub rotation: String,
}

/// Full reorder request body: the new page order with per-page rotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<OrderEntry>,
}

impl ReorderRequest {
    /// Validate the string fields and convert into a [`ReorderSpec`].
    pub fn into_spec(self) -> Result<ReorderSpec, OmnidocError> {
        let mut entries = Vec::with_capacity(self.order.len());
        for item in self.order {
            let page_number: u32 = item.page_num.trim().parse().map_err(|_| {
                OmnidocError::Pdf(format!("invalid page number '{}' in order", item.page_num))
            })?;
            let degrees: i64 = item.rotation.trim().parse().map_err(|_| {
                OmnidocError::Pdf(format!("invalid rotation '{}' in order", item.rotation))
            })?;
            let rotation = Rotation::from_degrees(degrees).ok_or_else(|| {
                OmnidocError::Pdf(format!("rotation {degrees} is not a multiple of 90"))
            })?;
            entries.push(ReorderEntry {
                page_number,
                rotation,
            });
        }
        Ok(ReorderSpec::new(entries))
    }
}

// -- Scan editor --------------------------------------------------------------

/// Request to process a single scanned image with the given adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProcessRequest {
    pub image_path: String,
    pub crop_coords: Option<CropRect>,
    #[serde(default = "default_brightness")]
    pub brightness: f32,
    #[serde(default = "default_contrast")]
    pub contrast: f32,
    #[serde(default = "default_sharpness")]
    pub sharpness: f32,
    /// Rotation in degrees, a multiple of 90.
    #[serde(default)]
    pub rotation: i64,
    pub output_folder: Option<String>,
}

fn default_brightness() -> f32 {
    1.0
}

fn default_contrast() -> f32 {
    1.5
}

fn default_sharpness() -> f32 {
    1.0
}

impl ScanProcessRequest {
    /// Convert into validated [`AdjustSettings`].
    pub fn to_settings(&self) -> Result<AdjustSettings, OmnidocError> {
        let rotation = Rotation::from_degrees(self.rotation).ok_or_else(|| {
            OmnidocError::Image(format!(
                "rotation must be a multiple of 90, got {}",
                self.rotation
            ))
        })?;
        let settings = AdjustSettings {
            crop: self.crop_coords,
            rotation,
            brightness: self.brightness,
            contrast: self.contrast,
            sharpness: self.sharpness,
        };
        settings.validate().map_err(OmnidocError::Image)?;
        Ok(settings)
    }
}

/// Request to assemble all processed images of the session into one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizePdfRequest {
    pub output_folder: Option<String>,
}

// -- Responses ----------------------------------------------------------------

/// Uniform response envelope for both editors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".into(),
            message: None,
            output_path: None,
        }
    }

    pub fn success_with_output(output_path: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: None,
            output_path: Some(output_path.into()),
        }
    }

    /// Structured failure: machine-readable kind plus human-oriented message.
    pub fn error(err: &OmnidocError) -> Self {
        Self {
            status: "error".into(),
            message: Some(format!("{}: {err}", err.kind())),
            output_path: None,
        }
    }
}
