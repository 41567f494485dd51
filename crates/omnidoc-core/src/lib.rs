// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Omnidoc — Core types, error definitions, and editor protocol payloads
// shared across all crates.

pub mod config;
pub mod error;
pub mod protocol;
pub mod types;

pub use config::AppConfig;
pub use error::OmnidocError;
pub use types::*;
