// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan workflow: cleanup enhancement for photographed pages and the session
// that assembles processed pages into a single PDF.

pub mod enhance;
pub mod session;
