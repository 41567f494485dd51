// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image subsystem: the low-level processor primitives and the fixed-order
// adjustment pipeline used by the scan workflow.

pub mod adjust;
pub mod processor;
