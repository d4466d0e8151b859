// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — writing image chunks, merging them, and reading the result.

pub mod merge;
pub mod reader;
pub mod writer;

pub use merge::{MergeReport, PdfMerger, merge_chunks};
pub use reader::PdfReader;
pub use writer::PdfWriter;
