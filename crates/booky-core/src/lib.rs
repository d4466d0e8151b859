// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booky — Core types, configuration, errors, and the two filesystem primitives
// (ordering and discovery) shared across all crates.

pub mod config;
pub mod discovery;
pub mod error;
pub mod human_errors;
pub mod ordering;
pub mod types;

pub use config::{OcrSettings, PipelineSettings, ProcessConfig};
pub use discovery::list_files;
pub use error::{BookyError, Result};
pub use ordering::{order_key, sort_by_order_key};
pub use types::*;
