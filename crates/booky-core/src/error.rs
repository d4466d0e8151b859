// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Booky.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Booky operations.
#[derive(Debug, Error)]
pub enum BookyError {
    // -- Project directories --
    #[error("cannot list files in {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} failed for {}: {source}", path.display())]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no project directories found under {} and no start value given", root.display())]
    NoStartingPoint { root: PathBuf },

    #[error("no processed pages found in {}", path.display())]
    NoPages { path: PathBuf },

    // -- Document errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("no PDF chunks to merge in {}", path.display())]
    EmptyDocument { path: PathBuf },

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Orchestration --
    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BookyError {
    /// Wrap an I/O error with the operation and path it happened on.
    pub fn fs(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookyError>;
