// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// booky-document — Document processing for Booky.
//
// Provides page image enhancement and canvas layout, image-to-PDF chunk
// writing, chunk merging with title metadata, and the external OCR stage.

pub mod image;
pub mod ocr;
pub mod pdf;

// Re-export the primary structs so callers can use `booky_document::PdfMerger` etc.
pub use image::processor::ImageProcessor;
pub use ocr::OcrRunner;
pub use pdf::merge::{MergeReport, PdfMerger, merge_chunks};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
