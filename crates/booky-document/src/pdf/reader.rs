// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents using the `lopdf` crate.
// Used to verify chunks and the published document.

use std::path::Path;

use booky_core::{BookyError, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument};

/// Read-only view of a PDF file.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            BookyError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            BookyError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        Ok(Self { document })
    }

    pub(crate) fn into_document(self) -> Document {
        self.document
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// The `/Title` entry of the document information dictionary, decoded
    /// from PDFDocEncoding or UTF-16BE.
    pub fn title(&self) -> Option<String> {
        let info_id = self.document.trailer.get(b"Info").ok()?.as_reference().ok()?;
        let info = self.document.get_dictionary(info_id).ok()?;
        match info.get(b"Title").ok()? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }

    /// Width and height in points of every page, in page order.
    ///
    /// Reads `/MediaBox` from the page or, when inherited, from its parent.
    pub fn page_sizes(&self) -> Vec<(f32, f32)> {
        self.document
            .get_pages()
            .values()
            .filter_map(|&page_id| self.media_box(page_id))
            .collect()
    }

    fn media_box(&self, page_id: ObjectId) -> Option<(f32, f32)> {
        let page = self.document.get_dictionary(page_id).ok()?;
        let media_box = match page.get(b"MediaBox") {
            Ok(found) => found,
            Err(_) => {
                let parent = page.get(b"Parent").ok()?.as_reference().ok()?;
                self.document.get_dictionary(parent).ok()?.get(b"MediaBox").ok()?
            }
        };
        let values = match media_box {
            Object::Array(values) => values,
            Object::Reference(id) => self.document.get_object(*id).ok()?.as_array().ok()?,
            _ => return None,
        };
        let coords: Vec<f32> = values.iter().filter_map(number).collect();
        match coords.as_slice() {
            [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => None,
        }
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte order mark,
/// otherwise treated as (mostly ASCII) PDFDocEncoding.
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
