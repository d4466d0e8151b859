// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF merger — concatenates chunk PDFs into the final document and stamps its
// title, using the `lopdf` crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use booky_core::{BookyError, Result, list_files, sort_by_order_key};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::reader::PdfReader;

/// Appends the pages of several PDFs into one document.
///
/// The first document appended becomes the base; pages of later documents are
/// deep-copied into it in order.
#[derive(Default)]
pub struct PdfMerger {
    merged: Option<Document>,
    sources: usize,
}

/// Outcome of merging a directory of chunks.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub chunks: usize,
    pub pages: usize,
    pub output: PathBuf,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages collected so far.
    pub fn page_count(&self) -> usize {
        self.merged
            .as_ref()
            .map_or(0, |doc| doc.get_pages().len())
    }

    /// Append every page of the PDF at `path`.
    pub fn append_file(&mut self, path: &Path) -> Result<()> {
        let document = PdfReader::open(path)?.into_document();
        self.append(document)
    }

    /// Append every page of an in-memory PDF.
    pub fn append_bytes(&mut self, data: &[u8]) -> Result<()> {
        let document = PdfReader::from_bytes(data)?.into_document();
        self.append(document)
    }

    fn append(&mut self, document: Document) -> Result<()> {
        self.sources += 1;
        match &mut self.merged {
            Some(merged) => {
                let mut cloned = HashMap::new();
                for page_id in document.get_pages().into_values() {
                    clone_page_into(&document, merged, page_id, &mut cloned)?;
                }
            }
            slot @ None => *slot = Some(document),
        }
        Ok(())
    }

    /// Set the title, drop stale XMP metadata and serialise the result.
    #[instrument(skip(self), fields(sources = self.sources))]
    pub fn finish(self, title: &str) -> Result<Vec<u8>> {
        let mut merged = self
            .merged
            .ok_or_else(|| BookyError::PdfError("nothing to merge".into()))?;

        set_title(&mut merged, title)?;
        drop_xmp_metadata(&mut merged);

        let mut output = Vec::new();
        merged.save_to(&mut output).map_err(|err| {
            BookyError::PdfError(format!("failed to serialise merged PDF: {}", err))
        })?;

        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }
}

/// Merge every `*.pdf` in `dir`, ordered by file name number, into `output`.
///
/// `output` must lie outside `dir`; a file there would be taken for a chunk.
#[instrument(skip_all, fields(dir = %dir.display(), title = %title))]
pub fn merge_chunks(dir: &Path, title: &str, output: &Path) -> Result<MergeReport> {
    if output.parent() == Some(dir) {
        return Err(BookyError::InvalidConfig(format!(
            "merged PDF {} would be written among its own chunks",
            output.display()
        )));
    }

    let mut chunks = list_files(dir, Some("pdf"))?;
    if chunks.is_empty() {
        return Err(BookyError::EmptyDocument {
            path: dir.to_path_buf(),
        });
    }
    sort_by_order_key(&mut chunks);

    let mut merger = PdfMerger::new();
    for chunk in &chunks {
        merger.append_file(chunk)?;
        debug!(chunk = %chunk.display(), pages = merger.page_count(), "Chunk appended");
    }

    let pages = merger.page_count();
    let bytes = merger.finish(title)?;
    std::fs::write(output, &bytes).map_err(|err| BookyError::fs("write PDF", output, err))?;

    info!(chunks = chunks.len(), pages, output = %output.display(), "PDF chunks merged");
    Ok(MergeReport {
        chunks: chunks.len(),
        pages,
        output: output.to_path_buf(),
    })
}

// -- Metadata -------------------------------------------------------------------

/// Encode a title as a PDF text string: a literal for ASCII, UTF-16BE with a
/// byte order mark otherwise.
fn text_string(title: &str) -> Object {
    if title.is_ascii() {
        return Object::string_literal(title);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn set_title(document: &mut Document, title: &str) -> Result<()> {
    let existing = document
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| info.as_reference().ok());

    let info_id = match existing {
        Some(id) => id,
        None => {
            let id = document.add_object(Dictionary::new());
            document.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let info = document.get_dictionary_mut(info_id).map_err(|err| {
        BookyError::PdfError(format!("document information is not a dictionary: {}", err))
    })?;
    info.set("Title", text_string(title));
    Ok(())
}

/// The catalog's XMP stream still describes the first chunk; remove it so
/// readers fall back to the /Info title.
fn drop_xmp_metadata(document: &mut Document) {
    let root = document
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| root.as_reference().ok());
    let Some(root) = root else {
        warn!("Merged PDF has no catalog reference");
        return;
    };
    if let Ok(catalog) = document.get_dictionary_mut(root) {
        if catalog.remove(b"Metadata").is_some() {
            debug!("Stale XMP metadata removed");
        }
    }
}

// -- Page cloning -----------------------------------------------------------------

/// Clone a single page object (and its referenced resources) from `source` into
/// `target`, appending it as the last page.
///
/// `cloned` maps source object ids to their copies so resources shared between
/// pages of one source are copied once.
fn clone_page_into(
    source: &Document,
    target: &mut Document,
    page_id: ObjectId,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<()> {
    let page_object = source.get_object(page_id).map_err(|err| {
        BookyError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
    })?;
    let page_object = inherit_page_attributes(source, page_object);
    let copy = deep_clone_object(source, target, &page_object, cloned)?;
    let cloned_id = target.add_object(copy);

    let pages_id = target
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|err| BookyError::PdfError(format!("no /Pages node: {}", err)))?;

    let pages_dict = target
        .get_dictionary_mut(pages_id)
        .map_err(|err| BookyError::PdfError(format!("/Pages is not a dictionary: {}", err)))?;
    match pages_dict.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.push(Object::Reference(cloned_id)),
        _ => return Err(BookyError::PdfError("/Pages has no /Kids array".into())),
    }
    if let Ok(Object::Integer(count)) = pages_dict.get_mut(b"Count") {
        *count += 1;
    }

    if let Ok(page_dict) = target.get_dictionary_mut(cloned_id) {
        page_dict.set("Parent", Object::Reference(pages_id));
    }

    Ok(())
}

/// Copy `/MediaBox` and `/Resources` from the parent node onto the page when
/// the page inherits them; the page loses its parent in the target.
fn inherit_page_attributes(source: &Document, page: &Object) -> Object {
    let mut page = page.clone();
    let Object::Dictionary(dict) = &mut page else {
        return page;
    };
    let parent = dict
        .get(b"Parent")
        .ok()
        .and_then(|parent| parent.as_reference().ok())
        .and_then(|id| source.get_dictionary(id).ok());
    if let Some(parent) = parent {
        for key in [&b"MediaBox"[..], &b"Resources"[..]] {
            if !dict.has(key) {
                if let Ok(value) = parent.get(key) {
                    dict.set(key.to_vec(), value.clone());
                }
            }
        }
    }
    page
}

/// Deep-clone a single lopdf Object, recursively resolving references (except
/// /Parent, which the caller patches).
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => Ok(Object::Dictionary(clone_dictionary(
            source, target, dict, cloned,
        )?)),
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(deep_clone_object(source, target, item, cloned)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => {
            if let Some(existing) = cloned.get(ref_id) {
                return Ok(Object::Reference(*existing));
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    // Reserve the id first so reference cycles terminate.
                    let new_id = target.new_object_id();
                    cloned.insert(*ref_id, new_id);
                    let copy = deep_clone_object(source, target, referenced, cloned)?;
                    target.objects.insert(new_id, copy);
                    Ok(Object::Reference(new_id))
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Ok(Object::Null)
                }
            }
        }
        Object::Stream(stream) => {
            let dict = clone_dictionary(source, target, &stream.dict, cloned)?;
            let mut copy = lopdf::Stream::new(dict, stream.content.clone());
            copy.allows_compression = stream.allows_compression;
            Ok(Object::Stream(copy))
        }
        other => Ok(other.clone()),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_clone_object(source, target, value, cloned)?);
    }
    Ok(new_dict)
}
