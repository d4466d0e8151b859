// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The stages of a process run. Each stage completes before the next starts.

use std::path::{Path, PathBuf};

use booky_core::{Adjustments, BookyError, PipelineSettings, Result};
use booky_document::image::enhance_file;
use booky_document::{OcrRunner, PdfWriter};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::pool::WorkerPool;

// -- Image postprocessing ---------------------------------------------------------

/// Enhance (or copy, for identity adjustments) every page into `dest`, keeping
/// file names. Returns the written paths in input order.
#[instrument(skip_all, fields(pages = files.len(), brightness = adjustments.brightness_percent, contrast = adjustments.contrast_percent))]
pub async fn postprocess_images(
    pool: &WorkerPool,
    files: Vec<PathBuf>,
    adjustments: Adjustments,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    if adjustments.is_identity() {
        info!("No postprocessing required, copying pages");
        let mut written = Vec::with_capacity(files.len());
        for file in &files {
            let target = target_path(file, dest)?;
            std::fs::copy(file, &target).map_err(|err| BookyError::fs("copy", file, err))?;
            written.push(target);
        }
        return Ok(written);
    }

    info!(workers = pool.workers(), "Postprocessing pages");
    let dest = dest.to_path_buf();
    pool.run(files, move |file| {
        let target = target_path(&file, &dest)?;
        enhance_file(&file, &target, adjustments)?;
        Ok(target)
    })
    .await
}

fn target_path(file: &Path, dest: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        BookyError::InvalidConfig(format!("{} has no file name", file.display()))
    })?;
    Ok(dest.join(name))
}

// -- Chunk building -----------------------------------------------------------------

/// A contiguous batch of pages rendered into `{index}.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub index: usize,
    pub pages: Vec<PathBuf>,
}

impl ChunkPlan {
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.index)
    }
}

/// Split the ordered pages into consecutive batches of `chunk_size`; only the
/// last batch may be shorter.
pub fn plan_chunks(pages: &[PathBuf], chunk_size: usize) -> Vec<ChunkPlan> {
    pages
        .chunks(chunk_size.max(1))
        .enumerate()
        .map(|(index, batch)| ChunkPlan {
            index,
            pages: batch.to_vec(),
        })
        .collect()
}

/// Render every planned chunk into `dest`. Returns the chunk paths in plan
/// order.
#[instrument(skip_all, fields(chunks = plans.len()))]
pub async fn build_chunks(
    pool: &WorkerPool,
    plans: Vec<ChunkPlan>,
    settings: &PipelineSettings,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    info!(chunk_size = settings.chunk_size, "Building PDF chunks");
    let (canvas, dpi) = (settings.canvas, settings.dpi);
    let dest = dest.to_path_buf();
    pool.run(plans, move |plan| {
        let output = dest.join(plan.file_name());
        let mut writer = PdfWriter::new(canvas, dpi);
        writer.set_title(format!("chunk {}", plan.index));
        writer.write_images_to_file(&plan.pages, &output)?;
        Ok(output)
    })
    .await
}

// -- Publishing ---------------------------------------------------------------------

/// What happened to the text layer of the published document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OcrOutcome {
    Applied,
    Disabled,
    /// OCR failed and the document was published without a text layer.
    Failed { reason: String },
}

/// Produce the published document from the merged one, through OCR when a
/// runner is given.
///
/// A failed OCR run publishes the merged document unchanged unless the runner
/// is strict, in which case the error is returned and nothing is published.
#[instrument(skip_all, fields(published = %published.display()))]
pub async fn publish(merged: &Path, published: &Path, ocr: Option<&OcrRunner>) -> Result<OcrOutcome> {
    let Some(runner) = ocr else {
        move_file(merged, published)?;
        info!("Published without OCR");
        return Ok(OcrOutcome::Disabled);
    };

    match runner.run(merged, published).await {
        Ok(()) => {
            info!("Published with OCR text layer");
            Ok(OcrOutcome::Applied)
        }
        Err(err) if runner.settings().strict => Err(err),
        Err(err) => {
            warn!(%err, "OCR failed, publishing the document without a text layer");
            move_file(merged, published)?;
            Ok(OcrOutcome::Failed {
                reason: err.to_string(),
            })
        }
    }
}

/// Rename, falling back to a copy when source and target are on different
/// filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|err| BookyError::fs("copy", from, err))?;
    Ok(())
}
