// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `process` run: processed pages in `assembled/out` become the published
// `{root}/{id}/{name}.pdf`.

use std::path::{Path, PathBuf};

use booky_core::{BookyError, ProcessConfig, ProjectLayout, Result, list_files, sort_by_order_key};
use booky_document::{OcrRunner, merge_chunks};
use serde::Serialize;
use tracing::{info, instrument};

use crate::pool::WorkerPool;
use crate::stages::{OcrOutcome, build_chunks, plan_chunks, postprocess_images, publish};
use crate::workspace::BuildWorkspace;

const CHUNK_DIR: &str = "chunks";

/// Outcome of a process run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    /// Processed pages found in `assembled/out`.
    pub pages: usize,
    pub chunks: usize,
    /// Pages of the merged document.
    pub merged_pages: usize,
    /// The published PDF.
    pub output: PathBuf,
    pub ocr: OcrOutcome,
}

/// Run every stage for the configured project.
///
/// The build workspace is removed before returning, whatever the outcome.
#[instrument(skip_all, fields(book = %config.book_id, name = %config.name))]
pub async fn process(config: &ProcessConfig) -> Result<ProcessReport> {
    config.validate()?;
    let layout = config.layout();

    let processed_dir = layout.processed_dir();
    let mut files = list_files(&processed_dir, None)?;
    if files.is_empty() {
        return Err(BookyError::NoPages {
            path: processed_dir,
        });
    }
    sort_by_order_key(&mut files);

    let pool = WorkerPool::new(config.settings.workers);
    info!(
        pages = files.len(),
        workers = pool.workers(),
        "Processing book"
    );

    let workspace = BuildWorkspace::create(&layout)?;
    let result = run_stages(config, &layout, &pool, files, workspace.path()).await;
    workspace.close();
    result
}

async fn run_stages(
    config: &ProcessConfig,
    layout: &ProjectLayout,
    pool: &WorkerPool,
    files: Vec<PathBuf>,
    workspace: &Path,
) -> Result<ProcessReport> {
    let settings = &config.settings;
    let page_count = files.len();

    postprocess_images(pool, files, config.adjustments(), workspace).await?;

    let mut pages = list_files(workspace, Some(settings.page_extension.as_str()))?;
    if pages.is_empty() {
        return Err(BookyError::EmptyDocument {
            path: workspace.to_path_buf(),
        });
    }
    sort_by_order_key(&mut pages);

    // Chunks get their own directory so no book name can collide with one.
    let chunk_dir = workspace.join(CHUNK_DIR);
    std::fs::create_dir(&chunk_dir).map_err(|err| BookyError::fs("create directory", &chunk_dir, err))?;
    let plans = plan_chunks(&pages, settings.chunk_size);
    let chunks = build_chunks(pool, plans, settings, &chunk_dir).await?;

    let merged = workspace.join(format!("{}.pdf", config.name));
    let merge = merge_chunks(&chunk_dir, &config.name, &merged)?;

    let published = layout.published_pdf(&config.name);
    let runner = config
        .ocr_enabled
        .then(|| OcrRunner::new(settings.ocr.clone()));
    let ocr = publish(&merged, &published, runner.as_ref()).await?;

    info!(
        pages = merge.pages,
        output = %published.display(),
        ocr = ?ocr,
        "Book published"
    );

    Ok(ProcessReport {
        pages: page_count,
        chunks: chunks.len(),
        merged_pages: merge.pages,
        output: published,
        ocr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use booky_core::{CanvasSize, OcrSettings, PipelineSettings, ProjectId};
    use booky_document::PdfReader;
    use image::{GrayImage, Luma};

    fn config(root: &Path, ocr_enabled: bool, ocr: OcrSettings) -> ProcessConfig {
        ProcessConfig {
            dry_run: false,
            verbose: false,
            root_path: root.to_path_buf(),
            book_id: ProjectId(1),
            name: "Der Process".into(),
            ocr_enabled,
            contrast_percent: 30,
            brightness_percent: 20,
            settings: PipelineSettings {
                canvas: CanvasSize { width: 24, height: 32 },
                dpi: 8.0,
                workers: Some(2),
                ocr,
                ..Default::default()
            },
        }
    }

    /// A project whose `assembled/out` holds `count` small TIFF pages.
    fn project_with_pages(root: &Path, count: u8) -> ProjectLayout {
        let layout = ProjectLayout::new(root, ProjectId(1));
        std::fs::create_dir_all(layout.processed_dir()).unwrap();
        for i in 0..count {
            let page = GrayImage::from_pixel(8 + u32::from(i), 10, Luma([i * 20]));
            page.save(layout.processed_dir().join(format!("{i}.tif"))).unwrap();
        }
        layout
    }

    fn missing_tool() -> OcrSettings {
        OcrSettings {
            program: "booky-no-such-ocr-tool".into(),
            ..OcrSettings::default()
        }
    }

    #[tokio::test]
    async fn ten_pages_become_one_published_pdf() {
        let root = tempfile::tempdir().unwrap();
        let layout = project_with_pages(root.path(), 10);

        let report = process(&config(root.path(), false, OcrSettings::default()))
            .await
            .unwrap();

        assert_eq!(report.pages, 10);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.merged_pages, 10);
        assert_eq!(report.ocr, OcrOutcome::Disabled);
        assert_eq!(report.output, layout.published_pdf("Der Process"));

        let reader = PdfReader::open(&report.output).unwrap();
        assert_eq!(reader.page_count(), 10);
        assert_eq!(reader.title().as_deref(), Some("Der Process"));
        assert!(!layout.workspace_dir().exists());
        // Processed pages are inputs, not consumed.
        assert!(layout.processed_dir().join("9.tif").is_file());
    }

    #[tokio::test]
    async fn failing_ocr_still_publishes() {
        let root = tempfile::tempdir().unwrap();
        project_with_pages(root.path(), 3);

        let report = process(&config(root.path(), true, missing_tool())).await.unwrap();

        assert!(matches!(report.ocr, OcrOutcome::Failed { .. }), "got {:?}", report.ocr);
        assert_eq!(PdfReader::open(&report.output).unwrap().page_count(), 3);
    }

    #[tokio::test]
    async fn strict_ocr_failure_fails_the_run_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let layout = project_with_pages(root.path(), 2);
        let strict = OcrSettings {
            strict: true,
            ..missing_tool()
        };

        let err = process(&config(root.path(), true, strict)).await.unwrap_err();

        assert!(matches!(err, BookyError::OcrError(_)), "got {err:?}");
        assert!(!layout.published_pdf("Der Process").exists());
        assert!(!layout.workspace_dir().exists());
    }

    #[tokio::test]
    async fn empty_processed_dir_is_no_pages() {
        let root = tempfile::tempdir().unwrap();
        let layout = project_with_pages(root.path(), 0);

        let err = process(&config(root.path(), false, OcrSettings::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, BookyError::NoPages { .. }), "got {err:?}");
        assert!(!layout.workspace_dir().exists());
    }

    #[tokio::test]
    async fn pages_with_other_extensions_are_not_typeset() {
        let root = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(root.path(), ProjectId(1));
        std::fs::create_dir_all(layout.processed_dir()).unwrap();
        GrayImage::new(4, 4)
            .save(layout.processed_dir().join("0.png"))
            .unwrap();

        let err = process(&config(root.path(), false, OcrSettings::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, BookyError::EmptyDocument { .. }), "got {err:?}");
        assert!(!layout.workspace_dir().exists());
    }

    #[tokio::test]
    async fn stale_workspace_from_an_aborted_run_is_replaced() {
        let root = tempfile::tempdir().unwrap();
        let layout = project_with_pages(root.path(), 1);
        std::fs::create_dir_all(layout.workspace_dir()).unwrap();
        // A leftover chunk would otherwise be merged into the new document.
        std::fs::write(layout.workspace_dir().join("7.pdf"), b"stale").unwrap();

        let report = process(&config(root.path(), false, OcrSettings::default()))
            .await
            .unwrap();
        assert_eq!(report.merged_pages, 1);
    }

    #[tokio::test]
    async fn numeric_name_keeps_every_chunk() {
        let root = tempfile::tempdir().unwrap();
        let layout = project_with_pages(root.path(), 10);
        for name in ["0", "1", "2"] {
            let mut cfg = config(root.path(), false, OcrSettings::default());
            cfg.name = name.into();

            let report = process(&cfg).await.unwrap();

            assert_eq!(report.chunks, 3);
            assert_eq!(report.merged_pages, 10, "name {name}");
            assert_eq!(report.output, layout.published_pdf(name));
            assert_eq!(PdfReader::open(&report.output).unwrap().page_count(), 10);
        }
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_any_work() {
        let root = tempfile::tempdir().unwrap();
        let layout = project_with_pages(root.path(), 1);
        let mut cfg = config(root.path(), false, OcrSettings::default());
        cfg.name = "a/b".into();

        let err = process(&cfg).await.unwrap_err();
        assert!(matches!(err, BookyError::InvalidConfig(_)), "got {err:?}");
        assert!(!layout.workspace_dir().exists());
    }
}
