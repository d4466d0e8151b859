// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// booky-pipeline — turns a project's processed pages into the published PDF.
//
// Stages run one after another (postprocess, chunk, merge, OCR); the per-page
// and per-chunk work inside a stage fans out over a bounded worker pool. All
// intermediates live in a build workspace that is removed on every exit path.

pub mod pool;
pub mod process;
pub mod stages;
pub mod workspace;

pub use pool::WorkerPool;
pub use process::{ProcessReport, process};
pub use stages::{ChunkPlan, OcrOutcome, build_chunks, plan_chunks, postprocess_images, publish};
pub use workspace::BuildWorkspace;
