// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration. Every stage receives an immutable `ProcessConfig`; the
// tunables that used to be constants live in `PipelineSettings`, which can be
// loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BookyError, Result};
use crate::types::{Adjustments, CanvasSize, ProjectId, ProjectLayout};

/// Everything a `process` run needs, fixed before the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub dry_run: bool,
    pub verbose: bool,
    pub root_path: PathBuf,
    pub book_id: ProjectId,
    /// Title of the book; also the file stem of the published PDF.
    pub name: String,
    pub ocr_enabled: bool,
    pub contrast_percent: i32,
    pub brightness_percent: i32,
    pub settings: PipelineSettings,
}

impl ProcessConfig {
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.root_path, self.book_id)
    }

    pub fn adjustments(&self) -> Adjustments {
        Adjustments::new(self.brightness_percent, self.contrast_percent)
    }

    /// Reject names that cannot serve as a file stem, then check the settings.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BookyError::InvalidConfig("book name must not be empty".into()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(BookyError::InvalidConfig(format!(
                "book name '{}' cannot be used as a file name",
                self.name
            )));
        }
        self.settings.validate()
    }
}

/// Tunables of the build pipeline with their documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Page canvas every image is centred on. Default: 2480x3508 (A4 @ 300 DPI).
    pub canvas: CanvasSize,
    /// Resolution used to turn the canvas into a physical PDF page size. Default: 300.
    pub dpi: f32,
    /// Pages per intermediate PDF chunk. Default: 4.
    pub chunk_size: usize,
    /// Extension of the processed pages that go into the PDF. Default: "tif".
    pub page_extension: String,
    /// Worker count for fan-out stages; `None` uses every available core.
    pub workers: Option<usize>,
    pub ocr: OcrSettings,
}

/// Upper bound for an explicit worker count.
pub const MAX_WORKERS: usize = 1024;

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            dpi: 300.0,
            chunk_size: 4,
            page_extension: "tif".into(),
            workers: None,
            ocr: OcrSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|err| BookyError::fs("read settings", path, err))?;
        let settings: Self = serde_json::from_str(&data)?;
        settings.validate()?;
        info!(path = %path.display(), "Pipeline settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(BookyError::InvalidConfig(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(BookyError::InvalidConfig(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        if self.chunk_size == 0 {
            return Err(BookyError::InvalidConfig("chunk size must be ≥ 1".into()));
        }
        match self.workers {
            Some(0) => {
                return Err(BookyError::InvalidConfig("worker count must be ≥ 1".into()));
            }
            Some(n) if n > MAX_WORKERS => {
                return Err(BookyError::InvalidConfig(format!(
                    "worker count must be at most {MAX_WORKERS}, got {n}"
                )));
            }
            _ => {}
        }
        if self.ocr.program.trim().is_empty() {
            return Err(BookyError::InvalidConfig("OCR program must not be empty".into()));
        }
        Ok(())
    }
}

/// How the external OCR tool is invoked and how its failures are treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Executable name or path. Default: "ocrmypdf".
    pub program: String,
    /// Tesseract language code. Default: "deu".
    pub language: String,
    /// Optimisation level 0-3. Default: 3.
    pub optimize: u8,
    /// Fail the run when OCR fails instead of publishing without a text layer.
    pub strict: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            program: "ocrmypdf".into(),
            language: "deu".into(),
            optimize: 3,
            strict: false,
        }
    }
}
