// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR stage — overlays a searchable text layer on the merged PDF by running
// the external `ocrmypdf` tool in a child process.
//
// The tool is configured through `OcrSettings`:
//
// - `program`  — executable name or path (default `ocrmypdf`)
// - `language` — tesseract language code (default `deu`)
// - `optimize` — output optimisation level 0-3 (default 3)
//
// A crash or hang of the tool stays inside the child. The child is killed when
// the future driving it is dropped.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use booky_core::{BookyError, OcrSettings, Result};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Lines of the tool's stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 5;

/// Runs the external OCR tool on one PDF.
#[derive(Debug, Clone)]
pub struct OcrRunner {
    settings: OcrSettings,
}

impl OcrRunner {
    pub fn new(settings: OcrSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    /// Arguments passed to the tool for `input` → `output`.
    pub fn command_line(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "--language".into(),
            self.settings.language.clone().into(),
            "--optimize".into(),
            self.settings.optimize.to_string().into(),
            "--no-progress-bar".into(),
            input.as_os_str().to_owned(),
            output.as_os_str().to_owned(),
        ]
    }

    /// OCR `input` into `output` and wait for the tool to finish.
    #[instrument(skip(self), fields(program = %self.settings.program, language = %self.settings.language))]
    pub async fn run(&self, input: &Path, output: &Path) -> Result<()> {
        let program = &self.settings.program;
        info!(input = %input.display(), "Adding OCR text layer");

        let result = Command::new(program)
            .args(self.command_line(input, output))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| BookyError::OcrError(format!("could not start '{program}': {err}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr
                .lines()
                .filter(|line| !line.trim().is_empty())
                .rev()
                .take(STDERR_TAIL_LINES)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            warn!(status = %result.status, "OCR tool failed");
            return Err(BookyError::OcrError(format!(
                "'{program}' exited with {}: {}",
                result.status,
                tail.join(" | ")
            )));
        }

        if !output.is_file() {
            return Err(BookyError::OcrError(format!(
                "'{program}' succeeded but wrote no file to {}",
                output.display()
            )));
        }

        debug!(output = %output.display(), "OCR complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn runner(program: &str) -> OcrRunner {
        OcrRunner::new(OcrSettings {
            program: program.into(),
            ..OcrSettings::default()
        })
    }

    #[test]
    fn command_line_uses_language_and_optimisation() {
        let args = runner("ocrmypdf").command_line(
            &PathBuf::from("/books/3/assembled/out/tmp/Faust.pdf"),
            &PathBuf::from("/books/3/Faust.pdf"),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--language",
                "deu",
                "--optimize",
                "3",
                "--no-progress-bar",
                "/books/3/assembled/out/tmp/Faust.pdf",
                "/books/3/Faust.pdf",
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_is_an_ocr_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner("booky-no-such-ocr-tool")
            .run(&dir.path().join("in.pdf"), &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        match err {
            BookyError::OcrError(msg) => assert!(msg.contains("could not start"), "got {msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_is_an_ocr_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner("false")
            .run(&dir.path().join("in.pdf"), &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        match err {
            BookyError::OcrError(msg) => assert!(msg.contains("exited with"), "got {msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
