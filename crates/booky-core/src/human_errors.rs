// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language explanations for errors, printed by the CLI after a fatal
// failure. The technical message is logged separately.

use crate::error::BookyError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Running the same command again may succeed.
    Transient,
    /// The operator has to fix something first (missing folder, bad flag).
    ActionRequired,
    /// The input itself is unusable.
    Permanent,
}

impl Severity {
    /// Short tag shown next to the message.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transient => "temporary problem",
            Self::ActionRequired => "action required",
            Self::Permanent => "cannot continue",
        }
    }
}

/// A human-readable error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// Whether simply re-running is worthwhile.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `BookyError` into a `HumanError`.
pub fn humanize_error(err: &BookyError) -> HumanError {
    match err {
        // -- Project directories --
        BookyError::Discovery { path, source } => {
            if source.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: format!("The folder {} does not exist.", path.display()),
                    suggestion: "Check --root-path and --book. New projects are set up with `booky create`.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                humanize_io(source)
            }
        }

        BookyError::Filesystem { source, .. } | BookyError::Io(source) => humanize_io(source),

        BookyError::NoStartingPoint { .. } => HumanError {
            message: "There are no numbered project folders yet.".into(),
            suggestion: "Pass --start-at with the number the first project should get.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BookyError::NoPages { path } => HumanError {
            message: "There are no pages to turn into a PDF.".into(),
            suggestion: format!(
                "Put the finished page images into {} and run `booky process` again.",
                path.display()
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Document errors --
        BookyError::ImageError(_) => HumanError {
            message: "One of the page images could not be processed.".into(),
            suggestion: "The image may be damaged or in an unusual format. Re-export it as TIFF, PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BookyError::PdfError(_) => HumanError {
            message: "Building the PDF failed.".into(),
            suggestion: "Run again with --verbose to see which chunk failed.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BookyError::EmptyDocument { .. } => HumanError {
            message: "No PDF pages were produced.".into(),
            suggestion: "Check that the processed pages have the expected extension (see --extension).".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BookyError::OcrError(detail) => humanize_ocr_error(detail),

        // -- Orchestration --
        BookyError::Worker(_) => HumanError {
            message: "A background worker stopped unexpectedly.".into(),
            suggestion: "Try again. If this keeps happening, lower --workers.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BookyError::InvalidConfig(detail) => HumanError {
            message: "The options given don't fit together.".into(),
            suggestion: format!("Fix the option and run again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BookyError::Serialization(_) => HumanError {
            message: "The settings file could not be read.".into(),
            suggestion: "Check that the file passed to --settings is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_io(source: &std::io::Error) -> HumanError {
    match source.kind() {
        std::io::ErrorKind::NotFound => HumanError {
            message: "A file or folder couldn't be found.".into(),
            suggestion: "It may have been moved or deleted while Booky was running.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        std::io::ErrorKind::PermissionDenied => HumanError {
            message: "Booky doesn't have permission to use that file or folder.".into(),
            suggestion: "Check the permissions below --root-path.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        _ => HumanError {
            message: "There was a problem reading or writing a file.".into(),
            suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_ocr_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("not found") || lower.contains("could not start") {
        HumanError {
            message: "The OCR tool isn't installed.".into(),
            suggestion: "Install ocrmypdf, or run without OCR (--ocr turns it off).".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("language") {
        HumanError {
            message: "The OCR language pack is missing.".into(),
            suggestion: "Install the tesseract language data for the configured language.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Text recognition failed.".into(),
            suggestion: format!("Run again with --verbose to see the tool's output. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_intake_folder_is_action_required() {
        let err = BookyError::Discovery {
            path: PathBuf::from("/books/3/front"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("/books/3/front"));
    }

    #[test]
    fn missing_start_value_is_action_required() {
        let human = humanize_error(&BookyError::NoStartingPoint {
            root: PathBuf::from("/books"),
        });
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("--start-at"));
    }

    #[test]
    fn missing_ocr_tool_is_action_required() {
        let err = BookyError::OcrError("could not start 'ocrmypdf': not found".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn worker_failure_is_transient() {
        let human = humanize_error(&BookyError::Worker("task panicked".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn damaged_image_is_permanent() {
        let human = humanize_error(&BookyError::ImageError("bad tiff".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }
}
