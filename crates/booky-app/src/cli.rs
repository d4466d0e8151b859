// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition.

use std::path::PathBuf;

use booky_core::{PipelineSettings, ProcessConfig, ProjectId, Result};
use clap::{ArgAction, Args, Parser, Subcommand};

/// Organise scanned book pages into projects and turn them into one
/// searchable PDF.
#[derive(Parser, Debug)]
#[command(name = "booky", version, propagate_version = true)]
pub struct Cli {
    /// Log what would be created without touching the filesystem.
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Log progress (info level) instead of warnings only.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create new numbered project directories with empty intake folders.
    Create(CreateArgs),
    /// Copy front, pages and back of a project into one renumbered sequence.
    Assemble(AssembleArgs),
    /// Enhance the processed pages and build the final PDF.
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
pub struct RootArg {
    /// Directory holding all projects.
    #[arg(short = 'r', long, env = "BOOKY_ROOT", default_value = "/books")]
    pub root_path: PathBuf,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Number of projects to create.
    #[arg(short, long, default_value_t = 10)]
    pub count: u64,

    /// First project number when the root holds no projects yet.
    #[arg(short, long)]
    pub start_at: Option<u64>,
}

#[derive(Args, Debug)]
pub struct AssembleArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Project number.
    #[arg(short = 'B', long)]
    pub book: u64,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Project number.
    #[arg(short = 'B', long)]
    pub book: u64,

    /// Book title; also the name of the published PDF.
    #[arg(short, long)]
    pub name: String,

    /// Turn OCR off (it is on by default).
    #[arg(short, long = "ocr", visible_alias = "no-ocr", action = ArgAction::SetFalse)]
    pub ocr: bool,

    /// Contrast change in percent.
    #[arg(short, long, default_value_t = 30, allow_negative_numbers = true)]
    pub contrast: i32,

    /// Brightness change in percent.
    #[arg(short, long, default_value_t = 20, allow_negative_numbers = true)]
    pub brightness: i32,

    /// Fail instead of publishing without a text layer when OCR fails.
    #[arg(long)]
    pub strict_ocr: bool,

    /// Parallel workers for image and chunk work (default: all cores).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Extension of the processed pages that go into the PDF.
    #[arg(long)]
    pub extension: Option<String>,

    /// JSON file with pipeline settings.
    #[arg(long, env = "BOOKY_SETTINGS")]
    pub settings: Option<PathBuf>,
}

impl Cli {
    /// The project a command works on, if any.
    pub fn book_id(&self) -> Option<ProjectId> {
        match &self.command {
            Command::Create(_) => None,
            Command::Assemble(args) => Some(ProjectId(args.book)),
            Command::Process(args) => Some(ProjectId(args.book)),
        }
    }
}

impl ProcessArgs {
    /// Build the run configuration: settings file (or defaults) first, then
    /// command-line overrides.
    pub fn to_config(&self, dry_run: bool, verbose: bool) -> Result<ProcessConfig> {
        let mut settings = match &self.settings {
            Some(path) => PipelineSettings::load(path)?,
            None => PipelineSettings::default(),
        };
        if self.workers.is_some() {
            settings.workers = self.workers;
        }
        if let Some(extension) = &self.extension {
            settings.page_extension = extension.trim_start_matches('.').to_string();
        }
        settings.ocr.strict |= self.strict_ocr;
        settings.validate()?;

        Ok(ProcessConfig {
            dry_run,
            verbose,
            root_path: self.root.root_path.clone(),
            book_id: ProjectId(self.book),
            name: self.name.clone(),
            ocr_enabled: self.ocr,
            contrast_percent: self.contrast,
            brightness_percent: self.brightness,
            settings,
        })
    }
}
