// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each one maps its arguments onto a library call and
// prints a one-line summary on success.

use booky_core::{ProjectId, ProjectLayout, Result};
use booky_pipeline::OcrOutcome;
use booky_project::ProvisionRequest;
use tracing::{info, warn};

use crate::cli::{AssembleArgs, Cli, Command, CreateArgs, ProcessArgs};

pub async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Create(args) => create(args, cli.dry_run),
        Command::Assemble(args) => assemble(args),
        Command::Process(args) => process(args, cli).await,
    }
}

fn create(args: &CreateArgs, dry_run: bool) -> Result<()> {
    let report = booky_project::provision(&ProvisionRequest {
        root: args.root.root_path.clone(),
        count: args.count,
        start_at: args.start_at,
        dry_run,
    })?;

    let ids: Vec<String> = report.ids.iter().map(ProjectId::to_string).collect();
    if report.dry_run {
        println!("Would create projects: {}", ids.join(", "));
    } else {
        println!("Created projects: {}", ids.join(", "));
    }
    Ok(())
}

fn assemble(args: &AssembleArgs) -> Result<()> {
    let layout = ProjectLayout::new(&args.root.root_path, ProjectId(args.book));
    let report = booky_project::assemble(&layout)?;
    println!(
        "Assembled {} pages ({} front, {} content, {} back) into {}",
        report.copied,
        report.front,
        report.pages,
        report.back,
        report.output.display()
    );
    Ok(())
}

async fn process(args: &ProcessArgs, cli: &Cli) -> Result<()> {
    let config = args.to_config(cli.dry_run, cli.verbose)?;
    info!(
        book = %config.book_id,
        name = %config.name,
        ocr = config.ocr_enabled,
        brightness = config.brightness_percent,
        contrast = config.contrast_percent,
        "Starting process run"
    );

    let report = booky_pipeline::process(&config).await?;
    if let OcrOutcome::Failed { reason } = &report.ocr {
        warn!(%reason, "Published without a text layer");
        eprintln!("OCR failed, the PDF has no searchable text: {reason}");
    }
    println!(
        "Published {} pages to {}",
        report.merged_pages,
        report.output.display()
    );
    Ok(())
}
