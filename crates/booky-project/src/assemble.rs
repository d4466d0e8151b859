// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Assembly — merges front matter, content pages and back matter into one
// renumbered sequence in `{project}/assembled`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use booky_core::discovery::is_hidden;
use booky_core::{
    BookyError, IntakeGroup, PageFile, ProjectLayout, Result, list_files, sort_by_order_key,
};

/// Outcome of an `assemble` run.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    pub front: usize,
    pub pages: usize,
    pub back: usize,
    /// Files written to the assembled directory.
    pub copied: usize,
    /// The content collection has an odd number of pages.
    pub uneven_content: bool,
    pub output: PathBuf,
}

/// Rebuild `{project}/assembled` from the three intake collections.
///
/// All intake directories are read before anything is written, so a missing
/// collection leaves a previous assembly untouched.
#[instrument(skip_all, fields(project = %layout.id()))]
pub fn assemble(layout: &ProjectLayout) -> Result<AssemblyReport> {
    let mut groups = Vec::with_capacity(IntakeGroup::ASSEMBLY_ORDER.len());
    for group in IntakeGroup::ASSEMBLY_ORDER {
        groups.push((group, discover(layout, group)?));
    }
    let count = |wanted: IntakeGroup| {
        groups
            .iter()
            .find(|(group, _)| *group == wanted)
            .map_or(0, |(_, files)| files.len())
    };
    let (front, pages, back) = (
        count(IntakeGroup::Front),
        count(IntakeGroup::Pages),
        count(IntakeGroup::Back),
    );

    info!(content = pages, front, back, "Pages found");
    let uneven_content = pages % 2 != 0;
    if uneven_content {
        warn!(
            content = pages,
            "Content page count is uneven, a page may be missing"
        );
    }

    let output = layout.assembled_dir();
    if !output.is_dir() {
        info!(path = %output.display(), "Creating assembly directory");
        std::fs::create_dir_all(&output)
            .map_err(|err| BookyError::fs("create directory", &output, err))?;
    }
    clear_previous_assembly(&output)?;

    let mut copied = 0;
    for (_, files) in &groups {
        for page in files {
            let target = output.join(page.renumbered_name(copied));
            std::fs::copy(&page.path, &target)
                .map_err(|err| BookyError::fs("copy", &page.path, err))?;
            copied += 1;
        }
    }

    info!(copied, path = %output.display(), "Pages assembled");

    Ok(AssemblyReport {
        front,
        pages,
        back,
        copied,
        uneven_content,
        output,
    })
}

fn discover(layout: &ProjectLayout, group: IntakeGroup) -> Result<Vec<PageFile>> {
    let mut files = list_files(&layout.intake_dir(group), None)?;
    sort_by_order_key(&mut files);
    Ok(files.into_iter().map(PageFile::from_path).collect())
}

/// Remove the regular, non-hidden files of a previous assembly. Hidden files
/// and subdirectories (notably `out`) are kept.
fn clear_previous_assembly(dir: &Path) -> Result<()> {
    let stale = list_files(dir, None)?;
    for path in &stale {
        std::fs::remove_file(path).map_err(|err| BookyError::fs("remove", path, err))?;
    }
    debug!(removed = stale.len(), "Previous assembly cleared");
    Ok(())
}
