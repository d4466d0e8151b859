// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Directory provisioning — creates the next batch of numbered project
// directories, each with empty intake collections.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use booky_core::discovery::is_hidden;
use booky_core::{BookyError, IntakeGroup, ProjectId, ProjectLayout, Result};

/// Parameters of a `create` run.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub root: PathBuf,
    /// Number of projects to create.
    pub count: u64,
    /// First id to use when `root` holds no numbered projects yet.
    pub start_at: Option<u64>,
    /// Log what would be created without touching the filesystem.
    pub dry_run: bool,
}

/// Outcome of a `create` run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    /// Ids created, or planned on a dry run, in ascending order.
    pub ids: Vec<ProjectId>,
    pub dry_run: bool,
}

/// Ids of the numerically named, non-hidden directories directly under `root`.
///
/// Anything else (files, hidden entries, names like `archive`) is ignored. The
/// result is sorted ascending.
pub fn existing_project_ids(root: &Path) -> Result<Vec<ProjectId>> {
    let discovery_err = |source| BookyError::Discovery {
        path: root.to_path_buf(),
        source,
    };

    let mut ids = Vec::new();
    for entry in std::fs::read_dir(root).map_err(discovery_err)? {
        let entry = entry.map_err(discovery_err)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_hidden(&name) || !entry.path().is_dir() {
            continue;
        }
        match name.parse::<u64>() {
            Ok(id) => ids.push(ProjectId(id)),
            Err(_) => debug!(dir = %name, "Ignoring non-numeric directory"),
        }
    }

    ids.sort_unstable();
    Ok(ids)
}

/// The id the next project gets: one past the highest existing id, otherwise
/// `start_at`.
pub fn next_project_id(root: &Path, start_at: Option<u64>) -> Result<ProjectId> {
    let existing = existing_project_ids(root)?;
    match (existing.last(), start_at) {
        (Some(highest), _) => {
            let next = highest.0.checked_add(1).ok_or_else(|| {
                BookyError::InvalidConfig(format!("project id {highest} is the largest possible id"))
            })?;
            Ok(ProjectId(next))
        }
        (None, Some(start)) => Ok(ProjectId(start)),
        (None, None) => Err(BookyError::NoStartingPoint {
            root: root.to_path_buf(),
        }),
    }
}

/// Create `count` consecutive project directories below `request.root`.
///
/// Stops at the first failing directory; projects created before it stay.
#[instrument(skip_all, fields(root = %request.root.display(), count = request.count))]
pub fn provision(request: &ProvisionRequest) -> Result<ProvisionReport> {
    let first = next_project_id(&request.root, request.start_at)?;
    let mut ids = Vec::new();

    for offset in 0..request.count {
        let id = first.0.checked_add(offset).map(ProjectId).ok_or_else(|| {
            BookyError::InvalidConfig(format!("cannot number {} projects from {first}", request.count))
        })?;
        let layout = ProjectLayout::new(&request.root, id);

        if request.dry_run {
            info!(project = %id, path = %layout.project_dir().display(), "Would create project");
        } else {
            create_project(&layout)?;
            info!(project = %id, "Project created");
        }
        ids.push(id);
    }

    if ids.is_empty() {
        warn!("Nothing to create, count is 0");
    }

    Ok(ProvisionReport {
        ids,
        dry_run: request.dry_run,
    })
}

fn create_project(layout: &ProjectLayout) -> Result<()> {
    for group in IntakeGroup::ASSEMBLY_ORDER {
        let dir = layout.intake_dir(group);
        std::fs::create_dir_all(&dir).map_err(|err| BookyError::fs("create directory", &dir, err))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(root: &Path, count: u64, start_at: Option<u64>) -> ProvisionRequest {
        ProvisionRequest {
            root: root.to_path_buf(),
            count,
            start_at,
            dry_run: false,
        }
    }

    #[test]
    fn numbering_continues_after_highest_project() {
        let root = tempfile::tempdir().unwrap();
        for name in ["3", "4", "notes", ".trash"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        std::fs::write(root.path().join("99"), b"a file, not a project").unwrap();

        let report = provision(&request(root.path(), 2, None)).unwrap();
        assert_eq!(report.ids, vec![ProjectId(5), ProjectId(6)]);

        for id in ["5", "6"] {
            for group in ["pages", "front", "back"] {
                assert!(root.path().join(id).join(group).is_dir(), "{id}/{group}");
            }
        }

        let report = provision(&request(root.path(), 2, Some(0))).unwrap();
        assert_eq!(report.ids, vec![ProjectId(7), ProjectId(8)]);
    }

    #[test]
    fn empty_root_uses_start_value() {
        let root = tempfile::tempdir().unwrap();
        let report = provision(&request(root.path(), 1, Some(0))).unwrap();
        assert_eq!(report.ids, vec![ProjectId(0)]);
        assert!(root.path().join("0/front").is_dir());
    }

    #[test]
    fn empty_root_without_start_value_fails() {
        let root = tempfile::tempdir().unwrap();
        let err = provision(&request(root.path(), 3, None)).unwrap_err();
        assert!(matches!(err, BookyError::NoStartingPoint { .. }), "got {err:?}");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn dry_run_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("10")).unwrap();

        let report = provision(&ProvisionRequest {
            dry_run: true,
            ..request(root.path(), 3, None)
        })
        .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.ids, vec![ProjectId(11), ProjectId(12), ProjectId(13)]);
        assert_eq!(existing_project_ids(root.path()).unwrap(), vec![ProjectId(10)]);
    }

    #[test]
    fn failure_keeps_earlier_projects() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("1")).unwrap();
        // A regular file named like project 3 blocks its creation.
        std::fs::write(root.path().join("3"), b"x").unwrap();

        let err = provision(&request(root.path(), 3, None)).unwrap_err();
        assert!(matches!(err, BookyError::Filesystem { .. }), "got {err:?}");
        assert!(root.path().join("2/pages").is_dir());
        assert!(!root.path().join("4").exists());
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let root = tempfile::tempdir().unwrap();
        let err = next_project_id(&root.path().join("absent"), Some(1)).unwrap_err();
        assert!(matches!(err, BookyError::Discovery { .. }));
    }
}
