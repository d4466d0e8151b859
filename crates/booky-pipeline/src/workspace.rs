// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Build workspace — the `assembled/out/tmp` directory holding a process run's
// intermediates.

use std::path::Path;

use booky_core::{BookyError, ProjectLayout, Result, WORKSPACE_DIR_NAME};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Scratch directory of one process run. Removed when dropped, so every exit
/// path (success, error, panic) cleans up.
#[derive(Debug)]
pub struct BuildWorkspace {
    dir: TempDir,
}

impl BuildWorkspace {
    /// Create a fresh, empty workspace, replacing one a previous run left behind.
    pub fn create(layout: &ProjectLayout) -> Result<Self> {
        let parent = layout.processed_dir();
        let stale = layout.workspace_dir();
        if stale.exists() {
            info!(path = %stale.display(), "Removing stale build workspace");
            std::fs::remove_dir_all(&stale)
                .map_err(|err| BookyError::fs("remove stale workspace", &stale, err))?;
        }

        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_DIR_NAME)
            .rand_bytes(0)
            .tempdir_in(&parent)
            .map_err(|err| BookyError::fs("create workspace", &stale, err))?;

        debug!(path = %dir.path().display(), "Build workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the workspace now, logging instead of failing when that is not
    /// possible.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "Build workspace removed"),
            Err(err) => warn!(path = %path.display(), %err, "Could not remove build workspace"),
        }
    }
}
