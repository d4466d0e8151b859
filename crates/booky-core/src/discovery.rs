// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File discovery — the read primitive over a project's directories.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::{BookyError, Result};

/// Whether a directory entry name marks a hidden file.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// List the regular, non-hidden files directly inside `dir`.
///
/// When `extension` is given (with or without a leading dot) only files whose
/// extension matches it case-insensitively are returned. Symlinks to regular
/// files count as files. The result is in directory enumeration order; callers
/// sort it with [`crate::ordering::sort_by_order_key`].
#[instrument(skip_all, fields(dir = %dir.display(), extension = ?extension))]
pub fn list_files(dir: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>> {
    let discovery_err = |source| BookyError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let wanted = extension.map(|ext| ext.trim_start_matches('.'));
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(discovery_err)? {
        let entry = entry.map_err(discovery_err)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_hidden(&name) {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if let Some(wanted) = wanted {
            let matches = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted));
            if !matches {
                continue;
            }
        }

        files.push(path);
    }

    debug!(count = files.len(), "Files discovered");
    Ok(files)
}
