// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordering keys — the single rule deciding document order for page images and
// PDF chunks.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Numeric ordering key of a file: the first run of decimal digits in its
/// final path segment, or 0 when the name contains no digits.
///
/// Runs too long for a `u64` saturate to `u64::MAX`.
pub fn order_key(path: impl AsRef<Path>) -> u64 {
    let path = path.as_ref();
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => path.to_string_lossy(),
    };

    DIGIT_RUN
        .find(&name)
        .map(|run| run.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Stable sort by [`order_key`]; files with equal keys keep their order.
pub fn sort_by_order_key<P: AsRef<Path>>(paths: &mut [P]) {
    paths.sort_by_cached_key(|path| order_key(path));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn first_digit_run_of_file_name() {
        assert_eq!(order_key("scan_0042_b7.tif"), 42);
        assert_eq!(order_key("7.pdf"), 7);
        assert_eq!(order_key("page10.png"), 10);
    }

    #[test]
    fn directories_do_not_contribute() {
        assert_eq!(order_key("/books/17/pages/cover.jpg"), 0);
        assert_eq!(order_key("/books/17/pages/p3.jpg"), 3);
    }

    #[test]
    fn no_digits_is_zero() {
        assert_eq!(order_key("cover.jpg"), 0);
        assert_eq!(order_key(""), 0);
    }

    #[test]
    fn overlong_runs_saturate() {
        assert_eq!(order_key("99999999999999999999999.tif"), u64::MAX);
    }

    #[test]
    fn numeric_not_lexicographic() {
        let mut files = vec!["10.pdf", "9.pdf", "1.pdf", "0.pdf"];
        sort_by_order_key(&mut files);
        assert_eq!(files, vec!["0.pdf", "1.pdf", "9.pdf", "10.pdf"]);
    }

    #[test]
    fn equal_keys_keep_discovery_order() {
        let mut files: Vec<PathBuf> = ["b_2.jpg", "a.jpg", "c_2.jpg", "z.jpg", "a_1.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();
        sort_by_order_key(&mut files);
        let names: Vec<_> = files.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["a.jpg", "z.jpg", "a_1.jpg", "b_2.jpg", "c_2.jpg"]);
    }
}
