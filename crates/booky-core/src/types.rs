// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Booky projects.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ordering::order_key;

/// Numeric identifier of a project directory (`{root}/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three intake collections every project is provisioned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntakeGroup {
    /// Cover, title page, table of contents.
    Front,
    /// The book's content pages.
    Pages,
    /// Index, appendix, back cover.
    Back,
}

impl IntakeGroup {
    /// Document order: front matter, then content, then back matter.
    pub const ASSEMBLY_ORDER: [IntakeGroup; 3] =
        [IntakeGroup::Front, IntakeGroup::Pages, IntakeGroup::Back];

    /// Directory name below the project directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Pages => "pages",
            Self::Back => "back",
        }
    }
}

/// Path arithmetic for one project below a root directory.
///
/// The directory tree is the system of record; nothing else stores project
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    id: ProjectId,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, id: ProjectId) -> Self {
        Self {
            root: root.into(),
            id,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{id}`
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(self.id.to_string())
    }

    /// `{root}/{id}/{front,pages,back}`
    pub fn intake_dir(&self, group: IntakeGroup) -> PathBuf {
        self.project_dir().join(group.dir_name())
    }

    /// `{root}/{id}/assembled` — the renumbered page sequence.
    pub fn assembled_dir(&self) -> PathBuf {
        self.project_dir().join("assembled")
    }

    /// `{root}/{id}/assembled/out` — pages prepared for the process run.
    pub fn processed_dir(&self) -> PathBuf {
        self.assembled_dir().join("out")
    }

    /// `{root}/{id}/assembled/out/tmp` — build workspace of a process run.
    pub fn workspace_dir(&self) -> PathBuf {
        self.processed_dir().join(WORKSPACE_DIR_NAME)
    }

    /// `{root}/{id}/{name}.pdf` — the published document.
    pub fn published_pdf(&self, name: &str) -> PathBuf {
        self.project_dir().join(format!("{name}.pdf"))
    }
}

/// Name of the build workspace directory below `assembled/out`.
pub const WORKSPACE_DIR_NAME: &str = "tmp";

/// Pixel size of the white page every image is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// DIN A4 at 300 DPI.
    pub const A4_300DPI: CanvasSize = CanvasSize {
        width: 2480,
        height: 3508,
    };

    /// Physical page size in millimetres when rendered at `dpi`.
    pub fn page_mm(&self, dpi: f32) -> (f32, f32) {
        let to_mm = |px: u32| px as f32 / dpi * 25.4;
        (to_mm(self.width), to_mm(self.height))
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::A4_300DPI
    }
}

/// Brightness/contrast change in percent; 0 means "leave as is".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustments {
    pub brightness_percent: i32,
    pub contrast_percent: i32,
}

impl Adjustments {
    pub fn new(brightness_percent: i32, contrast_percent: i32) -> Self {
        Self {
            brightness_percent,
            contrast_percent,
        }
    }

    /// True when both values are zero and pages can be copied verbatim.
    pub fn is_identity(&self) -> bool {
        self.brightness_percent == 0 && self.contrast_percent == 0
    }

    /// Multiplier for the brightness enhancement (`1 + b/100`).
    pub fn brightness_factor(&self) -> f32 {
        1.0 + self.brightness_percent as f32 / 100.0
    }

    /// Multiplier for the contrast enhancement (`1 + c/100`).
    pub fn contrast_factor(&self) -> f32 {
        1.0 + self.contrast_percent as f32 / 100.0
    }
}

/// A page image on disk together with its ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub path: PathBuf,
    pub order_key: u64,
    /// Extension without the dot, if the file has one.
    pub extension: Option<String>,
}

impl PageFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let order_key = order_key(&path);
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
        Self {
            path,
            order_key,
            extension,
        }
    }

    /// File name this page gets at position `index` of a renumbered sequence.
    pub fn renumbered_name(&self, index: usize) -> String {
        match &self.extension {
            Some(ext) => format!("{index}.{ext}"),
            None => index.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = ProjectLayout::new("/books", ProjectId(12));
        assert_eq!(layout.project_dir(), PathBuf::from("/books/12"));
        assert_eq!(
            layout.intake_dir(IntakeGroup::Back),
            PathBuf::from("/books/12/back")
        );
        assert_eq!(
            layout.workspace_dir(),
            PathBuf::from("/books/12/assembled/out/tmp")
        );
        assert_eq!(
            layout.published_pdf("Faust"),
            PathBuf::from("/books/12/Faust.pdf")
        );
    }

    #[test]
    fn a4_canvas_is_a4_at_300_dpi() {
        let (w, h) = CanvasSize::A4_300DPI.page_mm(300.0);
        assert!((w - 210.0).abs() < 0.1, "width {w}");
        assert!((h - 297.0).abs() < 0.1, "height {h}");
    }

    #[test]
    fn adjustment_factors() {
        let adj = Adjustments::new(20, 30);
        assert!((adj.brightness_factor() - 1.2).abs() < 1e-6);
        assert!((adj.contrast_factor() - 1.3).abs() < 1e-6);
        assert!(!adj.is_identity());
        assert!(Adjustments::default().is_identity());
        assert!((Adjustments::new(-50, 0).brightness_factor() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn renumbered_name_keeps_extension() {
        let page = PageFile::from_path("/books/1/front/cover_07.jpg");
        assert_eq!(page.order_key, 7);
        assert_eq!(page.renumbered_name(3), "3.jpg");

        let bare = PageFile::from_path("/books/1/pages/scan12");
        assert_eq!(bare.renumbered_name(0), "0");
    }
}
