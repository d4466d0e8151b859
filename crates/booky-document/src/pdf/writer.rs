// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — renders page images into a PDF chunk using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::{Path, PathBuf};

use booky_core::{BookyError, CanvasSize, Result};
use image::RgbImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::render_page;

/// Creates image-only PDF documents, one canvas-sized page per image.
pub struct PdfWriter {
    canvas: CanvasSize,
    /// Resolution at which a canvas pixel maps onto the page.
    dpi: f32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(canvas: CanvasSize, dpi: f32) -> Self {
        Self {
            canvas,
            dpi,
            title: String::from("Booky chunk"),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Physical page size in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.canvas.page_mm(self.dpi);
        (Mm(w_mm), Mm(h_mm))
    }

    // -- Image pages to PDF ---------------------------------------------------

    /// Build a PDF with one page per canvas image, in the given order.
    ///
    /// Every image must already have the canvas size; it covers its page
    /// exactly.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn create_from_pages(&self, pages: Vec<RgbImage>) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(BookyError::PdfError("a PDF chunk needs at least one page".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for (index, page) in pages.into_iter().enumerate() {
            if page.dimensions() != (self.canvas.width, self.canvas.height) {
                return Err(BookyError::PdfError(format!(
                    "page {} is {}x{}, expected the {}x{} canvas",
                    index,
                    page.width(),
                    page.height(),
                    self.canvas.width,
                    self.canvas.height
                )));
            }

            let raw = RawImage {
                width: page.width() as usize,
                height: page.height() as usize,
                pixels: RawImageData::U8(page.into_raw()),
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }

        Ok(output)
    }

    // -- File output convenience ----------------------------------------------

    /// Lay out each image file on the canvas and write the chunk to `output`.
    /// Returns the number of pages written.
    #[instrument(skip_all, fields(output = %output.display(), images = images.len()))]
    pub fn write_images_to_file(&self, images: &[PathBuf], output: &Path) -> Result<usize> {
        let pages = images
            .iter()
            .map(|path| render_page(path, self.canvas))
            .collect::<Result<Vec<_>>>()?;

        let bytes = self.create_from_pages(pages)?;
        if let Err(err) = std::fs::write(output, &bytes) {
            warn!(%err, "Writing PDF chunk failed");
            return Err(BookyError::fs("write PDF", output, err));
        }

        info!(pages = images.len(), bytes = bytes.len(), "PDF chunk written");
        Ok(images.len())
    }
}
