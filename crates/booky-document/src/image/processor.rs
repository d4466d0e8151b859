// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — brightness/contrast enhancement of scanned pages and
// placement of a page onto the fixed-size white canvas of a PDF page.
// Operates on in-memory images using the `image` and `imageproc` crates.

use std::path::Path;

use booky_core::{Adjustments, BookyError, CanvasSize, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel, Rgb, RgbImage};
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns the transformed processor, so
/// steps chain:
///
/// ```ignore
/// let page = ImageProcessor::open("assembled/out/tmp/3.tif")?
///     .fit_within(CanvasSize::A4_300DPI)
///     .into_page(CanvasSize::A4_300DPI);
/// ```
pub struct ImageProcessor {
    /// The current working image. Always an 8-bit layout.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            BookyError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(img))
    }

    /// Wrap an already-decoded image. Layouts other than 8-bit grey, grey +
    /// alpha, RGB and RGBA are converted to their 8-bit counterpart.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: into_eight_bit(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Enhancement ----------------------------------------------------------

    /// Brightness first, then contrast, each skipped when its factor is 1.
    #[instrument(skip(self))]
    pub fn enhance(self, adjustments: Adjustments) -> Self {
        let mut out = self;
        if adjustments.brightness_percent != 0 {
            out = out.adjust_brightness(adjustments.brightness_factor());
        }
        if adjustments.contrast_percent != 0 {
            out = out.adjust_contrast(adjustments.contrast_factor());
        }
        out
    }

    /// Scale every colour channel by `factor`; 0 gives black, 1 is a no-op.
    /// Alpha is untouched.
    pub fn adjust_brightness(self, factor: f32) -> Self {
        let table = lookup_table(|v| v * factor);
        Self {
            image: map_channels(self.image, &table),
        }
    }

    /// Move every colour channel away from (factor > 1) or towards
    /// (factor < 1) the image's mean luminance. Alpha is untouched.
    pub fn adjust_contrast(self, factor: f32) -> Self {
        let mean = mean_luminance(&self.image) as f32;
        debug!(mean, factor, "Adjusting contrast");
        let table = lookup_table(|v| mean + factor * (v - mean));
        Self {
            image: map_channels(self.image, &table),
        }
    }

    // -- Page layout ----------------------------------------------------------

    /// Downscale to fit within `canvas`, preserving aspect ratio. Images that
    /// already fit are left alone; nothing is ever enlarged.
    pub fn fit_within(self, canvas: CanvasSize) -> Self {
        if self.width() <= canvas.width && self.height() <= canvas.height {
            return self;
        }
        let resized = self
            .image
            .resize(canvas.width, canvas.height, FilterType::Lanczos3);
        debug!(
            width = resized.width(),
            height = resized.height(),
            "Image downscaled to canvas"
        );
        Self::from_dynamic(resized)
    }

    /// Paste the image centred on a white RGB canvas. Parts that do not fit
    /// are clipped; call [`fit_within`](Self::fit_within) first.
    pub fn into_page(self, canvas: CanvasSize) -> RgbImage {
        let mut page = RgbImage::from_pixel(canvas.width, canvas.height, Rgb([255, 255, 255]));
        let rgb = self.image.to_rgb8();
        let x = (i64::from(canvas.width) - i64::from(rgb.width())) / 2;
        let y = (i64::from(canvas.height) - i64::from(rgb.height())) / 2;
        imageops::overlay(&mut page, &rgb, x, y);
        page
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            BookyError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

// -- Per-file operations used by the pipeline -----------------------------------

/// Enhance `source` and write the result to `target`, keeping its format.
pub fn enhance_file(source: &Path, target: &Path, adjustments: Adjustments) -> Result<()> {
    ImageProcessor::open(source)?
        .enhance(adjustments)
        .save(target)
}

/// Load a processed page and lay it out on a canvas-sized PDF page image.
pub fn render_page(path: &Path, canvas: CanvasSize) -> Result<RgbImage> {
    Ok(ImageProcessor::open(path)?
        .fit_within(canvas)
        .into_page(canvas))
}

// -- Pixel helpers ----------------------------------------------------------------

fn into_eight_bit(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => image,
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        DynamicImage::ImageRgba16(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba8(image.to_rgba8())
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

/// Tabulate `f` over every 8-bit value, clamping the result and truncating
/// it toward zero like the usual 8-bit blend.
fn lookup_table(f: impl Fn(f32) -> f32) -> [u8; 256] {
    std::array::from_fn(|v| f(v as f32).clamp(0.0, 255.0) as u8)
}

fn map_channels(image: DynamicImage, table: &[u8; 256]) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(map_buffer(buf, table)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(map_buffer(buf, table)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(map_buffer(buf, table)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(map_buffer(buf, table)),
        other => DynamicImage::ImageRgb8(map_buffer(other.to_rgb8(), table)),
    }
}

fn map_buffer<P>(mut buf: ImageBuffer<P, Vec<u8>>, table: &[u8; 256]) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    for pixel in buf.pixels_mut() {
        pixel.apply_without_alpha(|v| table[usize::from(v)]);
    }
    buf
}

/// Rounded mean of the image's luminance histogram.
fn mean_luminance(image: &DynamicImage) -> u8 {
    let gray = image.to_luma8();
    let histogram = imageproc::stats::histogram(&gray);
    let (sum, count) = histogram.channels[0]
        .iter()
        .enumerate()
        .fold((0u64, 0u64), |(sum, count), (value, &n)| {
            (sum + value as u64 * u64::from(n), count + u64::from(n))
        });
    if count == 0 {
        return 0;
    }
    ((sum + count / 2) / count) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, LumaA, Rgba, RgbaImage};

    fn gray(pixels: &[u8]) -> DynamicImage {
        let buf = GrayImage::from_raw(pixels.len() as u32, 1, pixels.to_vec()).unwrap();
        DynamicImage::ImageLuma8(buf)
    }

    fn luma_values(p: &ImageProcessor) -> Vec<u8> {
        p.as_dynamic().to_luma8().into_raw()
    }

    #[test]
    fn brightness_scales_channels_and_clamps() {
        let p = ImageProcessor::from_dynamic(gray(&[0, 100, 250])).adjust_brightness(1.2);
        assert_eq!(luma_values(&p), vec![0, 120, 255]);

        let p = ImageProcessor::from_dynamic(gray(&[100])).adjust_brightness(0.5);
        assert_eq!(luma_values(&p), vec![50]);
    }

    #[test]
    fn contrast_spreads_around_mean_luminance() {
        let p = ImageProcessor::from_dynamic(gray(&[100, 200])).adjust_contrast(1.3);
        assert_eq!(luma_values(&p), vec![85, 215]);
    }

    #[test]
    fn fractional_results_are_truncated() {
        // 1.25 * 3 = 3.75 and 1.25 * 101 = 126.25.
        let p = ImageProcessor::from_dynamic(gray(&[3, 101])).adjust_brightness(1.25);
        assert_eq!(luma_values(&p), vec![3, 126]);

        // Mean 11; 11 + 0.5 * (10 - 11) = 10.5 and 11 + 0.5 * (13 - 11) = 12.
        let p = ImageProcessor::from_dynamic(gray(&[10, 10, 13])).adjust_contrast(0.5);
        assert_eq!(luma_values(&p), vec![10, 10, 12]);
    }

    #[test]
    fn contrast_of_uniform_image_is_unchanged() {
        let p = ImageProcessor::from_dynamic(gray(&[77, 77, 77])).adjust_contrast(2.0);
        assert_eq!(luma_values(&p), vec![77, 77, 77]);
    }

    #[test]
    fn enhance_applies_brightness_before_contrast() {
        // Brightness 100 -> 120, 150 -> 180; mean 150; contrast 1.5 -> 105, 195.
        let p = ImageProcessor::from_dynamic(gray(&[100, 150])).enhance(Adjustments::new(20, 50));
        assert_eq!(luma_values(&p), vec![105, 195]);
    }

    #[test]
    fn identity_adjustments_leave_pixels_alone() {
        let p = ImageProcessor::from_dynamic(gray(&[1, 2, 3])).enhance(Adjustments::default());
        assert_eq!(luma_values(&p), vec![1, 2, 3]);
    }

    #[test]
    fn alpha_and_layout_are_preserved() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([100, 50, 200, 42]));
        let p = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(rgba)).adjust_brightness(1.5);
        let DynamicImage::ImageRgba8(out) = p.as_dynamic() else {
            panic!("layout changed");
        };
        assert_eq!(out.get_pixel(0, 0), &Rgba([150, 75, 255, 42]));

        let la = ImageBuffer::from_pixel(1, 1, LumaA([80u8, 7]));
        let p = ImageProcessor::from_dynamic(DynamicImage::ImageLumaA8(la)).adjust_brightness(2.0);
        let DynamicImage::ImageLumaA8(out) = p.as_dynamic() else {
            panic!("layout changed");
        };
        assert_eq!(out.get_pixel(0, 0), &LumaA([160, 7]));
    }

    #[test]
    fn sixteen_bit_input_becomes_eight_bit() {
        let wide = ImageBuffer::from_pixel(1, 1, Luma([u16::MAX]));
        let p = ImageProcessor::from_dynamic(DynamicImage::ImageLuma16(wide));
        assert!(matches!(p.as_dynamic(), DynamicImage::ImageLuma8(_)));
        assert_eq!(luma_values(&p), vec![255]);
    }

    #[test]
    fn small_images_are_not_enlarged() {
        let canvas = CanvasSize { width: 40, height: 60 };
        let p = ImageProcessor::from_dynamic(gray(&[0; 10])).fit_within(canvas);
        assert_eq!((p.width(), p.height()), (10, 1));
    }

    #[test]
    fn large_images_shrink_with_aspect_ratio() {
        let canvas = CanvasSize { width: 40, height: 60 };
        let big = DynamicImage::ImageLuma8(GrayImage::new(80, 40));
        let p = ImageProcessor::from_dynamic(big).fit_within(canvas);
        assert_eq!((p.width(), p.height()), (40, 20));
    }

    #[test]
    fn page_is_white_with_centred_image() {
        let canvas = CanvasSize { width: 10, height: 8 };
        let black = DynamicImage::ImageLuma8(GrayImage::new(4, 2));
        let page = ImageProcessor::from_dynamic(black).into_page(canvas);

        assert_eq!(page.dimensions(), (10, 8));
        assert_eq!(page.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(page.get_pixel(2, 2), &Rgb([255, 255, 255]));
        assert_eq!(page.get_pixel(3, 3), &Rgb([0, 0, 0]));
        assert_eq!(page.get_pixel(6, 4), &Rgb([0, 0, 0]));
        assert_eq!(page.get_pixel(7, 4), &Rgb([255, 255, 255]));
        assert_eq!(page.get_pixel(3, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn enhance_file_writes_target_in_source_format() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        let target = dir.path().join("out.png");
        gray(&[100, 200]).save(&source).unwrap();

        enhance_file(&source, &target, Adjustments::new(0, 30)).unwrap();

        let written = image::open(&target).unwrap().to_luma8().into_raw();
        assert_eq!(written, vec![85, 215]);
    }

    #[test]
    fn unreadable_image_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = render_page(&path, CanvasSize::A4_300DPI).unwrap_err();
        assert!(matches!(err, BookyError::ImageError(_)), "got {err:?}");
    }
}
