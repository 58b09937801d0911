//! # Bitmap Rasterizer
//!
//! Turns a decoded image into a 1-bit raster ready for `GS v 0`.
//!
//! ## Pipeline
//!
//! ```text
//! encoded bytes ─► decode ─► downscale to ≤ width_dots ─► threshold ─► pack
//! ```
//!
//! Images narrower than the print width are printed at their native size;
//! wider ones are scaled down proportionally. The result is computed fresh for
//! every print and never cached.

use image::{DynamicImage, imageops::FilterType};

use super::threshold::{pack_row, should_print};
use crate::error::PrinterError;
use crate::printer::PrinterConfig;
use crate::protocol::graphics;

/// A monochrome, bit-packed raster image.
///
/// `data` holds `width_bytes * height` bytes, row-major, MSB = leftmost dot.
/// The unused low bits of the last byte in each row are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    width_bytes: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Width in dots
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in dots
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes (`ceil(width / 8)`)
    pub fn width_bytes(&self) -> usize {
        self.width_bytes
    }

    /// Packed dot data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the dot at (x, y) is printed.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y as usize * self.width_bytes + x as usize / 8];
        byte & (1 << (7 - (x % 8))) != 0
    }

    /// Encode as a `GS v 0` command (header + packed data).
    pub fn to_command(&self) -> Vec<u8> {
        // Dimensions are validated to fit in u16 when the raster is built.
        graphics::raster(self.width_bytes as u16, self.height as u16, &self.data)
    }
}

/// Decode an encoded image (PNG, JPEG, GIF, BMP, ...).
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PrinterError> {
    image::load_from_memory(bytes).map_err(|e| PrinterError::ImageDecodeFailed(e.to_string()))
}

/// Target dimensions after fitting `width × height` into `max_width`.
///
/// Height is scaled by the same factor and rounded to the nearest dot
/// (at least one).
///
/// ```
/// use struk::render::raster::fit_width;
///
/// assert_eq!(fit_width(768, 200, 384), (384, 100));
/// assert_eq!(fit_width(200, 50, 384), (200, 50));
/// ```
pub fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (max_width as f64 / width as f64) * height as f64;
    (max_width, (scaled.round() as u32).max(1))
}

/// Rasterize a decoded image for the given printer.
///
/// ## Errors
///
/// `InvalidImage` if the image is empty or its height does not fit the
/// two-byte height field of `GS v 0`.
pub fn rasterize(image: &DynamicImage, config: &PrinterConfig) -> Result<RasterImage, PrinterError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PrinterError::InvalidImage("image has no pixels".to_string()));
    }

    let (width, height) = fit_width(image.width(), image.height(), config.width_dots as u32);
    if height > u16::MAX as u32 {
        return Err(PrinterError::InvalidImage(format!(
            "height {} exceeds raster limit of {} dots",
            height,
            u16::MAX
        )));
    }

    let rgb = if (width, height) == (image.width(), image.height()) {
        image.to_rgb8()
    } else {
        image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8()
    };

    let width_bytes = (width as usize).div_ceil(8);
    let mut data = Vec::with_capacity(width_bytes * height as usize);
    let mut row = Vec::with_capacity(width as usize);

    for y in 0..height {
        row.clear();
        for x in 0..width {
            row.push(should_print(rgb.get_pixel(x, y).0, config.threshold));
        }
        data.extend(pack_row(&row));
    }

    Ok(RasterImage {
        width,
        height,
        width_bytes,
        data,
    })
}

/// Decode and rasterize in one step.
pub fn rasterize_bytes(bytes: &[u8], config: &PrinterConfig) -> Result<RasterImage, PrinterError> {
    let image = decode(bytes)?;
    rasterize(&image, config)
}
