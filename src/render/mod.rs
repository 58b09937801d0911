//! # Rendering Module
//!
//! Bitmap logos for the thermal printer.
//!
//! - [`threshold`]: Luminance cutoff and bit packing
//! - [`raster`]: Decode, downscale and pack images into `GS v 0` rasters
//!
//! ## Usage Example
//!
//! ```
//! use image::{DynamicImage, Rgb, RgbImage};
//! use struk::printer::PrinterConfig;
//! use struk::render::raster;
//!
//! let logo = DynamicImage::ImageRgb8(RgbImage::from_pixel(800, 200, Rgb([0, 0, 0])));
//! let image = raster::rasterize(&logo, &PrinterConfig::MM58)?;
//!
//! assert_eq!(image.width(), 384);
//! assert_eq!(image.height(), 96);
//! # Ok::<(), struk::PrinterError>(())
//! ```

pub mod raster;
pub mod threshold;

pub use raster::RasterImage;
