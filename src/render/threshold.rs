//! # Luminance Thresholding
//!
//! Converts RGB pixels to printed / not-printed dots with a fixed cutoff.
//!
//! ## Luminance
//!
//! The standard Rec. 601 weighting:
//!
//! ```text
//! L = 0.299 R + 0.587 G + 0.114 B
//! ```
//!
//! It is evaluated in integer thousandths so that the comparison at the
//! threshold is exact: a mid gray of exactly 127 has `L = 127.000` and is
//! **not** printed, while 126 is.
//!
//! ```text
//! L < threshold   →  1 (black, dot printed)
//! L >= threshold  →  0 (white, no dot)
//! ```

/// Luminance scaled by 1000 (`299 R + 587 G + 114 B`).
#[inline]
pub fn luminance_milli(r: u8, g: u8, b: u8) -> u32 {
    299 * r as u32 + 587 * g as u32 + 114 * b as u32
}

/// Whether a pixel is dark enough to be printed.
///
/// ```
/// use struk::render::threshold::should_print;
///
/// assert!(should_print([0, 0, 0], 127));
/// assert!(should_print([126, 126, 126], 127));
/// assert!(!should_print([127, 127, 127], 127));
/// assert!(!should_print([255, 255, 255], 127));
/// ```
#[inline]
pub fn should_print(rgb: [u8; 3], threshold: u8) -> bool {
    luminance_milli(rgb[0], rgb[1], rgb[2]) < threshold as u32 * 1000
}

/// Pack a row of dots into bytes, 8 dots per byte.
///
/// - Bit 7 (MSB) = leftmost dot
/// - 1 = black (print), 0 = white
///
/// A row whose length is not a multiple of 8 is padded on the right with
/// white bits.
///
/// ```
/// use struk::render::threshold::pack_row;
///
/// assert_eq!(pack_row(&[true, true, true, true, false, false, false, false]), vec![0xF0]);
/// assert_eq!(pack_row(&[true; 12]), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(dots: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; dots.len().div_ceil(8)];

    for (i, &dot) in dots.iter().enumerate() {
        if dot {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    bytes
}
