//! # ESC/POS Text Styling Commands
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Alignment | ESC a n | Left / center / right |
//! | Bold | ESC E n | **Emphasized** text |
//! | Size | GS ! n | 1x or 2x width/height |
//!
//! Styles persist until changed or until `ESC @` resets the printer.

use super::commands::{ESC, GS};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC a n  |
/// | Hex     | 1B 61 n  |
///
/// Takes effect at the start of the next line.
///
/// ```
/// use struk::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

/// Convenience function for left alignment
#[inline]
pub fn align_left() -> Vec<u8> {
    align(Alignment::Left)
}

/// Convenience function for center alignment
#[inline]
pub fn align_center() -> Vec<u8> {
    align(Alignment::Center)
}

/// Convenience function for right alignment
#[inline]
pub fn align_right() -> Vec<u8> {
    align(Alignment::Right)
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Turn Emphasized Mode On (ESC E 1)
///
/// | Format  | Bytes     |
/// |---------|-----------|
/// | Hex     | 1B 45 01  |
#[inline]
pub fn bold_on() -> Vec<u8> {
    vec![ESC, b'E', 1]
}

/// # Turn Emphasized Mode Off (ESC E 0)
#[inline]
pub fn bold_off() -> Vec<u8> {
    vec![ESC, b'E', 0]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Character size selected through `GS ! n`.
///
/// The high nibble of `n` is the width multiplier minus one, the low nibble
/// the height multiplier minus one.
///
/// ```text
/// Normal        0x00   1x wide, 1x high
/// DoubleHeight  0x01   1x wide, 2x high
/// DoubleWidth   0x10   2x wide, 1x high
/// Double        0x11   2x wide, 2x high
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Normal = 0x00,
    DoubleHeight = 0x01,
    DoubleWidth = 0x10,
    Double = 0x11,
}

/// # Select Character Size (GS ! n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | GS ! n   |
/// | Hex     | 1D 21 n  |
///
/// ```
/// use struk::protocol::text::{size, TextSize};
///
/// assert_eq!(size(TextSize::Double), vec![0x1D, 0x21, 0x11]);
/// ```
pub fn size(size: TextSize) -> Vec<u8> {
    vec![GS, b'!', size as u8]
}

#[inline]
pub fn size_normal() -> Vec<u8> {
    size(TextSize::Normal)
}

#[inline]
pub fn size_double_height() -> Vec<u8> {
    size(TextSize::DoubleHeight)
}

#[inline]
pub fn size_double_width() -> Vec<u8> {
    size(TextSize::DoubleWidth)
}

#[inline]
pub fn size_double() -> Vec<u8> {
    size(TextSize::Double)
}
