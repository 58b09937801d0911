//! # ESC/POS Protocol Subset
//!
//! Low-level command builders for the ESC/POS control language spoken by
//! generic 58mm BLE thermal printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Printer control (init, feed, cut)
//! - [`text`]: Alignment, emphasis and character size
//! - [`graphics`]: GS v 0 raster images
//!
//! Every builder is a pure function returning the exact control bytes; there
//! is no state and no failure mode at this layer.
//!
//! ## Usage Example
//!
//! ```
//! use struk::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align_center());
//! data.extend(text::bold_on());
//! data.extend(b"KOPI BREWASA\n");
//! data.extend(text::bold_off());
//! data.extend(commands::feed_lines(3));
//! ```

pub mod commands;
pub mod graphics;
pub mod text;
