//! # Receipts
//!
//! - [`document`]: The order data a receipt is printed from
//! - [`formatter`]: 32-column layout into IR / command bytes
//! - [`money`]: Rupiah formatting
//!
//! ```
//! use struk::receipt::{LineItem, ReceiptDocument, ReceiptFormatter};
//!
//! let doc = ReceiptDocument::new(vec![LineItem::new("Latte Jeda", 1, 32_000)])
//!     .customer("Nadia");
//! let buffer = ReceiptFormatter::default().render(&doc);
//! assert!(!buffer.is_empty());
//! ```

pub mod document;
pub mod formatter;
pub mod money;

pub use document::{LineItem, ReceiptDocument, StoreProfile};
pub use formatter::{ReceiptFormatter, divider, line_pair};
