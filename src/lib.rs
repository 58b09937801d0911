//! # Struk - BLE Thermal Receipt Printer Driver
//!
//! Struk prints point-of-sale receipts on cheap 58mm ESC/POS thermal printers
//! over Bluetooth Low Energy. It provides:
//!
//! - **Protocol implementation**: ESC/POS command builders
//! - **Rasterization**: Threshold images into 1-bit raster blocks
//! - **Receipt layout**: 32-column receipts with rupiah amounts
//! - **Transport**: Printer discovery, GATT connection and paced chunked writes
//!
//! ## Quick Start
//!
//! ```no_run
//! use struk::{PrinterDriver, ReceiptDocument, receipt::LineItem};
//!
//! # async fn run() -> Result<(), struk::PrinterError> {
//! let mut driver = PrinterDriver::ble().await?;
//! driver.connect().await?;
//!
//! let doc = ReceiptDocument::new(vec![
//!     LineItem::new("Kopi Renjana", 2, 28_000),
//!     LineItem::new("Latte Jeda", 1, 32_000),
//! ])
//! .customer("Nadia");
//!
//! driver.print_receipt(&doc).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS command builders |
//! | [`render`] | Image thresholding and raster packing |
//! | [`ir`] | Printer operations as data, and their byte encoding |
//! | [`receipt`] | Receipt documents and layout |
//! | [`buffer`] | Assembled command bytes |
//! | [`transport`] | BLE discovery, connection and transmission |
//! | [`driver`] | The connect / print / disconnect facade |
//! | [`printer`] | Printer configurations |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! 58mm BLE printers that expose the 0x18F0 printer service or the ISSC
//! transparent UART service (RPP02 and its many clones).

pub mod buffer;
pub mod driver;
pub mod error;
pub mod ir;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use buffer::CommandBuffer;
pub use driver::PrinterDriver;
pub use error::PrinterError;
pub use printer::{PrinterConfig, PrinterProfile};
pub use receipt::{ReceiptDocument, ReceiptFormatter};
pub use transport::ConnectionStatus;
