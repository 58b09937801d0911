//! # Printer Transport Layer
//!
//! Everything between a finished [`crate::buffer::CommandBuffer`] and the
//! printer's write characteristic.
//!
//! ## Layers
//!
//! - [`gatt`]: The `Central` / `GattDevice` seam over a BLE stack
//! - [`ble`]: btleplug implementation of the seam
//! - [`memory`]: In-process fake of the seam for tests and dry runs
//! - [`connector`]: Discovery and connection state machine
//! - [`scheduler`]: Chunked, paced transmission

pub mod ble;
pub mod connector;
pub mod gatt;
pub mod memory;
pub mod scheduler;

pub use ble::{BleCentral, BlePrinter};
pub use connector::{ConnectionState, ConnectionStatus, DeviceConnector, PrinterHandle};
pub use gatt::{Central, GattDevice, WriteMode};
pub use scheduler::Scheduler;
