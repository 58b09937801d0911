//! # Printer Driver
//!
//! The public entry point: one object that connects, formats and transmits.
//!
//! ```text
//! ReceiptDocument ─► ReceiptFormatter ─► CommandBuffer ─► Scheduler ─► PrinterHandle
//!                                                                        ▲
//!                                          DeviceConnector ──────────────┘
//! ```
//!
//! Every operation is awaited to completion before the next may start; the
//! `&mut self` receivers make overlapping jobs impossible.
//!
//! ```no_run
//! use struk::{PrinterDriver, ReceiptDocument, receipt::LineItem};
//!
//! # async fn run() -> Result<(), struk::PrinterError> {
//! let mut driver = PrinterDriver::ble().await?;
//! driver.connect().await?;
//! driver
//!     .print_receipt(&ReceiptDocument::new(vec![LineItem::new("Kopi Renjana", 2, 28_000)]))
//!     .await?;
//! driver.disconnect().await;
//! # Ok(())
//! # }
//! ```

use tokio::sync::mpsc;
use tracing::info;

use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::printer::{PrinterConfig, PrinterProfile};
use crate::receipt::{ReceiptDocument, ReceiptFormatter, StoreProfile};
use crate::transport::ble::BleCentral;
use crate::transport::connector::{ConnectionStatus, DeviceConnector};
use crate::transport::gatt::Central;
use crate::transport::scheduler::Scheduler;

pub struct PrinterDriver<C: Central> {
    connector: DeviceConnector<C>,
    formatter: ReceiptFormatter,
    scheduler: Scheduler,
    store: StoreProfile,
}

impl PrinterDriver<BleCentral> {
    /// A driver for a 58mm printer on the host's first Bluetooth adapter.
    pub async fn ble() -> Result<Self, PrinterError> {
        let central = BleCentral::new().await?;
        Ok(Self::new(central, PrinterConfig::MM58, PrinterProfile::default()))
    }
}

impl<C: Central> PrinterDriver<C> {
    pub fn new(central: C, config: PrinterConfig, profile: PrinterProfile) -> Self {
        Self {
            connector: DeviceConnector::new(central, profile),
            formatter: ReceiptFormatter::new(config),
            scheduler: Scheduler::new(&config),
            store: StoreProfile::default(),
        }
    }

    /// Print this encoded image at the top of every receipt.
    pub fn with_logo(mut self, encoded: Vec<u8>) -> Self {
        self.formatter = self.formatter.with_logo(encoded);
        self
    }

    /// Store shown on the test page.
    pub fn with_store(mut self, store: StoreProfile) -> Self {
        self.store = store;
        self
    }

    pub fn formatter(&self) -> &ReceiptFormatter {
        &self.formatter
    }

    pub fn connector(&mut self) -> &mut DeviceConnector<C> {
        &mut self.connector
    }

    /// Receive every connection status transition from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConnectionStatus> {
        self.connector.subscribe()
    }

    pub async fn connect(&mut self) -> Result<ConnectionStatus, PrinterError> {
        self.connector.connect().await
    }

    pub async fn is_connected(&mut self) -> bool {
        self.connector.is_connected().await
    }

    pub async fn disconnect(&mut self) {
        self.connector.disconnect().await
    }

    /// Print a short banner to check the link.
    pub async fn print_test(&mut self) -> Result<(), PrinterError> {
        let buffer = CommandBuffer::from(&self.formatter.test_page(&self.store));
        info!("Printing test page");
        self.send(buffer).await
    }

    /// Print a receipt. Documents whose amounts overflow are refused before
    /// anything is sent.
    pub async fn print_receipt(&mut self, doc: &ReceiptDocument) -> Result<(), PrinterError> {
        doc.validate()?;
        let buffer = self.formatter.render(doc);
        info!(items = doc.items.len(), total = doc.total, "Printing receipt");
        self.send(buffer).await
    }

    /// Print an encoded image (PNG, JPEG, ...) on its own.
    pub async fn print_image(&mut self, encoded: &[u8]) -> Result<(), PrinterError> {
        let buffer = CommandBuffer::from(&self.formatter.image_page(encoded)?);
        info!("Printing image");
        self.send(buffer).await
    }

    /// Transmit a finished buffer. Requires a live connection; the driver
    /// never connects on its own.
    pub async fn send(&mut self, buffer: CommandBuffer) -> Result<(), PrinterError> {
        if !self.connector.is_connected().await {
            return Err(PrinterError::NotConnected);
        }
        let handle = self.connector.handle().ok_or(PrinterError::NotConnected)?;
        self.scheduler.transmit(handle, &buffer).await?;
        info!(bytes = buffer.len(), "Print job sent");
        Ok(())
    }
}
