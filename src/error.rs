//! # Error Types
//!
//! This module defines the error taxonomy surfaced by the driver. Every
//! failure in discovery, resolution, transmission or image handling reaches
//! the immediate caller as one of these variants; nothing is retried.

use thiserror::Error;

/// Main error type for driver operations
#[derive(Debug, Error)]
pub enum PrinterError {
    /// No usable BLE stack or adapter on this platform
    #[error("Bluetooth LE is not available: {0}")]
    TransportUnsupported(String),

    /// The device chooser produced no device (nothing matched, or cancelled)
    #[error("No printer selected: {0}")]
    DeviceNotSelected(String),

    /// Opening the GATT connection failed
    #[error("GATT connection failed: {0}")]
    GattConnectFailed(String),

    /// None of the supported printer services resolved on the device
    #[error("Could not find supported printer service")]
    ServiceNotFound,

    /// The resolved service exposes no characteristic we can write to
    #[error("No writable characteristic found")]
    NoWritableCharacteristic,

    /// A chunk write failed mid-stream; the rest of the buffer was dropped
    #[error("Write failed at chunk {chunk}/{total}: {reason}")]
    WriteFailed {
        chunk: usize,
        total: usize,
        reason: String,
    },

    /// The source image could not be decoded
    #[error("Failed to decode image: {0}")]
    ImageDecodeFailed(String),

    /// The decoded image cannot be expressed as a raster command
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The receipt's amounts cannot be represented
    #[error("Receipt amounts out of range: {0}")]
    InvalidDocument(String),

    /// A print was requested without a live printer handle
    #[error("Printer not connected")]
    NotConnected,

    /// Receipt document could not be parsed
    #[error("Invalid receipt document: {0}")]
    Document(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrinterError {
    /// Whether this error happened while acquiring the link, as opposed to
    /// while printing over an already established one.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::TransportUnsupported(_)
                | Self::DeviceNotSelected(_)
                | Self::GattConnectFailed(_)
                | Self::ServiceNotFound
                | Self::NoWritableCharacteristic
        )
    }
}
