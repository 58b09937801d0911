//! # GATT Seam
//!
//! The narrow interface the connector and scheduler need from a BLE stack:
//! pick a device, open its GATT server, look up a primary service, write to a
//! characteristic, and hear about link loss.
//!
//! [`super::ble`] implements it over btleplug; [`super::memory`] is an
//! in-process fake for tests and dry runs.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

use crate::error::PrinterError;

/// A failure reported by the BLE stack for an individual GATT operation.
///
/// The connector and scheduler translate it into the [`PrinterError`]
/// variant matching the step that failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct GattError(pub String);

/// Operations a characteristic advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicProperties {
    pub read: bool,
    pub write: bool,
    pub write_without_response: bool,
    pub notify: bool,
}

impl CharacteristicProperties {
    pub fn writable() -> Self {
        Self {
            write: true,
            ..Default::default()
        }
    }

    pub fn write_without_response() -> Self {
        Self {
            write_without_response: true,
            ..Default::default()
        }
    }

    pub fn notify() -> Self {
        Self {
            notify: true,
            ..Default::default()
        }
    }
}

/// ATT write flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write Request, acknowledged by the peripheral
    WithResponse,
    /// Write Command, fire and forget
    WithoutResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: Uuid,
    /// UUID of the owning service
    pub service: Uuid,
    pub properties: CharacteristicProperties,
}

impl GattCharacteristic {
    pub fn new(service: Uuid, uuid: Uuid, properties: CharacteristicProperties) -> Self {
        Self {
            uuid,
            service,
            properties,
        }
    }

    /// Acknowledged writes when the characteristic supports them, write
    /// commands otherwise.
    pub fn preferred_write_mode(&self) -> WriteMode {
        if self.properties.write_without_response && !self.properties.write {
            WriteMode::WithoutResponse
        } else {
            WriteMode::WithResponse
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    pub uuid: Uuid,
    pub characteristics: Vec<GattCharacteristic>,
}

/// Parameters for one run of the device chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    /// Only devices advertising one of these services; `None` accepts any
    pub filter: Option<Vec<Uuid>>,
    /// Services the chosen device may be queried for after connecting
    pub optional_services: Vec<Uuid>,
    /// Substring the device name must contain (unfiltered requests only)
    pub name_filter: Option<String>,
    pub scan_window: Duration,
}

/// Asynchronous notifications from the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The peripheral dropped the connection without being asked to
    Disconnected,
}

/// The BLE central role: finds printers.
#[async_trait]
pub trait Central: Send + Sync {
    type Device: GattDevice;

    /// Run the device chooser once.
    ///
    /// Fails with `DeviceNotSelected` when nothing matched or the chooser was
    /// dismissed, `TransportUnsupported` when there is no BLE stack at all.
    async fn request_device(&self, request: &DeviceRequest) -> Result<Self::Device, PrinterError>;
}

/// One remote peripheral and its GATT server.
#[async_trait]
pub trait GattDevice: Send + Sync + 'static {
    /// Advertised name, empty if none
    fn name(&self) -> String;

    /// Open the GATT connection and discover services.
    async fn connect(&self) -> Result<(), GattError>;

    /// Whether the link is currently up.
    async fn is_connected(&self) -> bool;

    /// Look up a primary service; `Ok(None)` if the device does not have it.
    async fn primary_service(&self, uuid: Uuid) -> Result<Option<GattService>, GattError>;

    /// Write one ATT payload and wait for it to be accepted.
    async fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), GattError>;

    /// Close the GATT connection. Closing a closed link is not an error.
    async fn disconnect(&self) -> Result<(), GattError>;

    /// Stream of link events for this device.
    async fn link_events(&self) -> Result<BoxStream<'static, LinkEvent>, GattError>;
}
