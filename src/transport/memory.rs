//! # In-Memory Transport
//!
//! A scripted stand-in for a BLE stack. Printers are described up front
//! (advertised services, GATT table, failures to inject); every write is
//! recorded so tests can inspect exactly what reached the "device".
//!
//! ```
//! use struk::printer::config::{STANDARD_SERVICE, STANDARD_WRITE_CHARACTERISTIC};
//! use struk::transport::gatt::CharacteristicProperties;
//! use struk::transport::memory::{MemoryCentral, MemoryPrinter};
//!
//! let printer = MemoryPrinter::new("RPP02")
//!     .advertising(STANDARD_SERVICE)
//!     .with_characteristic(
//!         STANDARD_SERVICE,
//!         STANDARD_WRITE_CHARACTERISTIC,
//!         CharacteristicProperties::writable(),
//!     );
//! let central = MemoryCentral::new().with_printer(printer.clone());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use uuid::Uuid;

use super::gatt::{
    Central, CharacteristicProperties, DeviceRequest, GattCharacteristic, GattDevice, GattError,
    GattService, LinkEvent, WriteMode,
};
use crate::error::PrinterError;

/// A recorded characteristic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub characteristic: Uuid,
    pub data: Vec<u8>,
    pub mode: WriteMode,
}

#[derive(Default)]
struct PrinterState {
    advertised: Vec<Uuid>,
    services: Vec<GattService>,
    connected: bool,
    connect_error: Option<String>,
    fail_write_at: Option<usize>,
    drop_after_lookup: bool,
    write_attempts: usize,
    writes: Vec<RecordedWrite>,
    listeners: Vec<mpsc::UnboundedSender<LinkEvent>>,
}

/// A fake printer. Clones share state, so a test can keep one clone while
/// the connector owns another.
#[derive(Clone)]
pub struct MemoryPrinter {
    name: String,
    state: Arc<Mutex<PrinterState>>,
}

impl MemoryPrinter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(PrinterState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, PrinterState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Advertise a service UUID in scan responses.
    pub fn advertising(self, service: Uuid) -> Self {
        self.state().advertised.push(service);
        self
    }

    /// Add a characteristic, creating its service on first use.
    pub fn with_characteristic(
        self,
        service: Uuid,
        uuid: Uuid,
        properties: CharacteristicProperties,
    ) -> Self {
        {
            let mut state = self.state();
            let characteristic = GattCharacteristic::new(service, uuid, properties);
            match state.services.iter_mut().find(|s| s.uuid == service) {
                Some(existing) => existing.characteristics.push(characteristic),
                None => state.services.push(GattService {
                    uuid: service,
                    characteristics: vec![characteristic],
                }),
            }
        }
        self
    }

    /// Make the GATT connection fail.
    pub fn failing_connect(self, reason: impl Into<String>) -> Self {
        self.state().connect_error = Some(reason.into());
        self
    }

    /// Make the n-th write attempt (0-based) and every later one fail.
    pub fn failing_write_at(self, index: usize) -> Self {
        self.state().fail_write_at = Some(index);
        self
    }

    /// Drop the link right after the first successful service lookup.
    pub fn dropping_link_after_lookup(self) -> Self {
        self.state().drop_after_lookup = true;
        self
    }

    /// Simulate the peripheral dropping the link.
    pub fn drop_link(&self) {
        Self::lose_link(&mut self.state());
    }

    fn lose_link(state: &mut PrinterState) {
        state.connected = false;
        state
            .listeners
            .retain(|tx| tx.unbounded_send(LinkEvent::Disconnected).is_ok());
    }

    pub fn is_link_up(&self) -> bool {
        self.state().connected
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state().writes.clone()
    }

    /// All successfully written bytes, concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state()
            .writes
            .iter()
            .flat_map(|w| w.data.iter().copied())
            .collect()
    }

    fn advertises_any(&self, services: &[Uuid]) -> bool {
        let state = self.state();
        services.iter().any(|s| state.advertised.contains(s))
    }
}

#[async_trait]
impl GattDevice for MemoryPrinter {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), GattError> {
        let mut state = self.state();
        if let Some(reason) = &state.connect_error {
            return Err(GattError(reason.clone()));
        }
        state.connected = true;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state().connected
    }

    async fn primary_service(&self, uuid: Uuid) -> Result<Option<GattService>, GattError> {
        let mut state = self.state();
        if !state.connected {
            return Err(GattError("GATT server is disconnected".to_string()));
        }
        let found = state.services.iter().find(|s| s.uuid == uuid).cloned();
        if found.is_some() && state.drop_after_lookup {
            state.drop_after_lookup = false;
            Self::lose_link(&mut state);
        }
        Ok(found)
    }

    async fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), GattError> {
        let mut state = self.state();
        let attempt = state.write_attempts;
        state.write_attempts += 1;

        if !state.connected {
            return Err(GattError("GATT server is disconnected".to_string()));
        }
        if state.fail_write_at.is_some_and(|n| attempt >= n) {
            return Err(GattError("GATT operation failed".to_string()));
        }
        state.writes.push(RecordedWrite {
            characteristic: characteristic.uuid,
            data: data.to_vec(),
            mode,
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), GattError> {
        self.state().connected = false;
        Ok(())
    }

    async fn link_events(&self) -> Result<BoxStream<'static, LinkEvent>, GattError> {
        let (tx, rx) = mpsc::unbounded();
        self.state().listeners.push(tx);
        Ok(rx.boxed())
    }
}

/// A fake BLE central holding a fixed set of nearby printers.
///
/// The chooser picks the first printer matching the request, in the order
/// printers were added.
#[derive(Clone, Default)]
pub struct MemoryCentral {
    printers: Vec<MemoryPrinter>,
    requests: Arc<Mutex<Vec<DeviceRequest>>>,
    unsupported: bool,
}

impl MemoryCentral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(mut self, printer: MemoryPrinter) -> Self {
        self.printers.push(printer);
        self
    }

    /// Behave like a platform with no BLE support.
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Every chooser request made so far.
    pub fn requests(&self) -> Vec<DeviceRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Central for MemoryCentral {
    type Device = MemoryPrinter;

    async fn request_device(&self, request: &DeviceRequest) -> Result<MemoryPrinter, PrinterError> {
        if self.unsupported {
            return Err(PrinterError::TransportUnsupported(
                "no Bluetooth adapter".to_string(),
            ));
        }
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let chosen = self.printers.iter().find(|p| match &request.filter {
            Some(services) => p.advertises_any(services),
            None => request
                .name_filter
                .as_deref()
                .is_none_or(|name| p.name.contains(name)),
        });

        chosen
            .cloned()
            .ok_or_else(|| PrinterError::DeviceNotSelected("no matching device found".to_string()))
    }
}
