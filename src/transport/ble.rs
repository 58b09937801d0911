//! # BLE Transport (btleplug)
//!
//! [`Central`] and [`GattDevice`] over the host's Bluetooth stack.
//!
//! The "chooser" is a bounded scan: the first peripheral that matches the
//! request within its scan window is selected. Nothing matching before the
//! window closes is reported as `DeviceNotSelected`, the same as a user
//! dismissing a picker.
//!
//! An unfiltered request without a name filter accepts any peripheral with a
//! name, so a phone or headset in range can win the scan. Printers that do
//! not advertise the standard service need `PrinterProfile::name_filter`.

use async_trait::async_trait;
use btleplug::api::{
    Central as _, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    PeripheralProperties, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::gatt::{
    Central, CharacteristicProperties, DeviceRequest, GattCharacteristic, GattDevice, GattError,
    GattService, LinkEvent, WriteMode,
};
use crate::error::PrinterError;

impl From<btleplug::Error> for GattError {
    fn from(e: btleplug::Error) -> Self {
        GattError(e.to_string())
    }
}

/// The host's first Bluetooth adapter.
#[derive(Clone)]
pub struct BleCentral {
    adapter: Adapter,
}

impl BleCentral {
    /// Open the first adapter. Fails with `TransportUnsupported` when the
    /// platform has no BLE stack or no adapter.
    pub async fn new() -> Result<Self, PrinterError> {
        let manager = Manager::new()
            .await
            .map_err(|e| PrinterError::TransportUnsupported(e.to_string()))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| PrinterError::TransportUnsupported(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PrinterError::TransportUnsupported("no Bluetooth adapter found".to_string())
            })?;

        match adapter.adapter_info().await {
            Ok(info) => info!(adapter = %info, "Bluetooth adapter ready"),
            Err(e) => debug!(error = %e, "Adapter info unavailable"),
        }
        Ok(Self { adapter })
    }

    async fn matching(&self, id: &PeripheralId, request: &DeviceRequest) -> Option<BlePrinter> {
        let peripheral = self.adapter.peripheral(id).await.ok()?;
        let props = peripheral.properties().await.ok()??;
        if !matches_request(&props, request) {
            return None;
        }
        Some(BlePrinter {
            adapter: self.adapter.clone(),
            name: props.local_name.unwrap_or_default(),
            peripheral,
        })
    }

    async fn scan(&self, request: &DeviceRequest) -> Result<Option<BlePrinter>, PrinterError> {
        let mut events = self
            .adapter
            .events()
            .await
            .map_err(|e| PrinterError::TransportUnsupported(e.to_string()))?;

        let filter = ScanFilter {
            services: request.filter.clone().unwrap_or_default(),
        };
        self.adapter
            .start_scan(filter)
            .await
            .map_err(|e| PrinterError::DeviceNotSelected(e.to_string()))?;

        // Already-known peripherals never produce a DeviceDiscovered event
        if let Ok(known) = self.adapter.peripherals().await {
            for peripheral in known {
                if let Some(found) = self.matching(&peripheral.id(), request).await {
                    return Ok(Some(found));
                }
            }
        }

        let deadline = tokio::time::sleep(request.scan_window);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return Ok(None),
                event = events.next() => match event {
                    Some(CentralEvent::DeviceDiscovered(id))
                    | Some(CentralEvent::DeviceUpdated(id))
                    | Some(CentralEvent::ServicesAdvertisement { id, .. }) => {
                        if let Some(found) = self.matching(&id, request).await {
                            return Ok(Some(found));
                        }
                    }
                    Some(_) => {}
                    None => return Ok(None),
                },
            }
        }
    }
}

fn matches_request(props: &PeripheralProperties, request: &DeviceRequest) -> bool {
    match &request.filter {
        Some(services) => props.services.iter().any(|s| services.contains(s)),
        None => {
            let name = props.local_name.as_deref().unwrap_or_default();
            !name.is_empty()
                && request
                    .name_filter
                    .as_deref()
                    .is_none_or(|wanted| name.contains(wanted))
        }
    }
}

#[async_trait]
impl Central for BleCentral {
    type Device = BlePrinter;

    async fn request_device(&self, request: &DeviceRequest) -> Result<BlePrinter, PrinterError> {
        info!(
            filter = ?request.filter,
            window = ?request.scan_window,
            "Scanning for printers"
        );
        let found = self.scan(request).await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!(error = %e, "Failed to stop scan");
        }

        match found? {
            Some(printer) => {
                info!(device = %printer.name, "Printer selected");
                Ok(printer)
            }
            None => Err(PrinterError::DeviceNotSelected(
                "no printer found before the scan window closed".to_string(),
            )),
        }
    }
}

/// A peripheral picked by [`BleCentral`].
#[derive(Clone)]
pub struct BlePrinter {
    adapter: Adapter,
    peripheral: Peripheral,
    name: String,
}

impl BlePrinter {
    fn characteristic(&self, wanted: &GattCharacteristic) -> Result<Characteristic, GattError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == wanted.uuid && c.service_uuid == wanted.service)
            .ok_or_else(|| GattError(format!("characteristic {} not found", wanted.uuid)))
    }
}

fn properties(flags: CharPropFlags) -> CharacteristicProperties {
    CharacteristicProperties {
        read: flags.contains(CharPropFlags::READ),
        write: flags.contains(CharPropFlags::WRITE),
        write_without_response: flags.contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
        notify: flags.contains(CharPropFlags::NOTIFY),
    }
}

#[async_trait]
impl GattDevice for BlePrinter {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), GattError> {
        self.peripheral.connect().await?;
        self.peripheral.discover_services().await?;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn primary_service(&self, uuid: Uuid) -> Result<Option<GattService>, GattError> {
        if !self.peripheral.is_connected().await? {
            return Err(GattError("GATT server is disconnected".to_string()));
        }
        Ok(self
            .peripheral
            .services()
            .into_iter()
            .find(|s| s.primary && s.uuid == uuid)
            .map(|s| GattService {
                uuid: s.uuid,
                characteristics: s
                    .characteristics
                    .iter()
                    .map(|c| GattCharacteristic::new(s.uuid, c.uuid, properties(c.properties)))
                    .collect(),
            }))
    }

    async fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), GattError> {
        let target = self.characteristic(characteristic)?;
        let write_type = match mode {
            WriteMode::WithResponse => WriteType::WithResponse,
            WriteMode::WithoutResponse => WriteType::WithoutResponse,
        };
        self.peripheral.write(&target, data, write_type).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), GattError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }

    async fn link_events(&self) -> Result<BoxStream<'static, LinkEvent>, GattError> {
        let id = self.peripheral.id();
        let events = self.adapter.events().await?;
        Ok(events
            .filter_map(move |event| {
                let disconnected = matches!(&event, CentralEvent::DeviceDisconnected(gone) if *gone == id);
                async move { disconnected.then_some(LinkEvent::Disconnected) }
            })
            .boxed())
    }
}
