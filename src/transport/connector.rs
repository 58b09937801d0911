//! # Device Connector
//!
//! Owns the BLE link as an explicit state machine:
//!
//! ```text
//!                 connect()
//! Disconnected ─────────────► Connecting ──┬──► Connected(handle)
//!      ▲                                   └──► Failed(reason)
//!      │   disconnect() / LinkEvent::Disconnected      │
//!      └───────────────────────────────────────────────┘
//! ```
//!
//! The [`PrinterHandle`] lives only inside `Connected`, so holding a
//! `&PrinterHandle` is proof of a connected state. Link loss arrives as a
//! [`LinkEvent`] message that is drained into the state machine the next time
//! the connector is consulted; nothing mutates state from a callback.
//!
//! ## Discovery
//!
//! Each step tries an explicit, ordered list of strategies and stops at the
//! first success, logging every failed attempt:
//!
//! 1. Chooser: [`DiscoveryStrategy::ORDER`] (filtered by the standard
//!    service, then unfiltered)
//! 2. Service: `PrinterProfile::service_order`, restricted to the services the
//!    successful chooser request whitelisted
//! 3. Characteristic: [`CharacteristicRule::ORDER`]
//!
//! Nothing is retried automatically; a failed `connect()` leaves the state
//! `Failed` until the caller tries again.

use futures::FutureExt;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::gatt::{
    Central, DeviceRequest, GattCharacteristic, GattDevice, GattError, GattService, LinkEvent,
    WriteMode,
};
use crate::error::PrinterError;
use crate::printer::PrinterProfile;

// ============================================================================
// STATE
// ============================================================================

/// A live, resolved printer: the device plus the characteristic we write to.
///
/// Not `Clone`; at most one exists per connector and it is dropped on
/// disconnect or link loss.
pub struct PrinterHandle<D: GattDevice> {
    device: D,
    characteristic: GattCharacteristic,
    write_mode: WriteMode,
}

impl<D: GattDevice> PrinterHandle<D> {
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn characteristic(&self) -> &GattCharacteristic {
        &self.characteristic
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Write one payload to the resolved characteristic.
    pub async fn write(&self, data: &[u8]) -> Result<(), GattError> {
        self.device
            .write(&self.characteristic, data, self.write_mode)
            .await
    }
}

impl<D: GattDevice> std::fmt::Debug for PrinterHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterHandle")
            .field("device", &self.device.name())
            .field("characteristic", &self.characteristic.uuid)
            .field("write_mode", &self.write_mode)
            .finish()
    }
}

/// Connection state, carrying the handle only when connected.
pub enum ConnectionState<D: GattDevice> {
    Disconnected,
    Connecting,
    Connected(PrinterHandle<D>),
    Failed(String),
}

impl<D: GattDevice> ConnectionState<D> {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            Self::Disconnected => ConnectionStatus::Disconnected,
            Self::Connecting => ConnectionStatus::Connecting,
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Failed(reason) => ConnectionStatus::Failed(reason.clone()),
        }
    }
}

impl<D: GattDevice> std::fmt::Debug for ConnectionState<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(handle) => f.debug_tuple("Connected").field(handle).finish(),
            other => write!(f, "{:?}", other.status()),
        }
    }
}

/// Observable projection of [`ConnectionState`], without the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Terputus"),
            Self::Connecting => write!(f, "Mencari printer..."),
            Self::Connected => write!(f, "Terhubung"),
            Self::Failed(reason) => write!(f, "gagal terkoneksi ke printer: {}", reason),
        }
    }
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// How the device chooser is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Only devices advertising the standard printer service
    Filtered,
    /// Any device, optionally narrowed by name
    AcceptAll,
}

impl DiscoveryStrategy {
    pub const ORDER: [Self; 2] = [Self::Filtered, Self::AcceptAll];

    pub fn request(self, profile: &PrinterProfile) -> DeviceRequest {
        match self {
            Self::Filtered => DeviceRequest {
                filter: Some(vec![profile.standard_service]),
                optional_services: profile.optional_services.clone(),
                name_filter: None,
                scan_window: profile.scan_window,
            },
            Self::AcceptAll => DeviceRequest {
                filter: None,
                optional_services: profile.fallback_services.clone(),
                name_filter: profile.name_filter.clone(),
                scan_window: profile.scan_window,
            },
        }
    }
}

/// How a characteristic is picked within the resolved service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicRule {
    /// First characteristic supporting write-without-response
    WriteWithoutResponse,
    /// First characteristic supporting acknowledged writes
    Write,
    /// First known printer characteristic UUID present, whatever it advertises
    KnownUuid,
}

impl CharacteristicRule {
    pub const ORDER: [Self; 3] = [Self::WriteWithoutResponse, Self::Write, Self::KnownUuid];

    pub fn select<'a>(
        self,
        service: &'a GattService,
        profile: &PrinterProfile,
    ) -> Option<&'a GattCharacteristic> {
        let chars = &service.characteristics;
        match self {
            Self::WriteWithoutResponse => chars.iter().find(|c| c.properties.write_without_response),
            Self::Write => chars.iter().find(|c| c.properties.write),
            Self::KnownUuid => profile
                .candidate_characteristics
                .iter()
                .find_map(|uuid| chars.iter().find(|c| c.uuid == *uuid)),
        }
    }
}

/// Pick the characteristic to write to, in [`CharacteristicRule::ORDER`].
pub fn select_characteristic(
    service: &GattService,
    profile: &PrinterProfile,
) -> Result<GattCharacteristic, PrinterError> {
    for rule in CharacteristicRule::ORDER {
        if let Some(found) = rule.select(service, profile) {
            debug!(?rule, characteristic = %found.uuid, "Characteristic selected");
            return Ok(found.clone());
        }
    }
    Err(PrinterError::NoWritableCharacteristic)
}

// ============================================================================
// CONNECTOR
// ============================================================================

/// Acquires and holds the BLE link to one printer.
pub struct DeviceConnector<C: Central> {
    central: C,
    profile: PrinterProfile,
    state: ConnectionState<C::Device>,
    events: Option<BoxStream<'static, LinkEvent>>,
    observers: Vec<mpsc::UnboundedSender<ConnectionStatus>>,
}

impl<C: Central> DeviceConnector<C> {
    pub fn new(central: C, profile: PrinterProfile) -> Self {
        Self {
            central,
            profile,
            state: ConnectionState::Disconnected,
            events: None,
            observers: Vec::new(),
        }
    }

    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    pub fn central(&self) -> &C {
        &self.central
    }

    /// Receive every status transition from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConnectionStatus> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    /// Current state, after applying pending link events.
    pub fn state(&mut self) -> &ConnectionState<C::Device> {
        self.poll_link_events();
        &self.state
    }

    pub fn status(&mut self) -> ConnectionStatus {
        self.state().status()
    }

    /// The live handle, if connected. Does not consult pending link events;
    /// call [`Self::is_connected`] first.
    pub fn handle(&self) -> Option<&PrinterHandle<C::Device>> {
        match &self.state {
            ConnectionState::Connected(handle) => Some(handle),
            _ => None,
        }
    }

    /// True iff the link reports connected and a characteristic is held.
    pub async fn is_connected(&mut self) -> bool {
        self.poll_link_events();
        match &self.state {
            ConnectionState::Connected(handle) => handle.device.is_connected().await,
            _ => false,
        }
    }

    /// Discover, connect and resolve a writable characteristic.
    ///
    /// An existing connection is closed first. On failure the state is
    /// `Failed` and the error is returned; nothing is retried.
    pub async fn connect(&mut self) -> Result<ConnectionStatus, PrinterError> {
        self.disconnect().await;
        self.transition(ConnectionState::Connecting);

        match self.establish().await {
            Ok((handle, events)) => {
                info!(
                    device = %handle.device.name(),
                    service = %handle.characteristic.service,
                    characteristic = %handle.characteristic.uuid,
                    mode = ?handle.write_mode,
                    "Printer connected"
                );
                self.events = Some(events);
                self.transition(ConnectionState::Connected(handle));
                Ok(ConnectionStatus::Connected)
            }
            Err(e) => {
                warn!(error = %e, "Printer connection failed");
                self.transition(ConnectionState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Release the GATT connection. Idempotent.
    pub async fn disconnect(&mut self) {
        self.events = None;
        match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
            ConnectionState::Connected(handle) => {
                if let Err(e) = handle.device.disconnect().await {
                    warn!(error = %e, "GATT disconnect failed");
                }
                info!(device = %handle.device.name(), "Printer disconnected");
                self.notify(ConnectionStatus::Disconnected);
            }
            ConnectionState::Disconnected => {}
            _ => self.notify(ConnectionStatus::Disconnected),
        }
    }

    async fn establish(
        &self,
    ) -> Result<(PrinterHandle<C::Device>, BoxStream<'static, LinkEvent>), PrinterError> {
        let (device, request) = self.choose_device().await?;

        // Listen before connecting so a drop during resolution is not missed
        let events = device
            .link_events()
            .await
            .map_err(|e| PrinterError::GattConnectFailed(e.0))?;

        info!(device = %device.name(), "Connecting to GATT server");
        device
            .connect()
            .await
            .map_err(|e| PrinterError::GattConnectFailed(e.0))?;

        match self.resolve(&device, &request).await {
            Ok(characteristic) => {
                let write_mode = characteristic.preferred_write_mode();
                Ok((
                    PrinterHandle {
                        device,
                        characteristic,
                        write_mode,
                    },
                    events,
                ))
            }
            Err(e) => {
                if let Err(close) = device.disconnect().await {
                    debug!(error = %close, "Closing half-open connection failed");
                }
                Err(e)
            }
        }
    }

    async fn choose_device(&self) -> Result<(C::Device, DeviceRequest), PrinterError> {
        let mut last_error = None;

        for strategy in DiscoveryStrategy::ORDER {
            let request = strategy.request(&self.profile);
            info!(?strategy, "Requesting printer");
            if request.filter.is_none() && request.name_filter.is_none() {
                warn!("Unfiltered scan without a name filter takes the first named device");
            }
            match self.central.request_device(&request).await {
                Ok(device) => return Ok((device, request)),
                Err(e @ PrinterError::TransportUnsupported(_)) => return Err(e),
                Err(e) => {
                    warn!(?strategy, error = %e, "Discovery attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| PrinterError::DeviceNotSelected("no discovery strategy".into())))
    }

    async fn resolve(
        &self,
        device: &C::Device,
        request: &DeviceRequest,
    ) -> Result<GattCharacteristic, PrinterError> {
        let service = self.resolve_service(device, request).await?;
        select_characteristic(&service, &self.profile)
    }

    async fn resolve_service(
        &self,
        device: &C::Device,
        request: &DeviceRequest,
    ) -> Result<GattService, PrinterError> {
        for uuid in &self.profile.service_order {
            if !request.optional_services.contains(uuid) {
                debug!(service = %uuid, "Service not whitelisted for this request");
                continue;
            }
            match device.primary_service(*uuid).await {
                Ok(Some(service)) => {
                    info!(service = %uuid, "Printer service resolved");
                    return Ok(service);
                }
                Ok(None) => debug!(service = %uuid, "Service not present"),
                Err(e) => warn!(service = %uuid, error = %e, "Service lookup failed"),
            }
        }
        Err(PrinterError::ServiceNotFound)
    }

    fn poll_link_events(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };

        let mut dropped = false;
        let mut ended = false;
        loop {
            match events.next().now_or_never() {
                Some(Some(LinkEvent::Disconnected)) => dropped = true,
                Some(None) => {
                    ended = true;
                    break;
                }
                None => break,
            }
        }

        if ended {
            self.events = None;
        }
        if dropped {
            self.invalidate();
        }
    }

    /// Apply a link drop: the handle is discarded without touching the
    /// (already gone) GATT server.
    fn invalidate(&mut self) {
        self.events = None;
        if let ConnectionState::Connected(handle) = &self.state {
            info!(device = %handle.device.name(), "Printer link dropped");
            self.transition(ConnectionState::Disconnected);
        }
    }

    fn transition(&mut self, next: ConnectionState<C::Device>) {
        let status = next.status();
        debug!(from = ?self.state.status(), to = ?status, "Connection state");
        self.state = next;
        self.notify(status);
    }

    fn notify(&mut self, status: ConnectionStatus) {
        self.observers.retain(|tx| tx.send(status.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::config::{
        ISSC_SERVICE, ISSC_WRITE_CHARACTERISTIC, STANDARD_SERVICE, STANDARD_WRITE_CHARACTERISTIC,
        VENDOR_SERVICE,
    };
    use crate::transport::gatt::CharacteristicProperties;
    use crate::transport::memory::{MemoryCentral, MemoryPrinter};
    use uuid::Uuid;

    const NOTIFY_CHAR: Uuid = Uuid::from_u128(0x00002af0_0000_1000_8000_00805f9b34fb);
    const UNKNOWN_SERVICE: Uuid = Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);

    fn standard_printer() -> MemoryPrinter {
        MemoryPrinter::new("RPP02N")
            .advertising(STANDARD_SERVICE)
            .with_characteristic(STANDARD_SERVICE, NOTIFY_CHAR, CharacteristicProperties::notify())
            .with_characteristic(
                STANDARD_SERVICE,
                STANDARD_WRITE_CHARACTERISTIC,
                CharacteristicProperties::writable(),
            )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConnectionStatus>) -> Vec<ConnectionStatus> {
        let mut seen = Vec::new();
        while let Ok(status) = rx.try_recv() {
            seen.push(status);
        }
        seen
    }

    #[tokio::test]
    async fn test_connect_success_transitions() {
        let printer = standard_printer();
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer.clone()),
            PrinterProfile::default(),
        );
        let mut rx = connector.subscribe();
        assert_eq!(connector.status(), ConnectionStatus::Disconnected);

        let status = connector.connect().await.unwrap();
        assert_eq!(status, ConnectionStatus::Connected);
        assert_eq!(
            drain(&mut rx),
            vec![ConnectionStatus::Connecting, ConnectionStatus::Connected]
        );
        assert!(connector.is_connected().await);

        let handle = connector.handle().unwrap();
        assert_eq!(handle.characteristic().uuid, STANDARD_WRITE_CHARACTERISTIC);
        assert_eq!(handle.write_mode(), WriteMode::WithResponse);
    }

    #[tokio::test]
    async fn test_connect_fails_without_candidate_service() {
        let printer = MemoryPrinter::new("Heart Rate Strap")
            .advertising(UNKNOWN_SERVICE)
            .with_characteristic(
                UNKNOWN_SERVICE,
                Uuid::from_u128(0x2a37),
                CharacteristicProperties::writable(),
            );
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer.clone()),
            PrinterProfile::default(),
        );
        let mut rx = connector.subscribe();
        assert_eq!(connector.status(), ConnectionStatus::Disconnected);

        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, PrinterError::ServiceNotFound));

        let seen = drain(&mut rx);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ConnectionStatus::Connecting);
        assert!(matches!(seen[1], ConnectionStatus::Failed(_)));
        assert!(!connector.is_connected().await);
        // The half-open GATT connection is closed again
        assert!(!printer.is_link_up());
    }

    #[tokio::test]
    async fn test_filtered_then_unfiltered_chooser() {
        // Advertises nothing, so only the unfiltered chooser can find it
        let printer = MemoryPrinter::new("BlueBamboo P25").with_characteristic(
            ISSC_SERVICE,
            ISSC_WRITE_CHARACTERISTIC,
            CharacteristicProperties::write_without_response(),
        );
        let central = MemoryCentral::new().with_printer(printer);
        let mut connector = DeviceConnector::new(central.clone(), PrinterProfile::default());

        connector.connect().await.unwrap();

        let requests = central.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].filter, Some(vec![STANDARD_SERVICE]));
        assert_eq!(requests[1].filter, None);
        assert!(!requests[1].optional_services.contains(&VENDOR_SERVICE));

        let handle = connector.handle().unwrap();
        assert_eq!(handle.characteristic().service, ISSC_SERVICE);
        assert_eq!(handle.write_mode(), WriteMode::WithoutResponse);
    }

    #[tokio::test]
    async fn test_no_device_selected() {
        let mut connector =
            DeviceConnector::new(MemoryCentral::new(), PrinterProfile::default());
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, PrinterError::DeviceNotSelected(_)));
        assert!(matches!(connector.status(), ConnectionStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_transport_unsupported_skips_fallback() {
        let central = MemoryCentral::unsupported();
        let mut connector = DeviceConnector::new(central, PrinterProfile::default());
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, PrinterError::TransportUnsupported(_)));
    }

    #[tokio::test]
    async fn test_gatt_connect_failure() {
        let printer = standard_printer().failing_connect("connection timed out");
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer),
            PrinterProfile::default(),
        );
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, PrinterError::GattConnectFailed(reason) if reason == "connection timed out"));
    }

    #[tokio::test]
    async fn test_no_writable_characteristic() {
        let printer = MemoryPrinter::new("RPP02N")
            .advertising(STANDARD_SERVICE)
            .with_characteristic(STANDARD_SERVICE, NOTIFY_CHAR, CharacteristicProperties::notify());
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer),
            PrinterProfile::default(),
        );
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, PrinterError::NoWritableCharacteristic));
    }

    #[test]
    fn test_characteristic_priority() {
        let profile = PrinterProfile::default();
        let service = GattService {
            uuid: STANDARD_SERVICE,
            characteristics: vec![
                GattCharacteristic::new(
                    STANDARD_SERVICE,
                    STANDARD_WRITE_CHARACTERISTIC,
                    CharacteristicProperties::notify(),
                ),
                GattCharacteristic::new(
                    STANDARD_SERVICE,
                    Uuid::from_u128(1),
                    CharacteristicProperties::writable(),
                ),
                GattCharacteristic::new(
                    STANDARD_SERVICE,
                    Uuid::from_u128(2),
                    CharacteristicProperties::write_without_response(),
                ),
            ],
        };

        // Write-without-response wins over write, which wins over known UUIDs
        assert_eq!(
            select_characteristic(&service, &profile).unwrap().uuid,
            Uuid::from_u128(2)
        );

        let mut no_wwr = service.clone();
        no_wwr.characteristics.pop();
        assert_eq!(
            select_characteristic(&no_wwr, &profile).unwrap().uuid,
            Uuid::from_u128(1)
        );

        let mut known_only = no_wwr.clone();
        known_only.characteristics.pop();
        assert_eq!(
            select_characteristic(&known_only, &profile).unwrap().uuid,
            STANDARD_WRITE_CHARACTERISTIC
        );
    }

    #[tokio::test]
    async fn test_link_drop_invalidates_handle() {
        let printer = standard_printer();
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer.clone()),
            PrinterProfile::default(),
        );
        connector.connect().await.unwrap();
        let mut rx = connector.subscribe();

        printer.drop_link();

        assert!(!connector.is_connected().await);
        assert!(connector.handle().is_none());
        assert_eq!(drain(&mut rx), vec![ConnectionStatus::Disconnected]);
    }

    #[tokio::test]
    async fn test_link_drop_during_resolution_is_seen() {
        let printer = standard_printer().dropping_link_after_lookup();
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer.clone()),
            PrinterProfile::default(),
        );
        connector.connect().await.unwrap();

        assert!(!connector.is_connected().await);
        assert!(connector.handle().is_none());
        assert_eq!(connector.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_name_filter_skips_other_devices() {
        let earbuds = MemoryPrinter::new("Galaxy Buds2");
        let printer = MemoryPrinter::new("RPP02N").with_characteristic(
            ISSC_SERVICE,
            ISSC_WRITE_CHARACTERISTIC,
            CharacteristicProperties::write_without_response(),
        );
        let central = MemoryCentral::new()
            .with_printer(earbuds)
            .with_printer(printer);

        // Without a name the unfiltered scan settles for the first device
        let mut unnamed = DeviceConnector::new(central.clone(), PrinterProfile::default());
        let err = unnamed.connect().await.unwrap_err();
        assert!(matches!(err, PrinterError::ServiceNotFound));

        let mut named = DeviceConnector::new(
            central.clone(),
            PrinterProfile::default().with_name_filter("RPP"),
        );
        named.connect().await.unwrap();
        assert_eq!(named.handle().unwrap().device().name(), "RPP02N");
        assert_eq!(
            central.requests().last().unwrap().name_filter.as_deref(),
            Some("RPP")
        );
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let printer = standard_printer();
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer.clone()),
            PrinterProfile::default(),
        );
        connector.connect().await.unwrap();
        let mut rx = connector.subscribe();

        connector.disconnect().await;
        connector.disconnect().await;

        assert!(!printer.is_link_up());
        assert_eq!(connector.status(), ConnectionStatus::Disconnected);
        assert_eq!(drain(&mut rx), vec![ConnectionStatus::Disconnected]);
    }

    #[tokio::test]
    async fn test_reconnect_after_failure() {
        let printer = standard_printer();
        let central = MemoryCentral::new().with_printer(printer);
        let mut connector = DeviceConnector::new(central, PrinterProfile::default());

        connector.connect().await.unwrap();
        connector.connect().await.unwrap();
        assert!(connector.is_connected().await);
    }
}
