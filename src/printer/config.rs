//! # Printer Configuration
//!
//! Hardware specifications for the supported printer class and the BLE
//! identifiers used to find it.
//!
//! ## Supported Printers
//!
//! | Class | Width (dots) | Columns | Chunk | Pacing |
//! |-------|--------------|---------|-------|--------|
//! | 58mm BLE (RPP02 and clones) | 384 | 32 | 20 bytes | 50 ms |
//!
//! ## Usage
//!
//! ```
//! use struk::printer::PrinterConfig;
//!
//! let config = PrinterConfig::MM58;
//! assert_eq!(config.width_bytes(), 48);
//! ```

use std::time::Duration;

use uuid::Uuid;

/// # Printer Configuration
///
/// ## Physical Properties
///
/// - **width_dots**: Maximum printable width in dots; wider images are
///   downscaled to it
/// - **columns**: Characters per line in the normal font
/// - **threshold**: Luminance below which a pixel is printed (0-255)
///
/// ## Link Tuning
///
/// - **chunk_size**: Bytes per characteristic write. 20 fits under the
///   smallest ATT MTU (23) so every device accepts it.
/// - **chunk_delay**: Open-loop pause between writes so the printer's receive
///   buffer is never overrun. These printers give no flow-control signal.
///
/// The link values are not tuned per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Printer class name
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u16,

    /// Characters per line, normal font
    pub columns: usize,

    /// Luminance threshold for binarization
    pub threshold: u8,

    /// Bytes per BLE write
    pub chunk_size: usize,

    /// Pause between BLE writes
    pub chunk_delay: Duration,

    /// Blank lines fed after a receipt to clear the tear bar
    pub trailing_feed: u8,

    /// Send a partial cut after the trailing feed
    pub cut: bool,
}

impl PrinterConfig {
    /// # 58mm BLE Thermal Printer
    ///
    /// ```text
    /// ├─ 5mm ─┼──── 48mm printable ────┼─ 5mm ─┤
    /// │       │       384 dots         │       │
    /// ```
    pub const MM58: Self = Self {
        name: "58mm BLE thermal",
        width_dots: 384,
        columns: 32,
        threshold: 127,
        chunk_size: 20,
        chunk_delay: Duration::from_millis(50),
        trailing_feed: 3,
        cut: false,
    };

    /// Print width in bytes (8 dots per byte, rounded up)
    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.width_dots.div_ceil(8)
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::MM58
    }
}

// ============================================================================
// BLE PROFILE
// ============================================================================

/// Generic printer service (0x18F0), advertised by most cheap BLE printers.
pub const STANDARD_SERVICE: Uuid = Uuid::from_u128(0x000018f0_0000_1000_8000_00805f9b34fb);

/// ISSC transparent UART service (RPP02, BlueBamboo and friends).
pub const ISSC_SERVICE: Uuid = Uuid::from_u128(0x49535343_fe7d_4ae5_8fa9_9fafd205e455);

/// Vendor service seen on some Chinese printer modules.
pub const VENDOR_SERVICE: Uuid = Uuid::from_u128(0xe7810a71_73ae_499d_8c15_faa9aef0c3f2);

/// Write characteristic of the 0x18F0 service.
pub const STANDARD_WRITE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x00002af1_0000_1000_8000_00805f9b34fb);

/// Write characteristic of the ISSC service.
pub const ISSC_WRITE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x49535343_8841_43f4_a8d4_ecbe34729bb3);

/// Write characteristic of the vendor service.
pub const VENDOR_WRITE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xbef8d6c9_9c21_4c9e_b632_bd58c1009f9f);

/// # BLE Printer Profile
///
/// The UUID whitelist used for discovery and GATT resolution. The filtered
/// chooser and the post-connection service lookup must agree: a service not
/// listed in `optional_services` cannot be resolved afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterProfile {
    /// Service used as the discovery filter
    pub standard_service: Uuid,

    /// Services the filtered chooser grants access to
    pub optional_services: Vec<Uuid>,

    /// Services the unfiltered fallback chooser grants access to
    pub fallback_services: Vec<Uuid>,

    /// Primary services tried, in order, after the GATT connection opens
    pub service_order: Vec<Uuid>,

    /// Characteristics accepted by UUID when none advertises a write property
    pub candidate_characteristics: Vec<Uuid>,

    /// Restrict the unfiltered chooser to devices whose name contains this
    pub name_filter: Option<String>,

    /// How long the chooser scans before giving up
    pub scan_window: Duration,
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self {
            standard_service: STANDARD_SERVICE,
            optional_services: vec![STANDARD_SERVICE, VENDOR_SERVICE, ISSC_SERVICE],
            fallback_services: vec![STANDARD_SERVICE, ISSC_SERVICE],
            service_order: vec![STANDARD_SERVICE, ISSC_SERVICE],
            candidate_characteristics: vec![
                STANDARD_WRITE_CHARACTERISTIC,
                ISSC_WRITE_CHARACTERISTIC,
                VENDOR_WRITE_CHARACTERISTIC,
            ],
            name_filter: None,
            scan_window: Duration::from_secs(10),
        }
    }
}

impl PrinterProfile {
    /// Restrict the fallback chooser to devices whose name contains `name`.
    pub fn with_name_filter(mut self, name: impl Into<String>) -> Self {
        self.name_filter = Some(name.into());
        self
    }

    /// Set the chooser scan window.
    pub fn with_scan_window(mut self, window: Duration) -> Self {
        self.scan_window = window;
        self
    }
}
