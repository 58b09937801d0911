//! # Printer Module
//!
//! Printer hardware specifications and BLE device profiles.
//!
//! - [`config`]: Print width, layout columns, link pacing, service UUIDs

pub mod config;

pub use config::{PrinterConfig, PrinterProfile};
