//! # Printer Module
//!
//! Printer hardware configuration and unit conversion.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware specifications
//! - [`units`]: px ↔ mm ↔ dots conversion

pub mod config;
pub mod units;

pub use config::{PrinterConfig, RAW_PORT};
