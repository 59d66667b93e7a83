//! # Printer Configuration
//!
//! Hardware characteristics of the label printer that thermal output is
//! rendered for.
//!
//! ## Usage
//!
//! ```
//! use etiqueta::printer::PrinterConfig;
//!
//! let config = PrinterConfig::default();
//! assert_eq!(config.dpi, 203);
//! assert_eq!(config.mm_to_dots(50.0), 400);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::units::{self, CSS_PX_PER_MM, DEFAULT_DPI};

/// Raw printing port used by networked label printers.
pub const RAW_PORT: u16 = 9100;

/// # Printer Configuration
///
/// ## Physical Properties
///
/// - **dpi**: print head resolution in dots per inch
/// - **px_per_mm**: pixel density templates are designed at
///
/// ## Network
///
/// - **port**: raw TCP port, 9100 by convention
/// - **connect_timeout_secs**: bound on opening the printer socket
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// For a 203 DPI head:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   50mm label  = 400 dots
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: String,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Raw TCP port
    pub port: u16,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Template pixels per millimeter
    pub px_per_mm: f64,
}

impl PrinterConfig {
    /// Generic 203 DPI network label printer.
    pub fn zebra_203() -> Self {
        Self {
            name: "ZPL 203dpi".to_string(),
            dpi: DEFAULT_DPI,
            port: RAW_PORT,
            connect_timeout_secs: 5,
            px_per_mm: CSS_PX_PER_MM,
        }
    }

    /// Generic 300 DPI network label printer.
    pub fn zebra_300() -> Self {
        Self {
            name: "ZPL 300dpi".to_string(),
            dpi: 300,
            ..Self::zebra_203()
        }
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f64 {
        units::dots_per_mm(self.dpi)
    }

    /// Convert millimeters to dots
    #[inline]
    pub fn mm_to_dots(&self, mm: f64) -> u32 {
        units::mm_to_dots(mm, self.dpi)
    }

    /// Convert template pixels to dots
    #[inline]
    pub fn px_to_dots(&self, px: f64) -> u32 {
        units::px_to_dots(px, self.dpi, self.px_per_mm)
    }

    /// Socket connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::zebra_203()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_203dpi_on_raw_port() {
        let config = PrinterConfig::default();
        assert_eq!(config.dpi, 203);
        assert_eq!(config.port, 9100);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!((config.dots_per_mm() - 8.0).abs() < 0.1);
    }

    #[test]
    fn test_300dpi_conversion() {
        let config = PrinterConfig::zebra_300();
        assert_eq!(config.mm_to_dots(25.4), 300);
        assert_eq!(config.px_to_dots(96.0), 300);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PrinterConfig = serde_json::from_str(r#"{"dpi": 300}"#).unwrap();
        assert_eq!(config.dpi, 300);
        assert_eq!(config.port, 9100);
    }
}
