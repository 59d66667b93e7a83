//! # Configuration
//!
//! Every setting is explicit and defaulted; nothing is read from global
//! state. A configuration file is JSON, and any section or field it leaves
//! out keeps its default:
//!
//! ```json
//! {
//!   "printer": { "dpi": 300 },
//!   "pdf": { "command": "/usr/local/bin/wkhtmltopdf", "margin_mm": 1 },
//!   "spooler": { "command": "lp", "extra_args": ["-o", "fit-to-page"] },
//!   "defaults": { "label_width_mm": 62, "label_height_mm": 29, "copies": 1 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EtiquetaError;
use crate::printer::PrinterConfig;
use crate::symbology::Symbology;
use crate::template::BarcodeSize;
use crate::transport::{PdfConfig, SpoolerConfig};

/// Values used when a template or request does not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub label_width_mm: f32,
    pub label_height_mm: f32,
    pub symbology: Symbology,
    pub barcode_size: BarcodeSize,
    pub copies: u32,
    /// Worker threads for batch rendering; 0 lets the pool decide.
    pub batch_workers: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            label_width_mm: 50.0,
            label_height_mm: 30.0,
            symbology: Symbology::Code128,
            barcode_size: BarcodeSize::default(),
            copies: 1,
            batch_workers: 4,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtiquetaConfig {
    pub printer: PrinterConfig,
    pub pdf: PdfConfig,
    pub spooler: SpoolerConfig,
    pub defaults: Defaults,
}

impl EtiquetaConfig {
    pub fn from_json(text: &str) -> Result<Self, EtiquetaError> {
        serde_json::from_str(text)
            .map_err(|e| EtiquetaError::Validation(format!("invalid configuration: {}", e)))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EtiquetaError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(EtiquetaConfig::from_json("{}").unwrap(), EtiquetaConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = EtiquetaConfig::from_json(
            r#"{"printer":{"dpi":300},"defaults":{"symbology":"QR Code","copies":2}}"#,
        )
        .unwrap();
        assert_eq!(config.printer.dpi, 300);
        assert_eq!(config.printer.port, 9100);
        assert_eq!(config.defaults.symbology, Symbology::Qr);
        assert_eq!(config.defaults.copies, 2);
        assert_eq!(config.defaults.label_width_mm, 50.0);
        assert_eq!(config.pdf.command, "wkhtmltopdf");
        assert_eq!(config.spooler.command, "lp");
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(EtiquetaConfig::from_json(r#"{"printer":{"dpi":"high"}}"#).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etiqueta.json");
        fs::write(&path, r#"{"spooler":{"extra_args":["-o","fit-to-page"]}}"#).unwrap();
        let config = EtiquetaConfig::load(&path).unwrap();
        assert_eq!(config.spooler.extra_args, vec!["-o", "fit-to-page"]);
    }
}
