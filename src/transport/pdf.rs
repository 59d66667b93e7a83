//! HTML to PDF conversion through an external engine.
//!
//! The engine is a command-line converter (`wkhtmltopdf` by default) run in
//! a scratch directory: the document is written to `label.html`, the engine
//! writes `label.pdf`, and the bytes are read back before the directory is
//! removed.

use std::fs;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::debug;

use crate::error::EtiquetaError;

/// Turns an HTML document into PDF bytes.
pub trait PdfEngine: Send + Sync {
    fn html_to_pdf(&self, html: &str, width_mm: f32, height_mm: f32) -> Result<Vec<u8>, EtiquetaError>;
}

/// PDF engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Converter executable
    pub command: String,
    /// Page margin on every side
    pub margin_mm: f32,
    /// Extra arguments placed before the input file
    pub extra_args: Vec<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf".to_string(),
            margin_mm: 0.0,
            extra_args: Vec::new(),
        }
    }
}

/// [`PdfEngine`] backed by a wkhtmltopdf-compatible command.
#[derive(Debug, Clone, Default)]
pub struct CommandPdfEngine {
    config: PdfConfig,
}

impl CommandPdfEngine {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    fn args(&self, width_mm: f32, height_mm: f32) -> Vec<String> {
        let margin = format!("{}mm", self.config.margin_mm);
        let mut args = vec![
            "--quiet".to_string(),
            "--page-width".to_string(),
            format!("{}mm", width_mm),
            "--page-height".to_string(),
            format!("{}mm", height_mm),
        ];
        for side in ["-T", "-B", "-L", "-R"] {
            args.push(side.to_string());
            args.push(margin.clone());
        }
        args.extend(self.config.extra_args.iter().cloned());
        args
    }
}

impl PdfEngine for CommandPdfEngine {
    fn html_to_pdf(&self, html: &str, width_mm: f32, height_mm: f32) -> Result<Vec<u8>, EtiquetaError> {
        let dir = TempDir::with_prefix("etiqueta-pdf-")?;
        let input = dir.path().join("label.html");
        let output = dir.path().join("label.pdf");
        fs::write(&input, html)?;

        debug!(command = %self.config.command, "running PDF engine");
        let result = Command::new(&self.config.command)
            .args(self.args(width_mm, height_mm))
            .arg(&input)
            .arg(&output)
            .output()
            .map_err(|e| {
                EtiquetaError::RenderTarget(format!("Failed to run '{}': {}", self.config.command, e))
            })?;

        if !result.status.success() {
            return Err(EtiquetaError::RenderTarget(format!(
                "'{}' exited with {}: {}",
                self.config.command,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let pdf = fs::read(&output).map_err(|e| {
            EtiquetaError::RenderTarget(format!("PDF engine produced no output: {}", e))
        })?;
        Ok(pdf)
    }
}
