//! OS print spooler submission.
//!
//! Laser printing hands a finished document to the system spooler (`lp` by
//! default) and trusts it from there.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::EtiquetaError;

/// Accepts a document file for printing.
pub trait Spooler: Send + Sync {
    /// Submit `document` to `printer` (the system default when `None`).
    /// Returns the spooler's confirmation message.
    fn submit(&self, document: &Path, printer: Option<&str>) -> Result<String, EtiquetaError>;
}

/// Spooler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolerConfig {
    /// Spooler executable
    pub command: String,
    /// Extra arguments placed before the document path
    pub extra_args: Vec<String>,
}

impl Default for SpoolerConfig {
    fn default() -> Self {
        Self {
            command: "lp".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// [`Spooler`] backed by an `lp`-compatible command.
#[derive(Debug, Clone, Default)]
pub struct CommandSpooler {
    config: SpoolerConfig,
}

impl CommandSpooler {
    pub fn new(config: SpoolerConfig) -> Self {
        Self { config }
    }
}

impl Spooler for CommandSpooler {
    #[instrument(skip(self), fields(command = %self.config.command))]
    fn submit(&self, document: &Path, printer: Option<&str>) -> Result<String, EtiquetaError> {
        let mut command = Command::new(&self.config.command);
        if let Some(printer) = printer.filter(|p| !p.trim().is_empty()) {
            command.arg("-d").arg(printer);
        }
        let output = command
            .args(&self.config.extra_args)
            .arg(document)
            .output()
            .map_err(|e| {
                EtiquetaError::RenderTarget(format!("Failed to run '{}': {}", self.config.command, e))
            })?;

        if !output.status.success() {
            return Err(EtiquetaError::RenderTarget(format!(
                "Print command failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let message = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(%message, "document spooled");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_spooler_fails() {
        let spooler = CommandSpooler::new(SpoolerConfig {
            command: "etiqueta-no-such-spooler".into(),
            ..SpoolerConfig::default()
        });
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = spooler.submit(file.path(), Some("laser1")).unwrap_err();
        assert!(matches!(err, EtiquetaError::RenderTarget(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_fails() {
        let spooler = CommandSpooler::new(SpoolerConfig {
            command: "false".into(),
            ..SpoolerConfig::default()
        });
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(spooler.submit(file.path(), None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_submit_returns_stdout() {
        let spooler = CommandSpooler::new(SpoolerConfig {
            command: "echo".into(),
            extra_args: vec!["queued".into()],
        });
        let file = tempfile::NamedTempFile::new().unwrap();
        let message = spooler.submit(file.path(), Some("laser1")).unwrap();
        assert!(message.starts_with("-d laser1 queued"));
    }
}
