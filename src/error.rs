//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! Only failures that stop a caller are errors. A missing record field is a
//! binding gap recorded on the bound label, and a barcode that could not be
//! encoded is an [`EncodingResult::Degraded`](crate::symbology::EncodingResult)
//! value; neither ever shows up here.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Bad template or element configuration, rejected before rendering
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed template import package
    #[error("Package format error: {0}")]
    PackageFormat(String),

    /// PDF engine, printer socket or spooler failure
    #[error("Render target failure: {0}")]
    RenderTarget(String),

    /// Raster encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Template store (external collaborator) error
    #[error("Store error: {0}")]
    Store(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EtiquetaError {
    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::PackageFormat(_))
    }
}
