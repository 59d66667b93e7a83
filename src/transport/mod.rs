//! # Output Transports
//!
//! Where rendered output goes once it leaves the renderers.
//!
//! | Transport | Carries | Failure |
//! |-----------|---------|---------|
//! | [`NetworkPrinter`] | command bytes over raw TCP | connect timeout, refused, write error |
//! | [`PdfEngine`] | HTML to PDF bytes | engine missing or non-zero exit |
//! | [`Spooler`] | document file to the OS print queue | spooler missing or non-zero exit |
//!
//! All transports are synchronous and report failures as
//! [`EtiquetaError::RenderTarget`](crate::error::EtiquetaError::RenderTarget).
//! The PDF engine and spooler are traits so callers can substitute their own.

pub mod network;
pub mod pdf;
pub mod spooler;

pub use network::NetworkPrinter;
pub use pdf::{CommandPdfEngine, PdfConfig, PdfEngine};
pub use spooler::{CommandSpooler, Spooler, SpoolerConfig};
