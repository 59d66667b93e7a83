//! # Etiqueta - Label Template Rendering
//!
//! Etiqueta renders small fixed-size labels (barcodes, QR codes, text
//! fields, tables) for item, batch and serial inventory records from one
//! declarative template, and delivers them as HTML, PDF, ZPL thermal printer
//! commands, or through the OS print spooler.
//!
//! ## Quick Start
//!
//! ```
//! use etiqueta::{
//!     binder::{bind, DataRecord},
//!     markup,
//!     symbology::DirectEncoder,
//!     template::{Element, Template, TemplateType},
//! };
//!
//! // 50 x 30 mm label: item code as text and as a barcode
//! let template = Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
//!     .element(Element::field_text("item_code", 10.0, 10.0, 80.0, 20.0))
//!     .element(Element::barcode("item_code", 10.0, 40.0, 120.0, 40.0));
//!
//! let record = DataRecord::new().with("item_code", "SKU-001");
//! let doc = markup::render(&bind(&template, &record), 2, &DirectEncoder);
//!
//! assert_eq!(doc.label_count, 2);
//! assert!(doc.html.contains("SKU-001"));
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Template ──┐
//!            ├─> bind ──> markup::render ──> HTML ──> PDF engine / spooler
//! DataRecord ┘       └──> command::render ─> ZPL ───> raw TCP :9100
//!                              │
//!               symbology::encode (both renderers)
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Template model, validation, store, export/import |
//! | [`binder`] | Data records and field resolution |
//! | [`symbology`] | Barcode and QR rasters |
//! | [`markup`] | HTML/CSS renderer |
//! | [`command`] | Printer command renderer (ZPL) |
//! | [`dispatch`] | Job state machine, targets, batch rendering |
//! | [`transport`] | Raw TCP, PDF engine, OS spooler |
//! | [`printer`] | Printer profiles and unit conversion |
//! | [`service`] | Inbound operations over a template store |
//! | [`config`] | Configuration file |
//! | [`error`] | Error types |

pub mod binder;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod markup;
pub mod printer;
pub mod service;
pub mod symbology;
pub mod template;
pub mod transport;

// Re-exports for convenience
pub use binder::DataRecord;
pub use config::EtiquetaConfig;
pub use dispatch::{DispatchOutcome, Dispatcher, PrintTarget, RenderJob};
pub use error::EtiquetaError;
pub use printer::PrinterConfig;
pub use service::LabelService;
pub use template::{MemoryStore, Template, TemplateType};
