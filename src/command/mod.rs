//! # Command Renderer
//!
//! Turns a bound label into a printer command stream.
//!
//! The instruction set is pluggable through [`CommandLanguage`]; [`Zpl`] is
//! the built-in implementation. Geometry is converted from template pixels
//! to printer dots through the [`PrinterConfig`] units, and the copy count
//! becomes a single repeat instruction rather than repeated label bodies.
//!
//! ## Capability table
//!
//! Not every element kind has a printer primitive. [`support`] says what a
//! command stream does with each kind; [`CommandOutput`] lists the element
//! indices that were degraded or omitted for a given label.
//!
//! ```
//! use etiqueta::binder::{bind, DataRecord};
//! use etiqueta::command::{self, Zpl};
//! use etiqueta::printer::PrinterConfig;
//! use etiqueta::symbology::DirectEncoder;
//! use etiqueta::template::{Element, Template, TemplateType};
//!
//! let template = Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
//!     .element(Element::barcode("item_code", 10.0, 40.0, 120.0, 40.0));
//! let label = bind(&template, &DataRecord::new().with("item_code", "SKU-001"));
//!
//! let out = command::render(&Zpl, &label, 2, &PrinterConfig::default(), &DirectEncoder);
//! let zpl = String::from_utf8(out.bytes)?;
//! assert!(zpl.starts_with("^XA"));
//! assert!(zpl.contains("^PQ2"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod zpl;

pub use zpl::Zpl;

use crate::binder::BoundLabel;
use crate::printer::PrinterConfig;
use crate::symbology::BarcodeEncoder;
use crate::template::ElementKind;

/// How a command stream renders an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Printer primitive.
    Native,
    /// Approximated, e.g. a table printed as text lines.
    Degraded,
    /// Not printed.
    Omitted,
}

/// Capability of the built-in command languages for each element kind.
pub fn support(kind: &ElementKind) -> Support {
    match kind {
        ElementKind::StaticText { .. }
        | ElementKind::FieldText { .. }
        | ElementKind::Barcode { .. }
        | ElementKind::Qr { .. }
        | ElementKind::Line { .. }
        | ElementKind::Box { .. } => Support::Native,
        ElementKind::Table(_) => Support::Degraded,
        ElementKind::Image { .. } => Support::Omitted,
    }
}

/// A rendered command stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub bytes: Vec<u8>,
    /// Elements rendered through a fallback.
    pub degraded: Vec<usize>,
    /// Elements left out of the stream.
    pub omitted: Vec<usize>,
}

/// A printer command language.
pub trait CommandLanguage: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Render one label; `copies` becomes the stream's repeat count.
    fn render(
        &self,
        label: &BoundLabel<'_>,
        copies: u32,
        printer: &PrinterConfig,
        encoder: &dyn BarcodeEncoder,
    ) -> CommandOutput;
}

/// Render `label` with `language`.
pub fn render(
    language: &dyn CommandLanguage,
    label: &BoundLabel<'_>,
    copies: u32,
    printer: &PrinterConfig,
    encoder: &dyn BarcodeEncoder,
) -> CommandOutput {
    language.render(label, copies, printer, encoder)
}
