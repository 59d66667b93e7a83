//! # Template Model
//!
//! A [`Template`] is the single source of truth for every renderer: a label
//! size in millimeters plus an ordered list of positioned [`Element`]s in
//! template pixels.
//!
//! Templates are built through one of two paths, both converging on the same
//! element representation:
//!
//! - [`TemplateSpec::Visual`]: an explicit element list (advanced templates)
//! - [`TemplateSpec::Legacy`]: checkbox-style field selection, see [`legacy`]
//!
//! ```
//! use etiqueta::template::{build_template, TemplateSpec};
//!
//! let spec: TemplateSpec = serde_json::from_str(r#"{
//!     "mode": "visual",
//!     "name": "Shelf",
//!     "type": "item",
//!     "label_width_mm": 50,
//!     "label_height_mm": 30,
//!     "elements": [
//!         {"kind": "field_text", "field": "item_code", "x": 10, "y": 10, "width": 80, "height": 20},
//!         {"kind": "barcode", "field": "item_code", "x": 10, "y": 40, "width": 120, "height": 40}
//!     ]
//! }"#)?;
//!
//! let template = build_template(spec)?;
//! assert_eq!(template.elements.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod legacy;
pub mod library;
pub mod package;
pub mod store;

pub use legacy::LegacyConfig;
pub use library::{Category, Preset, PresetSummary};
pub use package::{PackagedTemplate, TemplatePackage, export_templates, import_templates};
pub use store::{MemoryStore, TemplateStore, resolve_template, save_template};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EtiquetaError;
use crate::printer::units::{CSS_PX_PER_MM, mm_to_px};
use crate::symbology::Symbology;

/// Upper bound on `rows × cols` for a table element.
pub const MAX_TABLE_CELLS: u64 = 100;

/// Upper bound on either label side.
pub const MAX_LABEL_MM: f32 = 1000.0;

/// Slack for elements laid out from rounded millimeter conversions.
const EDGE_TOLERANCE_PX: f32 = 0.5;

// ============================================================================
// TEMPLATE
// ============================================================================

/// Record type a template is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Item,
    Batch,
    Serial,
    #[default]
    General,
}

impl TemplateType {
    /// Map a source document type ("Item", "Batch", "Serial No", ...) to a
    /// template type. Anything unrecognised is `General`.
    pub fn from_reference_doctype(doctype: &str) -> Self {
        match doctype {
            "Item" => Self::Item,
            "Batch" => Self::Batch,
            "Serial No" => Self::Serial,
            _ => Self::General,
        }
    }

    /// Record field that identifies a record of this type; also the default
    /// barcode value.
    pub fn primary_field(self) -> &'static str {
        match self {
            Self::Item | Self::General => "item_code",
            Self::Batch => "batch_no",
            Self::Serial => "serial_no",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Batch => "batch",
            Self::Serial => "serial",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default raster size for barcodes, in template pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarcodeSize {
    pub width: u32,
    pub height: u32,
}

impl Default for BarcodeSize {
    fn default() -> Self {
        Self {
            width: 200,
            height: 100,
        }
    }
}

/// Reusable label layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: TemplateType,
    pub label_width_mm: f32,
    pub label_height_mm: f32,
    /// At most one default template per type.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub default_barcode_symbology: Symbology,
    #[serde(default)]
    pub default_barcode_size: BarcodeSize,
}

impl Template {
    /// Empty template of the given size.
    pub fn new(name: impl Into<String>, kind: TemplateType, width_mm: f32, height_mm: f32) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            kind,
            label_width_mm: width_mm,
            label_height_mm: height_mm,
            is_default: false,
            elements: Vec::new(),
            default_barcode_symbology: Symbology::default(),
            default_barcode_size: BarcodeSize::default(),
        }
    }

    /// Builder-style element append.
    pub fn element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Label size in template pixels.
    pub fn size_px(&self) -> (f32, f32) {
        (
            mm_to_px(self.label_width_mm as f64, CSS_PX_PER_MM) as f32,
            mm_to_px(self.label_height_mm as f64, CSS_PX_PER_MM) as f32,
        )
    }

    /// Element indices in paint order: ascending `z_order`, ties keep
    /// declaration order.
    pub fn paint_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.elements.len()).collect();
        order.sort_by_key(|&i| self.elements[i].z_order);
        order
    }

    /// Check every structural invariant. Templates that fail are never
    /// rendered.
    pub fn validate(&self) -> Result<(), EtiquetaError> {
        if !(self.label_width_mm.is_finite() && self.label_width_mm > 0.0)
            || !(self.label_height_mm.is_finite() && self.label_height_mm > 0.0)
        {
            return Err(EtiquetaError::Validation(format!(
                "label size must be positive, got {}x{}mm",
                self.label_width_mm, self.label_height_mm
            )));
        }
        if self.label_width_mm > MAX_LABEL_MM || self.label_height_mm > MAX_LABEL_MM {
            return Err(EtiquetaError::Validation(format!(
                "label size {}x{}mm exceeds {}mm",
                self.label_width_mm, self.label_height_mm, MAX_LABEL_MM
            )));
        }

        let (label_w, label_h) = self.size_px();
        for (i, element) in self.elements.iter().enumerate() {
            element
                .validate()
                .and_then(|()| element.check_fits(label_w, label_h))
                .map_err(|e| EtiquetaError::Validation(format!("elements[{}]: {}", i, e)))?;
        }

        Ok(())
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// Text weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

fn default_font_size() -> f32 {
    12.0
}

fn default_color() -> String {
    "#000000".to_string()
}

/// Visual style of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Font size in template pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    /// `#rgb`, `#rrggbb` or a named color.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            font_weight: FontWeight::Normal,
            color: default_color(),
            text_align: TextAlign::Left,
        }
    }
}

/// True for `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` and plain alphabetic
/// color names.
pub fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => !color.is_empty() && color.len() <= 32 && color.chars().all(|c| c.is_ascii_alphabetic()),
    }
}

/// Where a piece of content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Fixed text.
    Literal(String),
    /// A record field, resolved at bind time.
    Field(String),
}

/// Table sub-configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub rows: u32,
    pub cols: u32,
    /// Row-major cell bindings. Missing cells show `Cell r,c`.
    #[serde(default)]
    pub cells: Vec<Vec<Binding>>,
}

impl TableConfig {
    pub fn cell_count(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }
}

fn default_thickness() -> u32 {
    2
}

/// Element content. Every renderer matches this exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    /// Literal text; ignores the record.
    StaticText { content: String },
    /// A record field, optionally captioned (`"Batch: "`).
    FieldText {
        field: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        prefix: String,
    },
    /// 1D barcode. `value` overrides `field`; with neither, the template
    /// type's primary field is used.
    Barcode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        /// Falls back to the template default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbology: Option<Symbology>,
    },
    /// QR code, bound like `Barcode`.
    Qr {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Table(TableConfig),
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        alt: String,
    },
    /// Horizontal rule across the element width.
    Line {
        #[serde(default = "default_thickness")]
        thickness: u32,
    },
    /// Rectangle outline.
    Box {
        #[serde(default = "default_thickness")]
        thickness: u32,
    },
}

impl ElementKind {
    /// Snake-case kind name as used in JSON.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StaticText { .. } => "static_text",
            Self::FieldText { .. } => "field_text",
            Self::Barcode { .. } => "barcode",
            Self::Qr { .. } => "qr",
            Self::Table(_) => "table",
            Self::Image { .. } => "image",
            Self::Line { .. } => "line",
            Self::Box { .. } => "box",
        }
    }
}

/// Positioned content unit. Geometry is in template pixels relative to the
/// label's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub z_order: i32,
    #[serde(default)]
    pub style: Style,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    pub fn new(kind: ElementKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            z_order: 0,
            style: Style::default(),
            kind,
        }
    }

    pub fn static_text(content: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            ElementKind::StaticText {
                content: content.into(),
            },
            x,
            y,
            width,
            height,
        )
    }

    pub fn field_text(field: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            ElementKind::FieldText {
                field: field.into(),
                prefix: String::new(),
            },
            x,
            y,
            width,
            height,
        )
    }

    pub fn barcode(field: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            ElementKind::Barcode {
                field: Some(field.into()),
                value: None,
                symbology: None,
            },
            x,
            y,
            width,
            height,
        )
    }

    pub fn qr(field: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            ElementKind::Qr {
                field: Some(field.into()),
                value: None,
            },
            x,
            y,
            width,
            height,
        )
    }

    pub fn table(rows: u32, cols: u32, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            ElementKind::Table(TableConfig {
                rows,
                cols,
                cells: Vec::new(),
            }),
            x,
            y,
            width,
            height,
        )
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, v));
            }
        }

        if !(self.style.font_size.is_finite() && self.style.font_size > 0.0) {
            return Err(format!("font_size must be positive, got {}", self.style.font_size));
        }
        if !is_valid_color(&self.style.color) {
            return Err(format!("invalid color {:?}", self.style.color));
        }

        match &self.kind {
            ElementKind::FieldText { field, .. } if field.trim().is_empty() => {
                Err("field_text requires a field name".to_string())
            }
            ElementKind::Table(table) => {
                if table.rows < 1 || table.cols < 1 {
                    return Err(format!(
                        "table requires rows >= 1 and cols >= 1, got {}x{}",
                        table.rows, table.cols
                    ));
                }
                if table.cell_count() > MAX_TABLE_CELLS {
                    return Err(format!(
                        "table of {}x{} exceeds {} cells",
                        table.rows, table.cols, MAX_TABLE_CELLS
                    ));
                }
                Ok(())
            }
            ElementKind::StaticText { .. }
            | ElementKind::FieldText { .. }
            | ElementKind::Barcode { .. }
            | ElementKind::Qr { .. }
            | ElementKind::Image { .. }
            | ElementKind::Line { .. }
            | ElementKind::Box { .. } => Ok(()),
        }
    }

    fn check_fits(&self, label_w: f32, label_h: f32) -> Result<(), String> {
        if self.x + self.width > label_w + EDGE_TOLERANCE_PX
            || self.y + self.height > label_h + EDGE_TOLERANCE_PX
        {
            return Err(format!(
                "{}x{} at ({}, {}) extends past the {:.0}x{:.0}px label",
                self.width, self.height, self.x, self.y, label_w, label_h
            ));
        }
        Ok(())
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

/// Visual template input: explicit elements.
#[derive(Debug, Clone, Deserialize)]
pub struct VisualSpec {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: TemplateType,
    pub label_width_mm: f32,
    pub label_height_mm: f32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub default_barcode_symbology: Symbology,
    #[serde(default)]
    pub default_barcode_size: BarcodeSize,
}

/// Template construction input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TemplateSpec {
    Visual(VisualSpec),
    Legacy(LegacyConfig),
}

/// Build and validate a template from either construction path.
///
/// A missing id is filled with a fresh UUID.
pub fn build_template(spec: TemplateSpec) -> Result<Template, EtiquetaError> {
    let mut template = match spec {
        TemplateSpec::Visual(v) => Template {
            id: v.id,
            name: v.name,
            kind: v.kind,
            label_width_mm: v.label_width_mm,
            label_height_mm: v.label_height_mm,
            is_default: v.is_default,
            elements: v.elements,
            default_barcode_symbology: v.default_barcode_symbology,
            default_barcode_size: v.default_barcode_size,
        },
        TemplateSpec::Legacy(config) => config.into_template(),
    };

    if template.id.trim().is_empty() {
        template.id = uuid::Uuid::new_v4().to_string();
    }
    template.validate()?;
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> Template {
        Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
            .element(Element::field_text("item_code", 10.0, 10.0, 80.0, 20.0))
            .element(Element::barcode("item_code", 10.0, 40.0, 120.0, 40.0))
    }

    #[test]
    fn test_valid_template() {
        assert!(label().validate().is_ok());
    }

    #[test]
    fn test_negative_geometry_rejected() {
        let t = label().element(Element::static_text("x", -1.0, 0.0, 10.0, 10.0));
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("elements[2]"));
    }

    #[test]
    fn test_table_bounds() {
        let ok = label().element(Element::table(3, 2, 0.0, 0.0, 100.0, 60.0));
        assert!(ok.validate().is_ok());

        let huge = label().element(Element::table(1000, 1000, 0.0, 0.0, 100.0, 60.0));
        assert!(matches!(huge.validate(), Err(EtiquetaError::Validation(_))));

        let empty = label().element(Element::table(0, 2, 0.0, 0.0, 100.0, 60.0));
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_table_at_limit() {
        let t = label().element(Element::table(10, 10, 0.0, 0.0, 100.0, 60.0));
        assert!(t.validate().is_ok());
        let t = label().element(Element::table(101, 1, 0.0, 0.0, 100.0, 60.0));
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_color_validation() {
        assert!(is_valid_color("#000"));
        assert!(is_valid_color("#1a2b3c"));
        assert!(is_valid_color("red"));
        assert!(!is_valid_color("red;background:url(x)"));
        assert!(!is_valid_color("#12345"));

        let mut t = label();
        t.elements[0].style.color = "}body{".to_string();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_element_past_label_edge_rejected() {
        let t = Template::new("Big", TemplateType::Item, 50.0, 30.0)
            .element(Element::barcode("item_code", 0.0, 0.0, 60000.0, 60000.0));
        let err = t.validate().unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("extends past"));

        // 50mm is just under 189px
        let edge = Template::new("Edge", TemplateType::Item, 50.0, 30.0)
            .element(Element::static_text("x", 0.0, 0.0, 189.0, 10.0));
        assert!(edge.validate().is_ok());
        let over = Template::new("Over", TemplateType::Item, 50.0, 30.0)
            .element(Element::static_text("x", 10.0, 0.0, 189.0, 10.0));
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_oversized_label_rejected() {
        let t = Template::new("Banner", TemplateType::General, 5000.0, 30.0);
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_zero_size_label_rejected() {
        let t = Template::new("Empty", TemplateType::Item, 0.0, 30.0);
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_paint_order_is_stable() {
        let t = Template::new("Z", TemplateType::General, 50.0, 30.0)
            .element(Element::static_text("a", 0.0, 0.0, 1.0, 1.0).with_z_order(2))
            .element(Element::static_text("b", 0.0, 0.0, 1.0, 1.0))
            .element(Element::static_text("c", 0.0, 0.0, 1.0, 1.0));
        assert_eq!(t.paint_order(), vec![1, 2, 0]);
    }

    #[test]
    fn test_element_json_shape() {
        let json = r#"{"kind":"table","rows":3,"cols":2,"x":0,"y":0,"width":100,"height":60}"#;
        let element: Element = serde_json::from_str(json).unwrap();
        assert!(matches!(element.kind, ElementKind::Table(TableConfig { rows: 3, cols: 2, .. })));
        assert_eq!(element.style, Style::default());

        let json = serde_json::to_value(&Element::field_text("batch_no", 1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json["kind"], "field_text");
        assert_eq!(json["field"], "batch_no");
    }

    #[test]
    fn test_build_template_assigns_id() {
        let spec = TemplateSpec::Visual(VisualSpec {
            id: String::new(),
            name: "Shelf".into(),
            kind: TemplateType::Item,
            label_width_mm: 50.0,
            label_height_mm: 30.0,
            is_default: false,
            elements: label().elements,
            default_barcode_symbology: Symbology::Code128,
            default_barcode_size: BarcodeSize::default(),
        });
        let template = build_template(spec).unwrap();
        assert!(!template.id.is_empty());
    }

    #[test]
    fn test_reference_doctype_mapping() {
        assert_eq!(TemplateType::from_reference_doctype("Serial No"), TemplateType::Serial);
        assert_eq!(TemplateType::from_reference_doctype("Delivery Note"), TemplateType::General);
        assert_eq!(TemplateType::Batch.primary_field(), "batch_no");
    }
}
