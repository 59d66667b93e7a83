//! # Data Binder
//!
//! Resolves each element of a template against a [`DataRecord`].
//!
//! Binding never fails. A field the record does not carry resolves to an
//! empty string and its name is listed in [`BoundLabel::gaps`] so callers can
//! report it; labels with partial data still render.
//!
//! ```
//! use etiqueta::binder::{bind, DataRecord};
//! use etiqueta::template::{Element, Template, TemplateType};
//!
//! let template = Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
//!     .element(Element::field_text("item_name", 0.0, 0.0, 80.0, 20.0));
//!
//! let bound = bind(&template, &DataRecord::new().with("item_code", "SKU-001"));
//! assert_eq!(bound.gaps, vec!["item_name".to_string()]);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::symbology::Symbology;
use crate::template::{Binding, Element, ElementKind, Template, TemplateType};

// ============================================================================
// RECORDS
// ============================================================================

/// A record field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    /// ISO `YYYY-MM-DD` in JSON.
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// Field name → value mapping bound into a template.
///
/// In JSON, `null` fields are dropped and booleans or nested values are kept
/// as text, so a record with partial data still binds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataRecord {
    fields: BTreeMap<String, FieldValue>,
}

/// Any JSON value a record field may carry.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Flag(bool),
    Value(FieldValue),
    Other(serde_json::Value),
}

impl From<RawField> for FieldValue {
    fn from(raw: RawField) -> Self {
        match raw {
            RawField::Flag(b) => Self::Text(b.to_string()),
            RawField::Value(v) => v,
            RawField::Other(v) => Self::Text(v.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for DataRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<RawField>>::deserialize(deserializer)?;
        let fields = raw
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, FieldValue::from(v))))
            .collect();
        Ok(Self { fields })
    }
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Field rendered as text, if present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|v| v.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Item master record.
    pub fn item(item_code: &str, item_name: &str, company: &str) -> Self {
        Self::new()
            .with("item_code", item_code)
            .with("item_name", item_name)
            .with("barcode_value", item_code)
            .with("company", company)
    }

    /// Batch record; the batch number is the barcode value.
    pub fn batch(
        batch_no: &str,
        item_code: &str,
        item_name: &str,
        mfg_date: Option<NaiveDate>,
        exp_date: Option<NaiveDate>,
        company: &str,
    ) -> Self {
        let mut record = Self::new()
            .with("item_code", item_code)
            .with("item_name", item_name)
            .with("batch_no", batch_no)
            .with("barcode_value", batch_no)
            .with("company", company);
        if let Some(d) = mfg_date {
            record.insert("mfg_date", d);
        }
        if let Some(d) = exp_date {
            record.insert("exp_date", d);
        }
        record
    }

    /// Serial number record; the serial number is the barcode value.
    pub fn serial(serial_no: &str, item_code: &str, item_name: &str, company: &str) -> Self {
        Self::new()
            .with("item_code", item_code)
            .with("item_name", item_name)
            .with("serial_no", serial_no)
            .with("barcode_value", serial_no)
            .with("company", company)
    }

    /// Canonical sample record used by previews and sample prints.
    pub fn sample() -> Self {
        Self::new()
            .with("item_code", "SAMPLE001")
            .with("item_name", "Sample Product Name")
            .with("batch_no", "BATCH001")
            .with("serial_no", "SN001")
            .with("mfg_date", "01/01/2024")
            .with("exp_date", "01/01/2025")
            .with("quantity", "10")
            .with("company", "Sample Company")
    }

    /// Sample record with caller overrides applied key by key. Empty override
    /// values are ignored.
    pub fn sample_with(overrides: &DataRecord) -> Self {
        let mut record = Self::sample();
        for (key, value) in overrides.iter() {
            if !value.is_empty() {
                record.insert(key.clone(), value.clone());
            }
        }
        record
    }

    /// Identifier of this record for a template type, used as the print log
    /// reference.
    pub fn reference(&self, kind: TemplateType) -> String {
        self.text(kind.primary_field()).unwrap_or_default()
    }
}

// ============================================================================
// BINDING
// ============================================================================

/// Content resolved for one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    /// Barcode or QR value; empty renders nothing.
    Code { value: String, symbology: Symbology },
    /// Row-major cell texts, `rows × cols`.
    Table(Vec<Vec<String>>),
    Image { src: String, alt: String },
    /// Line and box carry no content.
    Graphic,
}

/// An element with its resolved content.
#[derive(Debug, Clone)]
pub struct BoundElement<'a> {
    /// Position of the element in `template.elements`.
    pub index: usize,
    pub element: &'a Element,
    pub content: Content,
}

/// A template bound to one record, elements in paint order.
#[derive(Debug, Clone)]
pub struct BoundLabel<'a> {
    pub template: &'a Template,
    pub elements: Vec<BoundElement<'a>>,
    /// Referenced fields the record did not carry.
    pub gaps: Vec<String>,
}

struct Resolver<'r> {
    record: &'r DataRecord,
    gaps: Vec<String>,
}

impl Resolver<'_> {
    fn field(&mut self, name: &str) -> String {
        match self.record.text(name) {
            Some(value) => value,
            None => {
                if !self.gaps.iter().any(|g| g == name) {
                    self.gaps.push(name.to_string());
                }
                String::new()
            }
        }
    }

    fn binding(&mut self, binding: &Binding) -> String {
        match binding {
            Binding::Literal(text) => text.clone(),
            Binding::Field(name) => self.field(name),
        }
    }

    /// Literal value, else explicit field, else the template's primary field.
    fn code_value(&mut self, value: &Option<String>, field: &Option<String>, kind: TemplateType) -> String {
        if let Some(v) = value {
            return v.clone();
        }
        match field {
            Some(f) => self.field(f),
            None => self.field(kind.primary_field()),
        }
    }
}

/// Resolve every element of `template` against `record`.
pub fn bind<'a>(template: &'a Template, record: &DataRecord) -> BoundLabel<'a> {
    let mut resolver = Resolver {
        record,
        gaps: Vec::new(),
    };

    let elements = template
        .paint_order()
        .into_iter()
        .map(|index| {
            let element = &template.elements[index];
            let content = match &element.kind {
                ElementKind::StaticText { content } => Content::Text(content.clone()),
                ElementKind::FieldText { field, prefix } => {
                    let value = resolver.field(field);
                    Content::Text(format!("{}{}", prefix, value))
                }
                ElementKind::Barcode {
                    field,
                    value,
                    symbology,
                } => Content::Code {
                    value: resolver.code_value(value, field, template.kind),
                    symbology: symbology
                        .clone()
                        .unwrap_or_else(|| template.default_barcode_symbology.clone()),
                },
                ElementKind::Qr { field, value } => Content::Code {
                    value: resolver.code_value(value, field, template.kind),
                    symbology: Symbology::Qr,
                },
                ElementKind::Table(table) => Content::Table(
                    (0..table.rows as usize)
                        .map(|r| {
                            (0..table.cols as usize)
                                .map(|c| match table.cells.get(r).and_then(|row| row.get(c)) {
                                    Some(binding) => resolver.binding(binding),
                                    None => format!("Cell {},{}", r + 1, c + 1),
                                })
                                .collect()
                        })
                        .collect(),
                ),
                ElementKind::Image { src, alt } => Content::Image {
                    src: src.clone(),
                    alt: alt.clone(),
                },
                ElementKind::Line { .. } | ElementKind::Box { .. } => Content::Graphic,
            };
            BoundElement {
                index,
                element,
                content,
            }
        })
        .collect();

    if !resolver.gaps.is_empty() {
        debug!(template = %template.id, gaps = ?resolver.gaps, "binding gaps resolved to empty");
    }

    BoundLabel {
        template,
        elements,
        gaps: resolver.gaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Element, TableConfig};

    fn template() -> Template {
        Template::new("Shelf", TemplateType::Batch, 50.0, 30.0)
            .element(Element::static_text("Made in EU", 0.0, 0.0, 50.0, 10.0))
            .element(Element::field_text("item_code", 0.0, 10.0, 80.0, 20.0))
            .element(Element::new(
                ElementKind::Barcode {
                    field: None,
                    value: None,
                    symbology: None,
                },
                0.0,
                30.0,
                120.0,
                40.0,
            ))
    }

    #[test]
    fn test_missing_fields_resolve_empty() {
        let tpl = template();
        let bound = bind(&tpl, &DataRecord::new());
        assert_eq!(bound.elements[1].content, Content::Text(String::new()));
        assert_eq!(bound.gaps, vec!["item_code".to_string(), "batch_no".to_string()]);
    }

    #[test]
    fn test_static_text_ignores_record() {
        let record = DataRecord::new().with("content", "nope");
        let tpl = template();
        let bound = bind(&tpl, &record);
        assert_eq!(bound.elements[0].content, Content::Text("Made in EU".into()));
    }

    #[test]
    fn test_barcode_defaults_to_primary_field() {
        let record = DataRecord::batch("B-42", "ITEM-1", "Widget", None, None, "ACME");
        let tpl = template();
        let bound = bind(&tpl, &record);
        assert_eq!(
            bound.elements[2].content,
            Content::Code {
                value: "B-42".into(),
                symbology: Symbology::Code128
            }
        );
        assert!(bound.gaps.is_empty());
    }

    #[test]
    fn test_literal_value_overrides_field() {
        let t = Template::new("Q", TemplateType::Item, 50.0, 30.0).element(Element::new(
            ElementKind::Qr {
                field: Some("item_code".into()),
                value: Some("https://example.com/p/1".into()),
            },
            0.0,
            0.0,
            60.0,
            60.0,
        ));
        let bound = bind(&t, &DataRecord::new());
        assert!(matches!(&bound.elements[0].content, Content::Code { value, symbology: Symbology::Qr } if value == "https://example.com/p/1"));
        assert!(bound.gaps.is_empty());
    }

    #[test]
    fn test_prefix_and_number_formatting() {
        let t = Template::new("Q", TemplateType::Item, 50.0, 30.0).element(Element::new(
            ElementKind::FieldText {
                field: "quantity".into(),
                prefix: "Qty: ".into(),
            },
            0.0,
            0.0,
            60.0,
            20.0,
        ));
        let bound = bind(&t, &DataRecord::new().with("quantity", 10i64));
        assert_eq!(bound.elements[0].content, Content::Text("Qty: 10".into()));
    }

    #[test]
    fn test_table_cells() {
        let t = Template::new("T", TemplateType::Item, 50.0, 30.0).element(Element::new(
            ElementKind::Table(TableConfig {
                rows: 2,
                cols: 2,
                cells: vec![vec![
                    Binding::Literal("Code".into()),
                    Binding::Field("item_code".into()),
                ]],
            }),
            0.0,
            0.0,
            100.0,
            40.0,
        ));
        let bound = bind(&t, &DataRecord::new().with("item_code", "SKU-9"));
        assert_eq!(
            bound.elements[0].content,
            Content::Table(vec![
                vec!["Code".into(), "SKU-9".into()],
                vec!["Cell 2,1".into(), "Cell 2,2".into()],
            ])
        );
    }

    #[test]
    fn test_sample_overrides() {
        let overrides = DataRecord::new()
            .with("item_code", "REAL-1")
            .with("batch_no", "");
        let record = DataRecord::sample_with(&overrides);
        assert_eq!(record.text("item_code").unwrap(), "REAL-1");
        assert_eq!(record.text("batch_no").unwrap(), "BATCH001");
        assert_eq!(record.text("company").unwrap(), "Sample Company");
    }

    #[test]
    fn test_record_json_values() {
        let record: DataRecord =
            serde_json::from_str(r#"{"item_code":"A1","quantity":3,"exp_date":"2025-01-31"}"#).unwrap();
        assert_eq!(record.get("quantity"), Some(&FieldValue::Number(3.0)));
        assert!(matches!(record.get("exp_date"), Some(FieldValue::Date(_))));
        assert_eq!(record.text("exp_date").unwrap(), "2025-01-31");
        assert_eq!(record.reference(TemplateType::Item), "A1");
    }

    #[test]
    fn test_null_and_flag_fields() {
        let record: DataRecord = serde_json::from_str(
            r#"{"item_code":"A","item_name":"Widget","exp_date":null,"serialized":true,"tags":["x"]}"#,
        )
        .unwrap();
        assert!(record.get("exp_date").is_none());
        assert_eq!(record.text("serialized").unwrap(), "true");
        assert_eq!(record.text("tags").unwrap(), r#"["x"]"#);

        let template = Template::new("Shelf", TemplateType::Batch, 50.0, 30.0)
            .element(Element::field_text("exp_date", 0.0, 0.0, 80.0, 20.0));
        assert_eq!(bind(&template, &record).gaps, vec!["exp_date".to_string()]);
    }
}
