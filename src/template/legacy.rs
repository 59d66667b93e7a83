//! Checkbox-style field-selection templates.
//!
//! Simple templates pick which record fields to show; the layout is fixed.
//! Selected fields stack top to bottom in a fixed order with captions, and a
//! barcode of the primary identifier always closes the label.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ ITEM-001                 │  item code, bold
//! │ Sample Product Name      │  item name
//! │ Batch: BATCH001          │
//! │ MFG: 01/01/2024          │
//! │ ▌▌▐▌▌▐▐▌▌▐▌▐▐▌▌▐▌▌▐▐▌    │  barcode
//! └──────────────────────────┘
//! ```

use serde::Deserialize;

use super::{BarcodeSize, Element, ElementKind, FontWeight, Style, Template, TemplateType};
use crate::printer::units::{CSS_PX_PER_MM, mm_to_px};
use crate::symbology::Symbology;

const MARGIN_PX: f32 = 4.0;
const LINE_SPACING: f32 = 1.3;
const MIN_BARCODE_HEIGHT_PX: f32 = 24.0;
const MIN_FONT_SIZE_PX: f32 = 4.0;

fn default_width() -> f32 {
    50.0
}

fn default_height() -> f32 {
    30.0
}

/// Field-selection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateType,
    pub label_width_mm: f32,
    pub label_height_mm: f32,
    pub is_default: bool,
    pub show_item_code: bool,
    pub show_item_name: bool,
    pub show_batch_no: bool,
    pub show_serial_no: bool,
    pub show_mfg_date: bool,
    pub show_exp_date: bool,
    pub show_quantity: bool,
    pub show_company: bool,
    pub barcode_symbology: Option<Symbology>,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            kind: TemplateType::default(),
            label_width_mm: default_width(),
            label_height_mm: default_height(),
            is_default: false,
            show_item_code: false,
            show_item_name: false,
            show_batch_no: false,
            show_serial_no: false,
            show_mfg_date: false,
            show_exp_date: false,
            show_quantity: false,
            show_company: false,
            barcode_symbology: None,
        }
    }
}

/// (enabled, field, caption, font size px, bold)
type Row<'a> = (bool, &'a str, &'a str, f32, bool);

impl LegacyConfig {
    /// Lay the selected fields out as positioned elements.
    pub fn into_template(self) -> Template {
        let rows: [Row<'_>; 8] = [
            (self.show_item_code, "item_code", "", 13.0, true),
            (self.show_item_name, "item_name", "", 12.0, false),
            (self.show_batch_no, "batch_no", "Batch: ", 11.0, false),
            (self.show_serial_no, "serial_no", "Serial: ", 11.0, false),
            (self.show_mfg_date, "mfg_date", "MFG: ", 9.0, false),
            (self.show_exp_date, "exp_date", "EXP: ", 9.0, false),
            (self.show_quantity, "quantity", "Qty: ", 11.0, false),
            (self.show_company, "company", "", 11.0, false),
        ];

        let label_w = mm_to_px(self.label_width_mm as f64, CSS_PX_PER_MM) as f32;
        let label_h = mm_to_px(self.label_height_mm as f64, CSS_PX_PER_MM) as f32;
        let content_w = (label_w - 2.0 * MARGIN_PX).max(1.0);

        let selected: Vec<Row<'_>> = rows.into_iter().filter(|row| row.0).collect();

        // Rows shrink together when they would crowd out the barcode
        let natural: f32 = selected.iter().map(|row| (row.3 * LINE_SPACING).ceil()).sum();
        let budget = (label_h - 2.0 * MARGIN_PX - MIN_BARCODE_HEIGHT_PX).max(0.0);
        let scale = if natural > budget { budget / natural } else { 1.0 };

        let mut elements = Vec::new();
        let mut y = MARGIN_PX;
        for (_, field, caption, font_size, bold) in selected {
            let font_size = (font_size * scale).max(MIN_FONT_SIZE_PX);
            let height = if scale < 1.0 {
                (font_size * LINE_SPACING).floor()
            } else {
                (font_size * LINE_SPACING).ceil()
            };
            elements.push(
                Element::new(
                    ElementKind::FieldText {
                        field: field.to_string(),
                        prefix: caption.to_string(),
                    },
                    MARGIN_PX,
                    y,
                    content_w,
                    height,
                )
                .with_style(Style {
                    font_size,
                    font_weight: if bold { FontWeight::Bold } else { FontWeight::Normal },
                    ..Style::default()
                }),
            );
            y += height;
        }

        let barcode_h = (label_h - y - MARGIN_PX).max(1.0);
        elements.push(Element::new(
            ElementKind::Barcode {
                field: Some(self.kind.primary_field().to_string()),
                value: None,
                symbology: None,
            },
            MARGIN_PX,
            y,
            content_w,
            barcode_h,
        ));

        Template {
            id: self.id,
            name: self.name,
            kind: self.kind,
            label_width_mm: self.label_width_mm,
            label_height_mm: self.label_height_mm,
            is_default: self.is_default,
            elements,
            default_barcode_symbology: self.barcode_symbology.unwrap_or_default(),
            default_barcode_size: BarcodeSize::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barcode_always_present() {
        let template = LegacyConfig::default().into_template();
        assert_eq!(template.elements.len(), 1);
        assert!(matches!(template.elements[0].kind, ElementKind::Barcode { .. }));
        assert_eq!(template.label_width_mm, 50.0);
    }

    #[test]
    fn test_fields_stack_in_order() {
        let template = LegacyConfig {
            kind: TemplateType::Batch,
            show_item_code: true,
            show_batch_no: true,
            show_exp_date: true,
            ..Default::default()
        }
        .into_template();

        let fields: Vec<_> = template
            .elements
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::FieldText { field, prefix } => Some((field.as_str(), prefix.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec![("item_code", ""), ("batch_no", "Batch: "), ("exp_date", "EXP: ")]
        );

        let ys: Vec<f32> = template.elements.iter().map(|e| e.y).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]));

        // Batch labels scan the batch number
        let barcode = template.elements.last().unwrap();
        assert!(matches!(
            &barcode.kind,
            ElementKind::Barcode { field: Some(f), .. } if f == "batch_no"
        ));
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_every_field_fits_small_label() {
        let template = LegacyConfig {
            kind: TemplateType::Batch,
            show_item_code: true,
            show_item_name: true,
            show_batch_no: true,
            show_serial_no: true,
            show_mfg_date: true,
            show_exp_date: true,
            show_quantity: true,
            show_company: true,
            ..Default::default()
        }
        .into_template();

        assert_eq!(template.elements.len(), 9);
        assert!(template.validate().is_ok());
        let barcode = template.elements.last().unwrap();
        assert!(barcode.height >= MIN_BARCODE_HEIGHT_PX);
    }

    #[test]
    fn test_item_code_is_bold() {
        let template = LegacyConfig {
            show_item_code: true,
            ..Default::default()
        }
        .into_template();
        assert_eq!(template.elements[0].style.font_weight, FontWeight::Bold);
    }

    #[test]
    fn test_deserialize_uses_defaults() {
        let config: LegacyConfig =
            serde_json::from_str(r#"{"name":"Basic","type":"serial","show_serial_no":true}"#).unwrap();
        assert_eq!(config.label_height_mm, 30.0);
        assert!(config.show_serial_no);
        assert!(!config.show_item_code);
    }
}
