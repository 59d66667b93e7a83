//! Preset template library.
//!
//! Ready-made field selections grouped by use case. A preset is a
//! [`LegacyConfig`], so installing one goes through the same build path as a
//! checkbox template.
//!
//! | Category | Preset | Size | Type |
//! |----------|--------|------|------|
//! | Industrial | Heavy Duty Label | 100×50mm | item |
//! | Industrial | Warehouse Tag | 75×50mm | batch |
//! | Retail | Price Tag | 40×25mm | item |
//! | Retail | Product Label | 50×30mm | item |
//! | Medical | Patient Wristband | 90×25mm | serial |
//! | Medical | Sample Label | 50×25mm | batch |

use serde::Serialize;

use super::{LegacyConfig, TemplateType};

/// One named preset.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: &'static str,
    pub config: LegacyConfig,
}

/// Presets sharing a use case.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: &'static str,
    pub presets: Vec<Preset>,
}

/// Listing entry for pickers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetSummary {
    pub category: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: TemplateType,
    pub label_width_mm: f32,
    pub label_height_mm: f32,
}

fn preset(name: &'static str, kind: TemplateType, w: f32, h: f32, fields: &[&str]) -> Preset {
    let mut config = LegacyConfig {
        name: name.to_string(),
        kind,
        label_width_mm: w,
        label_height_mm: h,
        ..LegacyConfig::default()
    };
    for field in fields {
        match *field {
            "item_code" => config.show_item_code = true,
            "item_name" => config.show_item_name = true,
            "batch_no" => config.show_batch_no = true,
            "serial_no" => config.show_serial_no = true,
            "mfg_date" => config.show_mfg_date = true,
            "exp_date" => config.show_exp_date = true,
            "quantity" => config.show_quantity = true,
            "company" => config.show_company = true,
            _ => {}
        }
    }
    Preset { name, config }
}

/// The built-in library.
pub fn library() -> Vec<Category> {
    vec![
        Category {
            name: "Industrial",
            presets: vec![
                preset(
                    "Heavy Duty Label",
                    TemplateType::Item,
                    100.0,
                    50.0,
                    &["item_code", "item_name", "quantity", "company"],
                ),
                preset(
                    "Warehouse Tag",
                    TemplateType::Batch,
                    75.0,
                    50.0,
                    &["item_code", "batch_no", "mfg_date", "exp_date"],
                ),
            ],
        },
        Category {
            name: "Retail",
            presets: vec![
                preset("Price Tag", TemplateType::Item, 40.0, 25.0, &["item_name"]),
                preset(
                    "Product Label",
                    TemplateType::Item,
                    50.0,
                    30.0,
                    &["item_code", "item_name", "company"],
                ),
            ],
        },
        Category {
            name: "Medical",
            presets: vec![
                preset(
                    "Patient Wristband",
                    TemplateType::Serial,
                    90.0,
                    25.0,
                    &["serial_no", "item_name"],
                ),
                preset(
                    "Sample Label",
                    TemplateType::Batch,
                    50.0,
                    25.0,
                    &["batch_no", "mfg_date", "exp_date"],
                ),
            ],
        },
    ]
}

/// Flat listing of every preset.
pub fn summaries() -> Vec<PresetSummary> {
    library()
        .into_iter()
        .flat_map(|category| {
            category.presets.into_iter().map(move |p| PresetSummary {
                category: category.name,
                name: p.name,
                kind: p.config.kind,
                label_width_mm: p.config.label_width_mm,
                label_height_mm: p.config.label_height_mm,
            })
        })
        .collect()
}

/// Look up a preset by category and name, ignoring case.
pub fn find(category: &str, name: &str) -> Option<Preset> {
    library()
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(category))?
        .presets
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
