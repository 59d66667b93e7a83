//! Portable template packages for export and import.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "created_at": "2024-05-01T10:00:00Z",
//!   "templates": [
//!     {"name": "Shelf", "type": "item", "width": 50, "height": 30,
//!      "markup_source": "{\"elements\":[...]}", "style_source": ".label{...}"}
//!   ]
//! }
//! ```
//!
//! `markup_source` carries the element layout as JSON and is the source of
//! truth on import. `style_source` is the generated stylesheet, included for
//! consumers that only render markup; import regenerates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{BarcodeSize, Element, Template, TemplateStore, TemplateType};
use crate::error::EtiquetaError;
use crate::markup;
use crate::symbology::Symbology;

/// Package format version written on export.
pub const PACKAGE_VERSION: &str = "1.0";

/// Export/import package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePackage {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub templates: Vec<PackagedTemplate>,
}

/// One template inside a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagedTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateType,
    pub width: f32,
    pub height: f32,
    pub markup_source: String,
    pub style_source: String,
}

/// Layout payload of `markup_source`.
#[derive(Debug, Serialize, Deserialize)]
struct LayoutSource {
    elements: Vec<Element>,
    #[serde(default)]
    default_barcode_symbology: Symbology,
    #[serde(default)]
    default_barcode_size: BarcodeSize,
}

impl TemplatePackage {
    /// Parse a package, rejecting anything malformed.
    pub fn from_json(text: &str) -> Result<Self, EtiquetaError> {
        serde_json::from_str(text).map_err(|e| EtiquetaError::PackageFormat(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, EtiquetaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl PackagedTemplate {
    fn from_template(template: &Template) -> Result<Self, EtiquetaError> {
        let layout = LayoutSource {
            elements: template.elements.clone(),
            default_barcode_symbology: template.default_barcode_symbology.clone(),
            default_barcode_size: template.default_barcode_size,
        };
        Ok(Self {
            name: template.name.clone(),
            kind: template.kind,
            width: template.label_width_mm,
            height: template.label_height_mm,
            markup_source: serde_json::to_string(&layout)?,
            style_source: markup::stylesheet(template).to_css(),
        })
    }

    fn to_template(&self) -> Result<Template, String> {
        let layout: LayoutSource = serde_json::from_str(&self.markup_source)
            .map_err(|e| format!("markup_source: {}", e))?;
        let template = Template {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.clone(),
            kind: self.kind,
            label_width_mm: self.width,
            label_height_mm: self.height,
            // Defaults stay with the installation that set them.
            is_default: false,
            elements: layout.elements,
            default_barcode_symbology: layout.default_barcode_symbology,
            default_barcode_size: layout.default_barcode_size,
        };
        template.validate().map_err(|e| e.to_string())?;
        Ok(template)
    }
}

/// Package the given templates.
pub fn export_templates(
    store: &dyn TemplateStore,
    ids: &[String],
) -> Result<TemplatePackage, EtiquetaError> {
    let templates = ids
        .iter()
        .map(|id| {
            let template = store
                .get(id)?
                .ok_or_else(|| EtiquetaError::Store(format!("template {} not found", id)))?;
            PackagedTemplate::from_template(&template)
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = templates.len(), "templates exported");
    Ok(TemplatePackage {
        version: PACKAGE_VERSION.to_string(),
        created_at: Utc::now(),
        templates,
    })
}

/// Create every template in `package` under fresh ids.
///
/// All entries are decoded and validated before the first insert, so a
/// malformed package creates nothing. If the store rejects an insert, the
/// templates already created by this call are removed again.
pub fn import_templates(
    store: &mut dyn TemplateStore,
    package: &TemplatePackage,
) -> Result<Vec<String>, EtiquetaError> {
    let major = package.version.split('.').next().unwrap_or_default();
    if major != "1" {
        return Err(EtiquetaError::PackageFormat(format!(
            "unsupported package version {:?}",
            package.version
        )));
    }

    let templates = package
        .templates
        .iter()
        .enumerate()
        .map(|(i, packaged)| {
            packaged
                .to_template()
                .map_err(|e| EtiquetaError::PackageFormat(format!("templates[{}]: {}", i, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut ids = Vec::with_capacity(templates.len());
    for template in templates {
        let id = template.id.clone();
        if let Err(e) = store.insert(template) {
            roll_back(store, &ids);
            return Err(e);
        }
        ids.push(id);
    }

    info!(count = ids.len(), "templates imported");
    Ok(ids)
}

fn roll_back(store: &mut dyn TemplateStore, ids: &[String]) {
    for id in ids {
        if let Err(e) = store.remove(id) {
            warn!(template = %id, error = %e, "could not roll back imported template");
        }
    }
    warn!(count = ids.len(), "import rolled back");
}
