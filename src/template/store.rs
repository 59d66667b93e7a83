//! Template persistence seam.
//!
//! Storage belongs to an external document store; the core only needs simple
//! CRUD calls. [`MemoryStore`] implements them in memory (and as a JSON file
//! for the CLI).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use super::{Template, TemplateType};
use crate::error::EtiquetaError;

/// CRUD interface the core calls into.
pub trait TemplateStore {
    fn get(&self, id: &str) -> Result<Option<Template>, EtiquetaError>;
    fn list(&self) -> Result<Vec<Template>, EtiquetaError>;
    fn insert(&mut self, template: Template) -> Result<(), EtiquetaError>;
    fn update(&mut self, template: Template) -> Result<(), EtiquetaError>;
    fn remove(&mut self, id: &str) -> Result<Option<Template>, EtiquetaError>;

    /// Templates designed for one record type.
    fn templates_of(&self, kind: TemplateType) -> Result<Vec<Template>, EtiquetaError> {
        Ok(self.list()?.into_iter().filter(|t| t.kind == kind).collect())
    }
}

/// In-memory store, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    templates: BTreeMap<String, Template>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of templates. A missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EtiquetaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        let templates: Vec<Template> = serde_json::from_str(&text)?;
        Ok(Self {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        })
    }

    /// Write all templates as a JSON array.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EtiquetaError> {
        let templates: Vec<&Template> = self.templates.values().collect();
        fs::write(path, serde_json::to_string_pretty(&templates)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Template>, EtiquetaError> {
        Ok(self.templates.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Template>, EtiquetaError> {
        Ok(self.templates.values().cloned().collect())
    }

    fn insert(&mut self, template: Template) -> Result<(), EtiquetaError> {
        if self.templates.contains_key(&template.id) {
            return Err(EtiquetaError::Store(format!(
                "template {} already exists",
                template.id
            )));
        }
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    fn update(&mut self, template: Template) -> Result<(), EtiquetaError> {
        match self.templates.get_mut(&template.id) {
            Some(existing) => {
                *existing = template;
                Ok(())
            }
            None => Err(EtiquetaError::Store(format!(
                "template {} does not exist",
                template.id
            ))),
        }
    }

    fn remove(&mut self, id: &str) -> Result<Option<Template>, EtiquetaError> {
        Ok(self.templates.remove(id))
    }
}

/// Validate and persist a template.
///
/// A blank id is replaced with a fresh UUID. A default template is rejected
/// when another template of the same type is already the default; the
/// existing default is left untouched.
pub fn save_template(
    store: &mut dyn TemplateStore,
    mut template: Template,
) -> Result<String, EtiquetaError> {
    template.validate()?;
    if template.id.trim().is_empty() {
        template.id = uuid::Uuid::new_v4().to_string();
    }

    if template.is_default {
        let existing = store
            .list()?
            .into_iter()
            .find(|t| t.is_default && t.kind == template.kind && t.id != template.id);
        if let Some(existing) = existing {
            return Err(EtiquetaError::Validation(format!(
                "Default template already exists for {}: {}",
                template.kind, existing.id
            )));
        }
    }

    let id = template.id.clone();
    if store.get(&id)?.is_some() {
        store.update(template)?;
    } else {
        store.insert(template)?;
    }
    info!(template = %id, "template saved");
    Ok(id)
}

/// Template to use for a record type: the default for that type, else any
/// template of that type.
pub fn resolve_template(
    store: &dyn TemplateStore,
    kind: TemplateType,
) -> Result<Template, EtiquetaError> {
    let candidates = store.templates_of(kind)?;
    let fallback = candidates.first().cloned();
    candidates
        .into_iter()
        .find(|t| t.is_default)
        .or(fallback)
        .ok_or_else(|| EtiquetaError::Validation(format!("No template found for {}", kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Element;

    fn template(id: &str, kind: TemplateType, is_default: bool) -> Template {
        let mut t = Template::new(id, kind, 50.0, 30.0)
            .element(Element::field_text("item_code", 0.0, 0.0, 80.0, 20.0));
        t.id = id.to_string();
        t.is_default = is_default;
        t
    }

    #[test]
    fn test_second_default_rejected() {
        let mut store = MemoryStore::new();
        save_template(&mut store, template("a", TemplateType::Item, true)).unwrap();

        let err = save_template(&mut store, template("b", TemplateType::Item, true)).unwrap_err();
        assert!(matches!(err, EtiquetaError::Validation(_)));
        assert!(err.to_string().contains("Default template already exists for item: a"));

        // First default intact, second never stored
        assert!(store.get("a").unwrap().unwrap().is_default);
        assert!(store.get("b").unwrap().is_none());
    }

    #[test]
    fn test_defaults_per_type_are_independent() {
        let mut store = MemoryStore::new();
        save_template(&mut store, template("a", TemplateType::Item, true)).unwrap();
        save_template(&mut store, template("b", TemplateType::Batch, true)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_resaving_default_is_update() {
        let mut store = MemoryStore::new();
        save_template(&mut store, template("a", TemplateType::Item, true)).unwrap();
        let mut t = template("a", TemplateType::Item, true);
        t.name = "Renamed".into();
        save_template(&mut store, t).unwrap();
        assert_eq!(store.get("a").unwrap().unwrap().name, "Renamed");
    }

    #[test]
    fn test_invalid_template_not_saved() {
        let mut store = MemoryStore::new();
        let mut t = template("a", TemplateType::Item, false);
        t.elements.push(Element::table(1000, 1000, 0.0, 0.0, 10.0, 10.0));
        assert!(save_template(&mut store, t).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_resolve_prefers_default() {
        let mut store = MemoryStore::new();
        save_template(&mut store, template("a", TemplateType::Serial, false)).unwrap();
        save_template(&mut store, template("b", TemplateType::Serial, true)).unwrap();
        assert_eq!(resolve_template(&store, TemplateType::Serial).unwrap().id, "b");
    }

    #[test]
    fn test_resolve_falls_back_then_fails() {
        let mut store = MemoryStore::new();
        save_template(&mut store, template("a", TemplateType::Batch, false)).unwrap();
        assert_eq!(resolve_template(&store, TemplateType::Batch).unwrap().id, "a");
        let err = resolve_template(&store, TemplateType::Item).unwrap_err();
        assert!(err.to_string().contains("No template found for item"));
    }

    #[test]
    fn test_blank_id_gets_uuid() {
        let mut store = MemoryStore::new();
        let id = save_template(&mut store, template("", TemplateType::Item, false)).unwrap();
        assert_eq!(id.len(), 36);
        assert!(store.get("").unwrap().is_none());
        assert_eq!(store.get(&id).unwrap().unwrap().id, id);

        let other = save_template(&mut store, template(" ", TemplateType::Item, false)).unwrap();
        assert_ne!(id, other);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_templates_of_filters_by_type() {
        let mut store = MemoryStore::new();
        save_template(&mut store, template("a", TemplateType::Batch, false)).unwrap();
        save_template(&mut store, template("b", TemplateType::Item, true)).unwrap();
        save_template(&mut store, template("c", TemplateType::Batch, true)).unwrap();

        let ids: Vec<String> = store
            .templates_of(TemplateType::Batch)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
        assert!(store.templates_of(TemplateType::Serial).unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let mut store = MemoryStore::load(&path).unwrap();
        save_template(&mut store, template("a", TemplateType::Item, true)).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.get("a").unwrap(), store.get("a").unwrap());
    }
}
