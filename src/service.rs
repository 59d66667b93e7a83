//! # Label Service
//!
//! The inbound surface: one object that owns a template store and a
//! dispatcher and exposes the operations callers use.
//!
//! | Operation | Returns |
//! |-----------|---------|
//! | [`build_template`](LabelService::build_template) | id of the saved template, or a validation error |
//! | [`templates_of`](LabelService::templates_of) | stored templates for one record type |
//! | [`presets`](LabelService::presets) | built-in preset library |
//! | [`install_preset`](LabelService::install_preset) | id of the template built from a preset |
//! | [`render_label`](LabelService::render_label) | [`DispatchOutcome`] |
//! | [`print_record`](LabelService::print_record) | outcome using the record type's template |
//! | [`preview`](LabelService::preview) | HTML bound to sample data |
//! | [`render_batch`](LabelService::render_batch) | one outcome per record |
//! | [`export_templates`](LabelService::export_templates) | portable package |
//! | [`import_templates`](LabelService::import_templates) | ids of created templates |
//!
//! ```
//! use etiqueta::{DataRecord, EtiquetaConfig, LabelService, MemoryStore, PrintTarget};
//!
//! let mut service = LabelService::new(MemoryStore::new(), EtiquetaConfig::default());
//! let id = service.build_template(serde_json::from_str(r#"{
//!     "mode": "legacy", "name": "Basic", "type": "item",
//!     "show_item_code": true, "show_item_name": true
//! }"#)?)?;
//!
//! let template = service.template(&id)?;
//! let outcome = service.render_label(&template, &DataRecord::sample(), 1, PrintTarget::Html);
//! assert!(outcome.success);
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```

use tracing::info;

use crate::binder::{DataRecord, bind};
use crate::config::EtiquetaConfig;
use crate::dispatch::{BatchEntry, DispatchOutcome, Dispatcher, PrintTarget, RenderJob, render_batch};
use crate::error::EtiquetaError;
use crate::markup::{self, HtmlDocument};
use crate::symbology::SymbologyCache;
use crate::template::{
    self, PresetSummary, Template, TemplatePackage, TemplateSpec, TemplateStore, TemplateType,
    library, resolve_template, save_template,
};

/// Template store plus dispatcher.
pub struct LabelService<S: TemplateStore> {
    store: S,
    dispatcher: Dispatcher,
    config: EtiquetaConfig,
}

impl<S: TemplateStore> LabelService<S> {
    pub fn new(store: S, config: EtiquetaConfig) -> Self {
        Self {
            store,
            dispatcher: Dispatcher::new(&config),
            config,
        }
    }

    /// Replace the dispatcher, e.g. to plug in another PDF engine.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &EtiquetaConfig {
        &self.config
    }

    /// Build, validate and save a template.
    pub fn build_template(&mut self, spec: TemplateSpec) -> Result<String, EtiquetaError> {
        let template = template::build_template(spec)?;
        save_template(&mut self.store, template)
    }

    /// Fetch a stored template.
    pub fn template(&self, id: &str) -> Result<Template, EtiquetaError> {
        self.store
            .get(id)?
            .ok_or_else(|| EtiquetaError::Store(format!("template {} not found", id)))
    }

    /// Stored templates for a record type, for template pickers.
    pub fn templates_of(&self, kind: TemplateType) -> Result<Vec<Template>, EtiquetaError> {
        self.store.templates_of(kind)
    }

    /// Built-in presets grouped by category.
    pub fn presets(&self) -> Vec<PresetSummary> {
        library::summaries()
    }

    /// Build and save the named preset as a new, non-default template.
    pub fn install_preset(&mut self, category: &str, name: &str) -> Result<String, EtiquetaError> {
        let preset = library::find(category, name).ok_or_else(|| {
            EtiquetaError::Validation(format!("no preset {:?} in category {:?}", name, category))
        })?;
        let id = self.build_template(TemplateSpec::Legacy(preset.config))?;
        info!(template = %id, preset = preset.name, "preset installed");
        Ok(id)
    }

    /// Render and deliver one label job.
    pub fn render_label(
        &self,
        template: &Template,
        record: &DataRecord,
        copies: u32,
        target: PrintTarget,
    ) -> DispatchOutcome {
        self.dispatcher.dispatch(&RenderJob {
            template,
            record,
            copies,
            target,
        })
    }

    /// Print a record with the default template for its type.
    pub fn print_record(
        &self,
        kind: TemplateType,
        record: &DataRecord,
        copies: u32,
        target: PrintTarget,
    ) -> Result<DispatchOutcome, EtiquetaError> {
        let template = resolve_template(&self.store, kind)?;
        Ok(self.render_label(&template, record, copies, target))
    }

    /// HTML preview of a stored template bound to sample data, with
    /// `overrides` applied key by key.
    pub fn preview(&self, id: &str, overrides: &DataRecord) -> Result<HtmlDocument, EtiquetaError> {
        let template = self.template(id)?;
        template.validate()?;
        let record = DataRecord::sample_with(overrides);
        Ok(markup::render(&bind(&template, &record), 1, &SymbologyCache::default()))
    }

    /// One job per record, isolated from each other.
    pub fn render_batch(
        &self,
        template: &Template,
        records: &[DataRecord],
        copies: u32,
        target: &PrintTarget,
    ) -> Vec<BatchEntry> {
        render_batch(
            &self.dispatcher,
            template,
            records,
            copies,
            target,
            self.config.defaults.batch_workers,
        )
    }

    pub fn export_templates(&self, ids: &[String]) -> Result<TemplatePackage, EtiquetaError> {
        template::export_templates(&self.store, ids)
    }

    pub fn import_templates(&mut self, package: &TemplatePackage) -> Result<Vec<String>, EtiquetaError> {
        let ids = template::import_templates(&mut self.store, package)?;
        info!(count = ids.len(), "package imported");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Element, MemoryStore};

    fn service() -> (LabelService<MemoryStore>, String) {
        let mut service = LabelService::new(MemoryStore::new(), EtiquetaConfig::default());
        let mut t = Template::new("Batch", TemplateType::Batch, 50.0, 30.0)
            .element(Element::field_text("batch_no", 0.0, 0.0, 100.0, 20.0))
            .element(Element::field_text("company", 0.0, 20.0, 100.0, 20.0));
        t.id = "batch".into();
        t.is_default = true;
        let id = save_template(&mut service.store, t).unwrap();
        (service, id)
    }

    #[test]
    fn test_preview_uses_sample_overrides() {
        let (service, id) = service();
        let overrides = DataRecord::new().with("batch_no", "LIVE-7").with("company", "");
        let doc = service.preview(&id, &overrides).unwrap();
        assert!(doc.html.contains(">LIVE-7<"));
        assert!(doc.html.contains(">Sample Company<"));
    }

    #[test]
    fn test_print_record_resolves_default() {
        let (service, _) = service();
        let record = DataRecord::batch("B-1", "I-1", "Widget", None, None, "ACME");
        let outcome = service
            .print_record(TemplateType::Batch, &record, 1, PrintTarget::Html)
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.log.template_used, "batch");
        assert_eq!(outcome.log.reference, "B-1");

        assert!(service.print_record(TemplateType::Serial, &record, 1, PrintTarget::Html).is_err());
    }

    #[test]
    fn test_build_template_rejects_second_default() {
        let (mut service, _) = service();
        let spec: TemplateSpec = serde_json::from_str(
            r#"{"mode":"legacy","name":"Other","type":"batch","is_default":true,"show_batch_no":true}"#,
        )
        .unwrap();
        let err = service.build_template(spec).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(service.store().len(), 1);
    }

    #[test]
    fn test_install_preset_and_list_by_type() {
        let (mut service, _) = service();
        assert_eq!(service.presets().len(), 6);

        let id = service.install_preset("Industrial", "Warehouse Tag").unwrap();
        let batch: Vec<String> = service
            .templates_of(TemplateType::Batch)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(batch.len(), 2);
        assert!(batch.contains(&id));
        assert_eq!(service.template(&id).unwrap().name, "Warehouse Tag");
        assert!(service.templates_of(TemplateType::Serial).unwrap().is_empty());

        assert!(service.install_preset("Industrial", "Nope").is_err());
    }

    #[test]
    fn test_export_import_through_service() {
        let (mut service, id) = service();
        let package = service.export_templates(&[id]).unwrap();
        let ids = service.import_templates(&package).unwrap();
        assert_eq!(service.store().len(), 2);
        assert!(!service.template(&ids[0]).unwrap().is_default);
    }
}
