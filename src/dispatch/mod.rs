//! # Print Dispatcher
//!
//! Runs one [`RenderJob`] end to end: validate, bind, render for the chosen
//! target, deliver.
//!
//! ## States
//!
//! ```text
//!         ┌────────────────────────────────────────────┐
//!         v                                            │
//!       Idle ──> Rendering ──> Delivering ──> Idle     │
//!                    │              │                  │
//!                    └──────────────┴──> Failed ───────┘
//! ```
//!
//! ## Targets
//!
//! | Target | Renderer | Delivery | On delivery failure |
//! |--------|----------|----------|---------------------|
//! | `html` | markup | returned as artifact | n/a |
//! | `pdf` | markup | external PDF engine | HTML returned, warning |
//! | `thermal` | commands | raw TCP, 5 s connect timeout | job failed |
//! | `laser` | markup | temp file to OS spooler | job failed |
//!
//! [`Dispatcher::dispatch`] never returns an error: every outcome, good or
//! bad, is a [`DispatchOutcome`] carrying `success` and a message or error.

pub mod batch;

pub use batch::{BatchEntry, render_batch};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info, instrument, warn};

use crate::binder::{BoundLabel, DataRecord, bind};
use crate::command::{self, CommandLanguage, Zpl};
use crate::config::EtiquetaConfig;
use crate::error::EtiquetaError;
use crate::markup;
use crate::printer::PrinterConfig;
use crate::symbology::{Symbology, SymbologyCache};
use crate::template::{ElementKind, Template};
use crate::transport::{CommandPdfEngine, CommandSpooler, NetworkPrinter, PdfEngine, Spooler};

// ============================================================================
// JOB MODEL
// ============================================================================

/// Where a job's output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PrintTarget {
    /// Browser-printable document.
    Html,
    /// PDF bytes, falling back to HTML.
    Pdf,
    /// Printer commands to a network printer (`host` or `host:port`).
    Thermal {
        #[serde(default)]
        printer: String,
    },
    /// OS spooler; `None` prints to the system default.
    Laser {
        #[serde(default)]
        printer: Option<String>,
    },
}

impl PrintTarget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Thermal { .. } => "thermal",
            Self::Laser { .. } => "laser",
        }
    }
}

/// One render request. Built per request and dropped afterwards.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub template: &'a Template,
    pub record: &'a DataRecord,
    pub copies: u32,
    pub target: PrintTarget,
}

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    Rendering,
    Delivering,
    Failed,
}

impl DispatchState {
    /// True if `next` may follow `self`.
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Idle, Rendering)
                | (Rendering, Delivering)
                | (Rendering, Failed)
                | (Delivering, Idle)
                | (Delivering, Failed)
                | (Failed, Idle)
        )
    }
}

/// Job status as recorded in the print log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintStatus {
    Success,
    Failed,
}

/// Print log entry. Produced for every job; storing it is the caller's
/// concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintLog {
    pub timestamp: DateTime<Utc>,
    /// Primary identifier of the record printed.
    pub reference: String,
    pub template_used: String,
    pub copies: u32,
    pub symbology: String,
    pub status: PrintStatus,
}

/// Rendered output produced by a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Html(String),
    Pdf(Vec<u8>),
    Commands(Vec<u8>),
}

/// Structured result of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-fatal problems: binding gaps, degraded symbols, omitted elements,
    /// PDF fallback.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// States visited, starting and ending at `idle`.
    pub states: Vec<DispatchState>,
    pub log: PrintLog,
    #[serde(skip)]
    pub artifact: Option<Artifact>,
}

// ============================================================================
// STATE MACHINE
// ============================================================================

struct Machine {
    state: DispatchState,
    history: Vec<DispatchState>,
}

impl Machine {
    fn new() -> Self {
        Self {
            state: DispatchState::Idle,
            history: vec![DispatchState::Idle],
        }
    }

    fn advance(&mut self, next: DispatchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "dispatch state");
        self.state = next;
        self.history.push(next);
    }
}

/// What a job carries from rendering into delivery.
struct Rendered {
    artifact: Artifact,
    warnings: Vec<String>,
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Renders jobs and hands the output to the matching transport.
pub struct Dispatcher {
    printer: PrinterConfig,
    pdf: Box<dyn PdfEngine>,
    spooler: Box<dyn Spooler>,
    language: Box<dyn CommandLanguage>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&EtiquetaConfig::default())
    }
}

impl Dispatcher {
    /// Dispatcher using the command-line PDF engine and spooler and ZPL.
    pub fn new(config: &EtiquetaConfig) -> Self {
        Self {
            printer: config.printer.clone(),
            pdf: Box::new(CommandPdfEngine::new(config.pdf.clone())),
            spooler: Box::new(CommandSpooler::new(config.spooler.clone())),
            language: Box::new(Zpl),
        }
    }

    pub fn with_pdf_engine(mut self, engine: impl PdfEngine + 'static) -> Self {
        self.pdf = Box::new(engine);
        self
    }

    pub fn with_spooler(mut self, spooler: impl Spooler + 'static) -> Self {
        self.spooler = Box::new(spooler);
        self
    }

    pub fn with_language(mut self, language: impl CommandLanguage + 'static) -> Self {
        self.language = Box::new(language);
        self
    }

    pub fn printer(&self) -> &PrinterConfig {
        &self.printer
    }

    /// Run `job` to completion. Never fails; see [`DispatchOutcome`].
    #[instrument(skip_all, fields(template = %job.template.id, target = job.target.name(), copies = job.copies))]
    pub fn dispatch(&self, job: &RenderJob<'_>) -> DispatchOutcome {
        let mut machine = Machine::new();
        machine.advance(DispatchState::Rendering);

        let result = self
            .render(job)
            .and_then(|rendered| {
                machine.advance(DispatchState::Delivering);
                self.deliver(job, rendered)
            });

        match result {
            Ok((message, artifact, warnings)) => {
                machine.advance(DispatchState::Idle);
                info!(%message, "job complete");
                self.outcome(job, true, Some(message), None, warnings, artifact, machine)
            }
            Err(error) => {
                machine.advance(DispatchState::Failed);
                machine.advance(DispatchState::Idle);
                warn!(%error, "job failed");
                self.outcome(job, false, None, Some(error), Vec::new(), None, machine)
            }
        }
    }

    /// Validate and render. Errors are already user-facing strings.
    fn render(&self, job: &RenderJob<'_>) -> Result<Rendered, String> {
        if job.copies < 1 {
            return Err(EtiquetaError::Validation("copies must be at least 1".into()).to_string());
        }
        job.template.validate().map_err(|e| e.to_string())?;

        let label = bind(job.template, job.record);
        let mut warnings: Vec<String> = label
            .gaps
            .iter()
            .map(|field| format!("Missing field: {}", field))
            .collect();

        // One cache per job: copies share it, jobs do not
        let encoder = SymbologyCache::default();

        let artifact = match &job.target {
            PrintTarget::Thermal { printer } => {
                if printer.trim().is_empty() {
                    return Err("Printer IP required for thermal printing".to_string());
                }
                let out = command::render(self.language.as_ref(), &label, job.copies, &self.printer, &encoder);
                for &index in &out.degraded {
                    warnings.push(format!(
                        "{} element {} printed as a fallback",
                        kind_name(&label, index),
                        index
                    ));
                }
                for &index in &out.omitted {
                    warnings.push(format!(
                        "{} element {} not supported by {} and omitted",
                        kind_name(&label, index),
                        index,
                        self.language.name()
                    ));
                }
                Artifact::Commands(out.bytes)
            }
            PrintTarget::Html | PrintTarget::Pdf | PrintTarget::Laser { .. } => {
                let doc = markup::render(&label, job.copies, &encoder);
                for &index in &doc.degraded {
                    warnings.push(format!("barcode element {} could not be encoded; placeholder used", index));
                }
                Artifact::Html(doc.html)
            }
        };

        Ok(Rendered { artifact, warnings })
    }

    fn deliver(
        &self,
        job: &RenderJob<'_>,
        rendered: Rendered,
    ) -> Result<(String, Option<Artifact>, Vec<String>), String> {
        let Rendered {
            artifact,
            mut warnings,
        } = rendered;
        let copies = job.copies;

        match (&job.target, artifact) {
            (PrintTarget::Html, artifact) => {
                Ok((format!("Rendered {} labels", copies), Some(artifact), warnings))
            }
            (PrintTarget::Pdf, Artifact::Html(html)) => {
                let template = job.template;
                match self
                    .pdf
                    .html_to_pdf(&html, template.label_width_mm, template.label_height_mm)
                {
                    Ok(pdf) => Ok((
                        format!("PDF generated with {} copies", copies),
                        Some(Artifact::Pdf(pdf)),
                        warnings,
                    )),
                    Err(e) => {
                        let message = format!("PDF generation failed, using HTML preview. Error: {}", e);
                        warn!(error = %e, "PDF engine failed, returning HTML");
                        warnings.push(message.clone());
                        Ok((message, Some(Artifact::Html(html)), warnings))
                    }
                }
            }
            (PrintTarget::Thermal { printer }, Artifact::Commands(bytes)) => {
                NetworkPrinter::resolve(printer, self.printer.port)
                    .map(|p| p.with_timeout(self.printer.connect_timeout()))
                    .and_then(|p| p.send(&bytes))
                    .map_err(|e| format!("Thermal print error: {}", e))?;
                Ok((
                    format!("Sent {} labels to thermal printer at {}", copies, printer),
                    Some(Artifact::Commands(bytes)),
                    warnings,
                ))
            }
            (PrintTarget::Laser { printer }, Artifact::Html(html)) => {
                self.spool(&html, printer.as_deref())
                    .map_err(|e| format!("Laser print error: {}", e))?;
                Ok((
                    format!("Sent {} labels to system printer", copies),
                    Some(Artifact::Html(html)),
                    warnings,
                ))
            }
            (target, _) => Err(format!("no renderer output for target {}", target.name())),
        }
    }

    /// Write the document to a temporary file and submit it.
    fn spool(&self, html: &str, printer: Option<&str>) -> Result<String, EtiquetaError> {
        let mut file = tempfile::Builder::new()
            .prefix("etiqueta-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        file.flush()?;
        self.spooler.submit(file.path(), printer)
    }

    #[allow(clippy::too_many_arguments)]
    fn outcome(
        &self,
        job: &RenderJob<'_>,
        success: bool,
        message: Option<String>,
        error: Option<String>,
        warnings: Vec<String>,
        artifact: Option<Artifact>,
        machine: Machine,
    ) -> DispatchOutcome {
        DispatchOutcome {
            success,
            message,
            error,
            warnings,
            states: machine.history,
            log: PrintLog {
                timestamp: Utc::now(),
                reference: job.record.reference(job.template.kind),
                template_used: job.template.id.clone(),
                copies: job.copies,
                symbology: logged_symbology(job.template).to_string(),
                status: if success {
                    PrintStatus::Success
                } else {
                    PrintStatus::Failed
                },
            },
            artifact,
        }
    }
}

/// Symbology of the first code element in paint order, else the template
/// default.
fn logged_symbology(template: &Template) -> Symbology {
    template
        .paint_order()
        .into_iter()
        .find_map(|i| match &template.elements[i].kind {
            ElementKind::Barcode { symbology, .. } => Some(
                symbology
                    .clone()
                    .unwrap_or_else(|| template.default_barcode_symbology.clone()),
            ),
            ElementKind::Qr { .. } => Some(Symbology::Qr),
            _ => None,
        })
        .unwrap_or_else(|| template.default_barcode_symbology.clone())
}

fn kind_name(label: &BoundLabel<'_>, index: usize) -> &'static str {
    label
        .template
        .elements
        .get(index)
        .map(|e| e.kind.name())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Element, TemplateType};
    use std::path::Path;
    use std::sync::Mutex;

    fn shelf() -> Template {
        let mut t = Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
            .element(Element::field_text("item_code", 10.0, 10.0, 80.0, 20.0))
            .element(Element::barcode("item_code", 10.0, 40.0, 120.0, 40.0));
        t.id = "shelf".into();
        t
    }

    struct FailingPdf;

    impl PdfEngine for FailingPdf {
        fn html_to_pdf(&self, _: &str, _: f32, _: f32) -> Result<Vec<u8>, EtiquetaError> {
            Err(EtiquetaError::RenderTarget("engine missing".into()))
        }
    }

    struct FakePdf;

    impl PdfEngine for FakePdf {
        fn html_to_pdf(&self, html: &str, _: f32, _: f32) -> Result<Vec<u8>, EtiquetaError> {
            Ok(format!("%PDF-1.4 {}", html.len()).into_bytes())
        }
    }

    #[derive(Default)]
    struct RecordingSpooler {
        submitted: Mutex<Vec<(String, Option<String>)>>,
    }

    impl Spooler for RecordingSpooler {
        fn submit(&self, document: &Path, printer: Option<&str>) -> Result<String, EtiquetaError> {
            let html = std::fs::read_to_string(document)?;
            self.submitted
                .lock()
                .unwrap()
                .push((html, printer.map(String::from)));
            Ok("request id is laser-1".into())
        }
    }

    fn job<'a>(template: &'a Template, record: &'a DataRecord, target: PrintTarget) -> RenderJob<'a> {
        RenderJob {
            template,
            record,
            copies: 2,
            target,
        }
    }

    #[test]
    fn test_transitions() {
        use DispatchState::*;
        assert!(Idle.can_transition_to(Rendering));
        assert!(Rendering.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Delivering));
        assert!(!Failed.can_transition_to(Delivering));
    }

    #[test]
    fn test_html_success() {
        let t = shelf();
        let r = DataRecord::new().with("item_code", "SKU-001");
        let outcome = Dispatcher::default().dispatch(&job(&t, &r, PrintTarget::Html));
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Rendered 2 labels"));
        assert_eq!(
            outcome.states,
            vec![
                DispatchState::Idle,
                DispatchState::Rendering,
                DispatchState::Delivering,
                DispatchState::Idle
            ]
        );
        assert_eq!(outcome.log.reference, "SKU-001");
        assert_eq!(outcome.log.status, PrintStatus::Success);
        assert!(matches!(outcome.artifact, Some(Artifact::Html(_))));
    }

    #[test]
    fn test_pdf_fallback_is_success_with_warning() {
        let t = shelf();
        let r = DataRecord::new().with("item_code", "SKU-001");
        let outcome = Dispatcher::default()
            .with_pdf_engine(FailingPdf)
            .dispatch(&job(&t, &r, PrintTarget::Pdf));
        assert!(outcome.success);
        assert!(
            outcome
                .message
                .unwrap()
                .starts_with("PDF generation failed, using HTML preview. Error:")
        );
        assert!(matches!(outcome.artifact, Some(Artifact::Html(_))));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_pdf_success() {
        let t = shelf();
        let r = DataRecord::new().with("item_code", "SKU-001");
        let outcome = Dispatcher::default()
            .with_pdf_engine(FakePdf)
            .dispatch(&job(&t, &r, PrintTarget::Pdf));
        assert_eq!(outcome.message.as_deref(), Some("PDF generated with 2 copies"));
        assert!(matches!(outcome.artifact, Some(Artifact::Pdf(ref b)) if b.starts_with(b"%PDF")));
    }

    #[test]
    fn test_thermal_without_printer_fails() {
        let t = shelf();
        let r = DataRecord::new();
        let outcome = Dispatcher::default().dispatch(&job(
            &t,
            &r,
            PrintTarget::Thermal {
                printer: String::new(),
            },
        ));
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Printer IP required for thermal printing"));
        assert_eq!(outcome.log.status, PrintStatus::Failed);
        assert_eq!(
            outcome.states,
            vec![
                DispatchState::Idle,
                DispatchState::Rendering,
                DispatchState::Failed,
                DispatchState::Idle
            ]
        );
    }

    #[test]
    fn test_laser_goes_through_spooler() {
        let t = shelf();
        let r = DataRecord::new().with("item_code", "SKU-001");
        let spooler = std::sync::Arc::new(RecordingSpooler::default());

        struct Shared(std::sync::Arc<RecordingSpooler>);
        impl Spooler for Shared {
            fn submit(&self, document: &Path, printer: Option<&str>) -> Result<String, EtiquetaError> {
                self.0.submit(document, printer)
            }
        }

        let outcome = Dispatcher::default()
            .with_spooler(Shared(spooler.clone()))
            .dispatch(&job(
                &t,
                &r,
                PrintTarget::Laser {
                    printer: Some("office".into()),
                },
            ));
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Sent 2 labels to system printer"));

        let submitted = spooler.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0].0.contains("SKU-001"));
        assert_eq!(submitted[0].1.as_deref(), Some("office"));
    }

    #[test]
    fn test_invalid_template_fails_before_rendering() {
        let mut t = shelf();
        t.label_width_mm = 0.0;
        let r = DataRecord::new();
        let outcome = Dispatcher::default().dispatch(&job(&t, &r, PrintTarget::Html));
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("Validation error"));
        assert!(outcome.artifact.is_none());
    }

    #[test]
    fn test_zero_copies_rejected() {
        let t = shelf();
        let r = DataRecord::new();
        let mut j = job(&t, &r, PrintTarget::Html);
        j.copies = 0;
        assert!(!Dispatcher::default().dispatch(&j).success);
    }

    #[test]
    fn test_gaps_become_warnings() {
        let t = shelf();
        let r = DataRecord::new();
        let outcome = Dispatcher::default().dispatch(&job(&t, &r, PrintTarget::Html));
        assert!(outcome.success);
        assert_eq!(outcome.warnings, vec!["Missing field: item_code".to_string()]);
    }

    #[test]
    fn test_outcome_json_shape() {
        let t = shelf();
        let r = DataRecord::new().with("item_code", "A");
        let outcome = Dispatcher::default().dispatch(&job(&t, &r, PrintTarget::Html));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
        assert!(json.get("artifact").is_none());
        assert_eq!(json["log"]["template_used"], "shelf");
        assert_eq!(json["log"]["symbology"], "Code128");
    }

    #[test]
    fn test_log_records_rendered_symbology() {
        let r = DataRecord::new().with("item_code", "A");

        let mut t = shelf();
        if let ElementKind::Barcode { symbology, .. } = &mut t.elements[1].kind {
            *symbology = Some(Symbology::Code39);
        }
        let outcome = Dispatcher::default().dispatch(&job(&t, &r, PrintTarget::Html));
        assert_eq!(outcome.log.symbology, "Code39");

        let qr = Template::new("Q", TemplateType::Item, 50.0, 30.0)
            .element(Element::qr("item_code", 0.0, 0.0, 80.0, 80.0));
        let outcome = Dispatcher::default().dispatch(&job(&qr, &r, PrintTarget::Html));
        assert_eq!(outcome.log.symbology, "QR Code");
    }
}
