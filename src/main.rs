//! # Etiqueta CLI
//!
//! Command-line interface for label rendering.
//!
//! ## Usage
//!
//! ```bash
//! # Render a template with sample data to HTML
//! etiqueta render --template shelf.json --output shelf.html
//!
//! # Send two copies to a network thermal printer
//! etiqueta render --template shelf.json --record sku.json --copies 2 \
//!     --target thermal --printer 192.168.1.50
//!
//! # One job per record in a JSON array
//! etiqueta render --template shelf.json --record batch.json --batch
//!
//! # Check a template
//! etiqueta validate shelf.json
//!
//! # Checkbox-style config to a full template
//! etiqueta legacy basic.json > shelf.json
//!
//! # Stored batch templates, and the preset library
//! etiqueta list --store templates.json --type batch
//! etiqueta presets
//! etiqueta presets --store templates.json --install "Retail/Price Tag"
//!
//! # Move templates between installations
//! etiqueta export --store templates.json --output pack.json shelf-id
//! etiqueta import --store templates.json pack.json
//!
//! # Barcode to PNG
//! etiqueta encode --symbology EAN-13 --output ean.png 4006381333931
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use etiqueta::{
    DataRecord, EtiquetaConfig, EtiquetaError, LabelService, MemoryStore, PrintTarget, Template,
    dispatch::{Artifact, DispatchOutcome},
    symbology::{self, Symbology},
    template::{self, LegacyConfig, TemplatePackage, TemplateSpec, TemplateStore, TemplateType, build_template},
};

/// Etiqueta - label template rendering utility
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override printer resolution (dots per inch)
    #[arg(long, global = true)]
    dpi: Option<u16>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Target {
    Html,
    Pdf,
    Thermal,
    Laser,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template and deliver it to a target
    Render {
        /// Template JSON (a template, or a build spec with "mode")
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Record JSON; sample data when omitted
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,

        /// Treat the record file as an array and run one job per record
        #[arg(long)]
        batch: bool,

        /// Number of copies (defaults to the configured value)
        #[arg(long)]
        copies: Option<u32>,

        /// Output target
        #[arg(long, value_enum, default_value = "html")]
        target: Target,

        /// Printer address (thermal) or queue name (laser)
        #[arg(long)]
        printer: Option<String>,

        /// Write the rendered artifact to this file
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate a template or build spec
    Validate {
        /// Template JSON
        template: PathBuf,
    },

    /// Convert a field-selection config into a template
    Legacy {
        /// Field-selection config JSON
        config: PathBuf,
    },

    /// List stored templates
    List {
        /// Template store file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,

        /// Only templates for this record type (item, batch, serial, general)
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
    },

    /// Show the preset library, or install a preset into a store
    Presets {
        /// Template store file (required with --install)
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Preset to install, as "Category/Name"
        #[arg(long, value_name = "PRESET", requires = "store")]
        install: Option<String>,
    },

    /// Export stored templates to a package
    Export {
        /// Template store file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,

        /// Package output file; stdout when omitted
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Template ids to export
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Import a package into a template store
    Import {
        /// Template store file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,

        /// Package file
        package: PathBuf,
    },

    /// Encode a value as a barcode PNG
    Encode {
        /// Value to encode
        value: String,

        /// Symbology name (Code128, Code39, Code93, EAN-13, EAN-8, ITF, QR)
        #[arg(long, default_value = "Code128")]
        symbology: String,

        /// Image width in pixels
        #[arg(long, default_value = "200")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "100")]
        height: u32,

        /// Output PNG file
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "etiqueta=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<(), EtiquetaError> {
    let mut config = match &cli.config {
        Some(path) => EtiquetaConfig::load(path)?,
        None => EtiquetaConfig::default(),
    };
    if let Some(dpi) = cli.dpi {
        config.printer.dpi = dpi;
    }

    match cli.command {
        Commands::Render {
            template,
            record,
            batch,
            copies,
            target,
            printer,
            output,
        } => {
            let template = load_template(&template)?;
            let copies = copies.unwrap_or(config.defaults.copies);
            let target = match target {
                Target::Html => PrintTarget::Html,
                Target::Pdf => PrintTarget::Pdf,
                Target::Thermal => PrintTarget::Thermal {
                    printer: printer.unwrap_or_default(),
                },
                Target::Laser => PrintTarget::Laser { printer },
            };
            let service = LabelService::new(MemoryStore::new(), config);

            if batch {
                let path = record.ok_or_else(|| {
                    EtiquetaError::Validation("--batch requires --record".to_string())
                })?;
                let records: Vec<DataRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
                let entries = service.render_batch(&template, &records, copies, &target);
                println!("{}", serde_json::to_string_pretty(&entries)?);
                let failed = entries.iter().filter(|e| !e.outcome.success).count();
                if failed > 0 {
                    return Err(EtiquetaError::RenderTarget(format!(
                        "{} of {} records failed",
                        failed,
                        entries.len()
                    )));
                }
                return Ok(());
            }

            let record = match record {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => DataRecord::sample(),
            };
            let outcome = service.render_label(&template, &record, copies, target);
            if let Some(path) = output {
                write_artifact(&outcome, &path)?;
            }
            finish(outcome)
        }

        Commands::Validate { template } => {
            let template = load_template(&template)?;
            println!(
                "OK: {} ({}, {}x{}mm, {} elements)",
                template.name,
                template.kind,
                template.label_width_mm,
                template.label_height_mm,
                template.elements.len()
            );
            Ok(())
        }

        Commands::Legacy { config: path } => {
            let legacy: LegacyConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
            let template = build_template(TemplateSpec::Legacy(legacy))?;
            println!("{}", serde_json::to_string_pretty(&template)?);
            Ok(())
        }

        Commands::List { store, kind } => {
            let service = LabelService::new(MemoryStore::load(&store)?, config);
            let templates = match kind {
                Some(kind) => {
                    let kind: TemplateType = serde_json::from_value(serde_json::Value::String(kind))?;
                    service.templates_of(kind)?
                }
                None => service.store().list()?,
            };
            for t in templates {
                println!(
                    "{}\t{}\t{}{}",
                    t.id,
                    t.kind,
                    t.name,
                    if t.is_default { "\t(default)" } else { "" }
                );
            }
            Ok(())
        }

        Commands::Presets { store, install } => match (store, install) {
            (Some(store), Some(preset)) => {
                let (category, name) = preset.split_once('/').ok_or_else(|| {
                    EtiquetaError::Validation(format!("expected Category/Name, got {:?}", preset))
                })?;
                let mut service = LabelService::new(MemoryStore::load(&store)?, config);
                let id = service.install_preset(category.trim(), name.trim())?;
                service.into_store().save(&store)?;
                println!("{}", id);
                Ok(())
            }
            _ => {
                println!("{}", serde_json::to_string_pretty(&template::library::summaries())?);
                Ok(())
            }
        },

        Commands::Export { store, output, ids } => {
            let service = LabelService::new(MemoryStore::load(&store)?, config);
            let json = service.export_templates(&ids)?.to_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    println!("Exported {} templates to {}", ids.len(), path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }

        Commands::Import { store, package } => {
            let package = TemplatePackage::from_json(&fs::read_to_string(package)?)?;
            let mut service = LabelService::new(MemoryStore::load(&store)?, config);
            let ids = service.import_templates(&package)?;
            service.into_store().save(&store)?;
            for id in ids {
                println!("{}", id);
            }
            Ok(())
        }

        Commands::Encode {
            value,
            symbology,
            width,
            height,
            output,
        } => {
            let symbology = Symbology::parse(&symbology);
            let result = symbology::encode(&value, &symbology, width, height).ok_or_else(|| {
                EtiquetaError::Validation("nothing to encode: value is empty".to_string())
            })?;
            fs::write(&output, &result.image().png)?;
            if result.is_degraded() {
                eprintln!("Warning: {} cannot encode {:?}; wrote a placeholder", symbology, value);
            }
            println!("Saved {} to {}", symbology, output.display());
            Ok(())
        }
    }
}

/// Template file: a plain template, or a build spec tagged with `mode`.
fn load_template(path: &Path) -> Result<Template, EtiquetaError> {
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    if value.get("mode").is_some() {
        let spec: TemplateSpec = serde_json::from_value(value)?;
        return build_template(spec);
    }
    let template: Template = serde_json::from_value(value)?;
    template.validate()?;
    Ok(template)
}

fn write_artifact(outcome: &DispatchOutcome, path: &Path) -> Result<(), EtiquetaError> {
    match &outcome.artifact {
        Some(Artifact::Html(html)) => fs::write(path, html)?,
        Some(Artifact::Pdf(bytes)) | Some(Artifact::Commands(bytes)) => fs::write(path, bytes)?,
        None => return Ok(()),
    }
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn finish(outcome: DispatchOutcome) -> Result<(), EtiquetaError> {
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    match outcome.error {
        Some(error) if !outcome.success => Err(EtiquetaError::RenderTarget(error)),
        _ => Ok(()),
    }
}
