//! # Markup Renderer
//!
//! Turns bound labels into a printable HTML document.
//!
//! ## Document layout
//!
//! ```text
//! <!DOCTYPE html>
//! <html>
//!   <head> <meta charset> <title> <style>stylesheet(template)</style> </head>
//!   <body>
//!     <div class="label">   one block per copy (per record, per copy)
//!       <div class="el el-0">...</div>   absolutely positioned in template px
//!       ...
//!     </div>
//!   </body>
//! </html>
//! ```
//!
//! Barcodes and QR codes are inlined as base64 PNG data URIs. All record data
//! flows through [`node`], which escapes by position.
//!
//! ```
//! use etiqueta::binder::{bind, DataRecord};
//! use etiqueta::markup;
//! use etiqueta::symbology::DirectEncoder;
//! use etiqueta::template::{Element, Template, TemplateType};
//!
//! let template = Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
//!     .element(Element::field_text("item_code", 10.0, 10.0, 80.0, 20.0));
//! let record = DataRecord::new().with("item_code", "<SKU>");
//!
//! let doc = markup::render(&bind(&template, &record), 2, &DirectEncoder);
//! assert_eq!(doc.label_count, 2);
//! assert!(doc.html.contains("&lt;SKU&gt;"));
//! ```

pub mod node;
pub mod style;

pub use node::{Node, Tag};
pub use style::{Rule, Stylesheet, element_class, stylesheet};

use tracing::debug;

use crate::binder::{BoundElement, BoundLabel, Content};
use crate::symbology::BarcodeEncoder;
use crate::template::{BarcodeSize, Template};

/// Document title.
pub const TITLE: &str = "Label Print";

/// URL schemes an image element may load from.
const ALLOWED_IMAGE_PREFIXES: &[&str] = &["data:image/", "https://", "http://", "/"];

/// Rendered HTML and what happened while rendering it.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlDocument {
    pub html: String,
    /// Number of `.label` blocks.
    pub label_count: usize,
    /// Indices of elements whose symbol fell back to a placeholder.
    pub degraded: Vec<usize>,
}

/// Render `copies` label blocks for one bound label. `copies` below 1 is
/// treated as 1.
pub fn render(label: &BoundLabel<'_>, copies: u32, encoder: &dyn BarcodeEncoder) -> HtmlDocument {
    render_many(label.template, std::slice::from_ref(label), copies, encoder)
}

/// Render `copies` blocks for each bound label, in order, into one document.
///
/// Every label must be bound from `template`.
pub fn render_many(
    template: &Template,
    labels: &[BoundLabel<'_>],
    copies: u32,
    encoder: &dyn BarcodeEncoder,
) -> HtmlDocument {
    let copies = copies.max(1);
    let mut degraded = Vec::new();
    let mut blocks = Vec::with_capacity(labels.len() * copies as usize);

    for label in labels {
        for _ in 0..copies {
            // Each copy is rendered from scratch
            let block = Tag::new("div").class("label").children(
                label
                    .elements
                    .iter()
                    .map(|bound| render_element(bound, template.default_barcode_size, encoder, &mut degraded)),
            );
            blocks.push(Node::from(block));
        }
    }

    degraded.sort_unstable();
    degraded.dedup();

    let label_count = blocks.len();
    let root = Tag::new("html")
        .child(
            Tag::new("head")
                .child(Tag::new("meta").attr("charset", "utf-8"))
                .child(Tag::new("title").text(TITLE))
                .child(Tag::new("style").child(Node::Css(stylesheet(template).to_css()))),
        )
        .child(Tag::new("body").children(blocks));

    debug!(template = %template.id, labels = label_count, "markup rendered");
    HtmlDocument {
        html: node::document(&root),
        label_count,
        degraded,
    }
}

fn render_element(
    bound: &BoundElement<'_>,
    default_size: BarcodeSize,
    encoder: &dyn BarcodeEncoder,
    degraded: &mut Vec<usize>,
) -> Node {
    let element = bound.element;
    let tag = Tag::new("div")
        .class(format!("el {}", element_class(bound.index)))
        .attr("data-kind", element.kind.name());

    let tag = match &bound.content {
        Content::Text(text) => tag.children(Node::multiline(text)),
        Content::Code { value, symbology } => {
            let width = raster_dimension(element.width, default_size.width);
            let height = raster_dimension(element.height, default_size.height);
            match encoder.encode(value, symbology, width, height) {
                None => tag,
                Some(result) => {
                    let mut img = Tag::new("img")
                        .attr("src", result.image().to_data_uri())
                        .attr("alt", value.clone());
                    if result.is_degraded() {
                        degraded.push(bound.index);
                        img = img.attr("data-degraded", "true");
                    }
                    tag.child(img)
                }
            }
        }
        Content::Table(rows) => tag.child(Tag::new("table").children(rows.iter().map(|row| {
            Tag::new("tr")
                .children(row.iter().map(|cell| Tag::new("td").children(Node::multiline(cell)).into()))
                .into()
        }))),
        Content::Image { src, alt } => {
            if ALLOWED_IMAGE_PREFIXES.iter().any(|p| src.starts_with(p)) {
                tag.child(Tag::new("img").attr("src", src.clone()).attr("alt", alt.clone()))
            } else {
                tag.child(Tag::new("span").class("image-placeholder").text(alt.clone()))
            }
        }
        Content::Graphic => tag,
    };
    tag.into()
}

/// Template px to raster px; unsized elements use the template default.
fn raster_dimension(px: f32, fallback: u32) -> u32 {
    if px >= 1.0 { px.round() as u32 } else { fallback }
}
