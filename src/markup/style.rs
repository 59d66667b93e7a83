//! Label stylesheet generation.
//!
//! The stylesheet is a pure function of the template: label size plus each
//! element's geometry and style. Bound data never reaches it.

use std::fmt::Write;

use crate::template::{ElementKind, FontWeight, Template, TextAlign, is_valid_color};

/// A selector and its declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub declarations: Vec<(&'static str, String)>,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Vec::new(),
        }
    }

    pub fn set(mut self, property: &'static str, value: impl Into<String>) -> Self {
        self.declarations.push((property, value.into()));
        self
    }

    fn write_to(&self, out: &mut String, indent: &str) {
        let _ = writeln!(out, "{}{} {{", indent, self.selector);
        for (property, value) in &self.declarations {
            let _ = writeln!(out, "{}  {}: {};", indent, property, value);
        }
        let _ = writeln!(out, "{}}}", indent);
    }
}

/// Top-level stylesheet entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Rule(Rule),
    /// `@page { ... }`: declarations only.
    Page(Vec<(&'static str, String)>),
    /// `@media <query> { rules }`.
    Media { query: String, rules: Vec<Rule> },
}

/// Ordered stylesheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub blocks: Vec<Block>,
}

impl Stylesheet {
    pub fn rule(&mut self, rule: Rule) {
        self.blocks.push(Block::Rule(rule));
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Rule(rule) => rule.write_to(&mut out, ""),
                Block::Page(declarations) => {
                    out.push_str("@page {\n");
                    for (property, value) in declarations {
                        let _ = writeln!(out, "  {}: {};", property, value);
                    }
                    out.push_str("}\n");
                }
                Block::Media { query, rules } => {
                    let _ = writeln!(out, "@media {} {{", query);
                    for rule in rules {
                        rule.write_to(&mut out, "  ");
                    }
                    out.push_str("}\n");
                }
            }
        }
        out
    }
}

/// Format a length, dropping a trailing `.0`.
fn len(value: f32, unit: &str) -> String {
    let rounded = (value as f64 * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as i64, unit)
    } else {
        format!("{}{}", rounded, unit)
    }
}

fn color(value: &str) -> &str {
    if is_valid_color(value) { value } else { "#000000" }
}

/// CSS class of the element at `index`.
pub fn element_class(index: usize) -> String {
    format!("el-{}", index)
}

/// Stylesheet for every label of `template`.
pub fn stylesheet(template: &Template) -> Stylesheet {
    let width = len(template.label_width_mm, "mm");
    let height = len(template.label_height_mm, "mm");
    let mut sheet = Stylesheet::default();

    sheet.blocks.push(Block::Page(vec![
        ("size", format!("{} {}", width, height)),
        ("margin", "0".into()),
    ]));
    sheet.rule(
        Rule::new("body")
            .set("margin", "0")
            .set("padding", "0")
            .set("font-family", "Arial, Helvetica, sans-serif"),
    );
    sheet.rule(
        Rule::new(".label")
            .set("position", "relative")
            .set("box-sizing", "border-box")
            .set("width", width)
            .set("height", height)
            .set("overflow", "hidden")
            .set("background", "#ffffff")
            .set("page-break-after", "always"),
    );
    sheet.rule(Rule::new(".label:last-child").set("page-break-after", "auto"));
    sheet.rule(
        Rule::new(".label .el")
            .set("position", "absolute")
            .set("box-sizing", "border-box")
            .set("overflow", "hidden")
            .set("line-height", "1.2"),
    );
    sheet.rule(
        Rule::new(".label img")
            .set("display", "block")
            .set("width", "100%")
            .set("height", "100%")
            .set("object-fit", "contain"),
    );
    sheet.rule(
        Rule::new(".label table")
            .set("width", "100%")
            .set("height", "100%")
            .set("border-collapse", "collapse")
            .set("table-layout", "fixed"),
    );
    sheet.rule(
        Rule::new(".label td")
            .set("border", "1px solid #000000")
            .set("padding", "1px 2px")
            .set("overflow", "hidden"),
    );

    for (i, element) in template.elements.iter().enumerate() {
        let style = &element.style;
        let mut rule = Rule::new(format!(".{}", element_class(i)))
            .set("left", len(element.x, "px"))
            .set("top", len(element.y, "px"))
            .set("width", len(element.width, "px"))
            .set("height", len(element.height, "px"))
            .set("z-index", element.z_order.to_string())
            .set("font-size", len(style.font_size, "px"))
            .set(
                "font-weight",
                match style.font_weight {
                    FontWeight::Normal => "normal",
                    FontWeight::Bold => "bold",
                },
            )
            .set("color", color(&style.color))
            .set(
                "text-align",
                match style.text_align {
                    TextAlign::Left => "left",
                    TextAlign::Center => "center",
                    TextAlign::Right => "right",
                },
            );

        match &element.kind {
            ElementKind::Line { thickness } => {
                rule = rule.set(
                    "border-top",
                    format!("{}px solid {}", thickness, color(&style.color)),
                );
            }
            ElementKind::Box { thickness } => {
                rule = rule.set(
                    "border",
                    format!("{}px solid {}", thickness, color(&style.color)),
                );
            }
            ElementKind::StaticText { .. }
            | ElementKind::FieldText { .. }
            | ElementKind::Barcode { .. }
            | ElementKind::Qr { .. }
            | ElementKind::Table(_)
            | ElementKind::Image { .. } => {}
        }
        sheet.rule(rule);
    }

    sheet.blocks.push(Block::Media {
        query: "screen".into(),
        rules: vec![
            Rule::new("body").set("background", "#f0f0f0"),
            Rule::new(".label")
                .set("margin", "8px")
                .set("outline", "1px dashed #999999"),
        ],
    });

    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Element, Style, TemplateType};

    fn template() -> Template {
        Template::new("Shelf", TemplateType::Item, 50.0, 30.0)
            .element(Element::field_text("item_code", 10.0, 10.5, 80.0, 20.0))
            .element(Element::new(ElementKind::Box { thickness: 3 }, 0.0, 0.0, 100.0, 50.0))
    }

    #[test]
    fn test_page_and_label_size() {
        let css = stylesheet(&template()).to_css();
        assert!(css.contains("@page {\n  size: 50mm 30mm;"));
        assert!(css.contains("width: 50mm;"));
        assert!(css.contains("height: 30mm;"));
    }

    #[test]
    fn test_element_geometry() {
        let css = stylesheet(&template()).to_css();
        assert!(css.contains(".el-0 {\n  left: 10px;\n  top: 10.5px;"));
        assert!(css.contains("border: 3px solid #000000;"));
    }

    #[test]
    fn test_css_is_pure() {
        let a = stylesheet(&template()).to_css();
        let b = stylesheet(&template()).to_css();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_color_replaced() {
        let t = Template::new("X", TemplateType::Item, 50.0, 30.0).element(
            Element::static_text("x", 0.0, 0.0, 10.0, 10.0).with_style(Style {
                color: "red;}body{display:none".into(),
                ..Style::default()
            }),
        );
        let css = stylesheet(&t).to_css();
        assert!(!css.contains("display:none"));
        assert!(css.contains("color: #000000;"));
    }
}
