//! Structured HTML building.
//!
//! Markup is assembled as a tree and serialized in one place, so escaping is
//! decided by position (text, attribute value, stylesheet) instead of at every
//! call site. Tag and attribute names are `&'static str`: only values can
//! carry record data.

use std::fmt::Write;

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "link", "meta"];

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Tag),
    Text(String),
    /// Stylesheet body inside `<style>`.
    Css(String),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Text with each newline turned into a `<br>`.
    pub fn multiline(s: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (i, line) in s.split('\n').enumerate() {
            if i > 0 {
                nodes.push(Tag::new("br").into());
            }
            if !line.is_empty() {
                nodes.push(Node::text(line.trim_end_matches('\r')));
            }
        }
        nodes
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(tag) => tag.write_to(out),
            Node::Text(s) => escape_text(s, out),
            Node::Css(css) => escape_css(css, out),
        }
    }
}

impl From<Tag> for Node {
    fn from(tag: Tag) -> Self {
        Node::Element(tag)
    }
}

/// An element with attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Tag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, s: impl Into<String>) -> Self {
        self.child(Node::Text(s.into()))
    }

    /// Serialize this element and its subtree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }
        out.push('>');

        if VOID_TAGS.contains(&self.name) {
            return;
        }
        for child in &self.children {
            child.write_to(out);
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// `<` is the only character that can end a raw-text `<style>` block.
fn escape_css(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("\\3C "),
            _ => out.push(c),
        }
    }
}

/// `<!DOCTYPE html>` followed by the serialized root.
pub fn document(root: &Tag) -> String {
    let mut out = String::from("<!DOCTYPE html>\n");
    root.write_to(&mut out);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let html = Tag::new("div").text("<script>alert(1)</script> & co").render();
        assert_eq!(html, "<div>&lt;script&gt;alert(1)&lt;/script&gt; &amp; co</div>");
    }

    #[test]
    fn test_attribute_is_escaped() {
        let html = Tag::new("img").attr("alt", "\" onerror=\"x").render();
        assert_eq!(html, "<img alt=\"&quot; onerror=&quot;x\">");
    }

    #[test]
    fn test_void_tags_have_no_close() {
        assert_eq!(Tag::new("br").render(), "<br>");
        assert_eq!(Tag::new("td").render(), "<td></td>");
    }

    #[test]
    fn test_multiline() {
        let html = Tag::new("div").children(Node::multiline("a\nb")).render();
        assert_eq!(html, "<div>a<br>b</div>");
    }

    #[test]
    fn test_css_cannot_close_style() {
        let html = Tag::new("style").child(Node::Css("a{}</style><script>".into())).render();
        assert!(!html.contains("</style><script>"));
    }
}
