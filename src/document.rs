//! Editable SVG document tree.
//!
//! `roxmltree` is read-only, so the parsed tree is copied into a small owned
//! structure that can be mutated (fill changes) and written back to markup.
//! Namespace declarations are carried as plain `xmlns` attributes so the
//! serialized text re-parses to the same tree.

use roxmltree::{NodeType, ParsingOptions};

/// Element names that can be colored, matched on the local name.
pub const SHAPE_TAGS: &[&str] = &["path", "circle", "ellipse", "polygon", "rect"];

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

// ============================================================================
// TREE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written (`path`, `sodipodi:namedview`, ...).
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos).value)
    }

    pub fn is_shape(&self) -> bool {
        SHAPE_TAGS.contains(&self.local_name())
    }

    /// Visit this element and every descendant element, depth first.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.walk_mut(f);
            }
        }
    }
}

/// Position of a colorable shape in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub usize);

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum ParseError {
    Xml(roxmltree::Error),
    /// The root element is not `<svg>`; carries the name that was found.
    NotSvg(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Xml(e) => write!(f, "XML error: {}", e),
            ParseError::NotSvg(name) => write!(f, "root element is <{}>, expected <svg>", name),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<roxmltree::Error> for ParseError {
    fn from(e: roxmltree::Error) -> Self {
        ParseError::Xml(e)
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// A loaded vector image.
///
/// The set of shapes is fixed once parsed: only attributes change afterwards,
/// so the child-index paths in `shapes` stay valid for the document's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    root: Element,
    shapes: Vec<Vec<usize>>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(text, options)?;
        let root_node = xml.root_element();
        if root_node.tag_name().name() != "svg" {
            return Err(ParseError::NotSvg(root_node.tag_name().name().to_string()));
        }
        Ok(Self::from_root(convert_element(root_node, None)))
    }

    pub fn from_root(root: Element) -> Self {
        let mut shapes = Vec::new();
        collect_shapes(&root, &mut Vec::new(), &mut shapes);
        Self { root, shapes }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        (0..self.shapes.len()).map(ShapeId)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Element> {
        let path = self.shapes.get(id.0)?;
        element_at(&self.root, path)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Element> {
        let path = self.shapes.get(id.0)?;
        element_at_mut(&mut self.root, path)
    }

    pub fn fill(&self, id: ShapeId) -> Option<&str> {
        self.shape(id)?.attr("fill")
    }

    /// Returns `false` when `id` does not name a shape.
    pub fn set_fill(&mut self, id: ShapeId, color: &str) -> bool {
        match self.shape_mut(id) {
            Some(shape) => {
                shape.set_attr("fill", color);
                true
            }
            None => false,
        }
    }

    /// Serialize to markup (no XML declaration, like `outerHTML`).
    pub fn to_markup(&self) -> String {
        let mut out = String::with_capacity(1024);
        write_element(&self.root, &mut out);
        out
    }
}

fn collect_shapes(el: &Element, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if el.is_shape() {
        out.push(path.clone());
    }
    for (i, child) in el.children.iter().enumerate() {
        if let Node::Element(child_el) = child {
            path.push(i);
            collect_shapes(child_el, path, out);
            path.pop();
        }
    }
}

fn element_at<'a>(root: &'a Element, path: &[usize]) -> Option<&'a Element> {
    let mut current = root;
    for &i in path {
        current = match current.children.get(i) {
            Some(Node::Element(el)) => el,
            _ => return None,
        };
    }
    Some(current)
}

fn element_at_mut<'a>(root: &'a mut Element, path: &[usize]) -> Option<&'a mut Element> {
    let mut current = root;
    for &i in path {
        current = match current.children.get_mut(i) {
            Some(Node::Element(el)) => el,
            _ => return None,
        };
    }
    Some(current)
}

// ============================================================================
// roxmltree -> owned tree
// ============================================================================

fn convert_element(node: roxmltree::Node, parent: Option<roxmltree::Node>) -> Element {
    let mut el = Element::new(element_name(node));

    // Only declarations new at this level; inherited ones stay on the ancestor.
    for ns in node.namespaces() {
        if ns.uri() == XML_NAMESPACE {
            continue;
        }
        let inherited = parent.is_some_and(|p| {
            p.namespaces()
                .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
        });
        if inherited {
            continue;
        }
        let name = match ns.name() {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        el.attributes.push(Attribute {
            name,
            value: ns.uri().to_string(),
        });
    }

    for attr in node.attributes() {
        let name = match attr.namespace() {
            Some(uri) => prefixed_name(node, uri, attr.name()),
            None => attr.name().to_string(),
        };
        el.attributes.push(Attribute {
            name,
            value: attr.value().to_string(),
        });
    }

    for child in node.children() {
        match child.node_type() {
            NodeType::Element => el
                .children
                .push(Node::Element(convert_element(child, Some(node)))),
            NodeType::Text => {
                if let Some(text) = child.text() {
                    el.children.push(Node::Text(text.to_string()));
                }
            }
            NodeType::Comment => {
                if let Some(text) = child.text() {
                    el.children.push(Node::Comment(text.to_string()));
                }
            }
            _ => {}
        }
    }

    el
}

fn element_name(node: roxmltree::Node) -> String {
    let tag = node.tag_name();
    match tag.namespace() {
        None => tag.name().to_string(),
        Some(uri) => {
            let is_default = node
                .namespaces()
                .any(|ns| ns.name().is_none() && ns.uri() == uri);
            if is_default {
                tag.name().to_string()
            } else {
                prefixed_name(node, uri, tag.name())
            }
        }
    }
}

fn prefixed_name(node: roxmltree::Node, uri: &str, local: &str) -> String {
    if uri == XML_NAMESPACE {
        return format!("xml:{}", local);
    }
    let prefix = node
        .namespaces()
        .find_map(|ns| if ns.uri() == uri { ns.name() } else { None });
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

// ============================================================================
// owned tree -> markup
// ============================================================================

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_into(&attr.value, true, out);
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Element(child_el) => write_element(child_el, out),
            Node::Text(text) => escape_into(text, false, out),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn escape_into(text: &str, in_attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="100" height="80">
  <!-- body -->
  <g id="body">
    <rect x="0" y="0" width="10" height="10"/>
    <circle cx="5" cy="5" r="3" fill="none"/>
  </g>
  <line x1="0" y1="0" x2="5" y2="5"/>
  <path d="M0 0 L10 10" fill="#FF0000"/>
  <use xlink:href="#body"/>
  <text x="1" y="2">Fox &amp; friends</text>
</svg>"##;

    #[test]
    fn shapes_are_found_in_document_order() {
        let doc = Document::parse(NESTED).unwrap();
        assert_eq!(doc.shape_count(), 3);
        assert_eq!(doc.shape(ShapeId(0)).unwrap().local_name(), "rect");
        assert_eq!(doc.shape(ShapeId(1)).unwrap().local_name(), "circle");
        assert_eq!(doc.shape(ShapeId(2)).unwrap().local_name(), "path");
        assert!(doc.shape(ShapeId(3)).is_none());
    }

    #[test]
    fn fill_can_be_read_and_written() {
        let mut doc = Document::parse(NESTED).unwrap();
        assert_eq!(doc.fill(ShapeId(0)), None);
        assert_eq!(doc.fill(ShapeId(1)), Some("none"));
        assert!(doc.set_fill(ShapeId(0), "#4ECDC4"));
        assert_eq!(doc.fill(ShapeId(0)), Some("#4ECDC4"));
        assert!(!doc.set_fill(ShapeId(9), "#4ECDC4"));
    }

    #[test]
    fn markup_reparses_to_the_same_tree() {
        let mut doc = Document::parse(NESTED).unwrap();
        doc.set_fill(ShapeId(2), "#00FF00");
        let markup = doc.to_markup();
        let again = Document::parse(&markup).unwrap();
        assert_eq!(doc, again);
        assert!(markup.contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""));
        assert!(markup.contains("xlink:href=\"#body\""));
        assert!(markup.contains("Fox &amp; friends"));
        assert!(markup.contains("<!-- body -->"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut root = Element::new("svg");
        root.set_attr("data-note", "a \"b\" <c> & d");
        let doc = Document::from_root(root);
        assert_eq!(
            doc.to_markup(),
            "<svg data-note=\"a &quot;b&quot; &lt;c&gt; &amp; d\"/>"
        );
    }

    #[test]
    fn doctype_is_accepted() {
        let text = r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg>"#;
        let doc = Document::parse(text).unwrap();
        assert_eq!(doc.shape_count(), 1);
    }

    #[test]
    fn non_svg_root_is_rejected() {
        match Document::parse("<html><body/></html>") {
            Err(ParseError::NotSvg(name)) => assert_eq!(name, "html"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(Document::parse("<svg"), Err(ParseError::Xml(_))));
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut el = Element::new("rect");
        el.set_attr("fill", "red");
        el.set_attr("stroke", "black");
        el.set_attr("fill", "blue");
        assert_eq!(el.attributes.len(), 2);
        assert_eq!(el.attributes[0].value, "blue");
        assert_eq!(el.remove_attr("stroke").as_deref(), Some("black"));
        assert_eq!(el.remove_attr("stroke"), None);
    }
}
