//! XML document tree, its parser and a small path language for navigating it.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::Error;

use self::path::{Node, Terminal, parse_path, select};

mod parse;
mod path;

pub(crate) use self::parse::parse;

const ATTRIBUTE_PREFIX: &str = "@";
const TEXT_KEY: &str = "#text";

/// A parsed XML document. Owns its root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: Element,
}

/// An element of an XML tree.
///
/// `text` is the content before the first child element, `tail` the content following the element's end tag up to
/// the next sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    tail: Option<String>,
    children: Vec<Element>,
}

/// A result of [`XmlDocument::xpath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XPathItem<'a> {
    Element(&'a Element),
    Text(&'a str),
    Attribute(&'a str),
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Evaluates a path query. Paths starting with `/` are evaluated from the document, all others from the root
    /// element. A final `text()` or `@name` step selects text or attribute values.
    pub fn xpath(&self, path: &str) -> Result<Vec<XPathItem<'_>>, Error> {
        let parsed = parse_path(path)?;
        let start = if parsed.absolute {
            Node::Document(&self.root)
        } else {
            Node::Element(&self.root)
        };
        let nodes = select(vec![start], &parsed.steps);
        let elements = nodes.into_iter().filter_map(Node::element);

        Ok(match &parsed.terminal {
            None => elements.map(XPathItem::Element).collect(),
            Some(Terminal::Text) => elements
                .flat_map(|el| {
                    el.text
                        .as_deref()
                        .into_iter()
                        .chain(el.children.iter().filter_map(|c| c.tail.as_deref()))
                })
                .map(XPathItem::Text)
                .collect(),
            Some(Terminal::Attribute(name)) => elements
                .filter_map(|el| el.attribute(name))
                .map(XPathItem::Attribute)
                .collect(),
        })
    }

    /// Recursively converts the tree into nested JSON objects keyed by the root tag.
    ///
    /// Attributes become `@name` keys; text becomes a `#text` key when the element also has attributes or children,
    /// otherwise the element is represented by its text alone. Repeated sibling tags collapse into an array.
    pub fn to_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.root.tag.clone(), element_to_value(&self.root));
        Value::Object(map)
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// All elements below this one in document order, excluding itself.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// First element matching a relative path, see [`Element::findall`].
    pub fn find(&self, path: &str) -> Result<Option<&Element>, Error> {
        Ok(self.findall(path)?.into_iter().next())
    }

    /// All elements matching a path relative to this element.
    ///
    /// Supported steps: tag names, `*`, `.`, `//` for descendants, and the predicates `[@attr]`, `[@attr='v']`,
    /// `[tag]`, `[tag='text']`, `[.='text']`, `[n]` and `[last()]`.
    pub fn findall(&self, path: &str) -> Result<Vec<&Element>, Error> {
        let parsed = parse_path(path)?;
        if parsed.absolute {
            return Err(Error::InvalidArgument(format!(
                "cannot use absolute path {path:?} on an element"
            )));
        }
        if parsed.terminal.is_some() {
            return Err(Error::InvalidArgument(format!(
                "path {path:?} selects values, not elements"
            )));
        }
        let nodes = select(vec![Node::Element(self)], &parsed.steps);
        Ok(nodes.into_iter().filter_map(Node::element).collect())
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_descendants<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &el.children {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn collect_text(el: &Element, out: &mut String) {
    if let Some(text) = &el.text {
        out.push_str(text);
    }
    for child in &el.children {
        collect_text(child, out);
        if let Some(tail) = &child.tail {
            out.push_str(tail);
        }
    }
}

fn element_to_value(el: &Element) -> Value {
    let mut map = Map::new();

    for (name, value) in &el.attributes {
        map.insert(format!("{ATTRIBUTE_PREFIX}{name}"), Value::String(value.clone()));
    }

    for child in &el.children {
        let child_value = element_to_value(child);
        match map.get_mut(&child.tag) {
            Some(Value::Array(siblings)) => siblings.push(child_value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, child_value]);
            }
            None => {
                map.insert(child.tag.clone(), child_value);
            }
        }
    }

    let text = el.text.as_deref().unwrap_or_default().trim();
    if !text.is_empty() {
        if map.is_empty() {
            return Value::String(text.to_string());
        }
        map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
    }

    Value::Object(map)
}
