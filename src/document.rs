//! Document loading and query scopes
//!
//! Wraps the `scraper` tree with the handful of capabilities the interpreter
//! needs: load markup, find descendants by CSS selector, and read text,
//! inner markup, attributes or intrinsic node properties.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

/// Anything that can become a parsed document.
///
/// Passing an already-parsed [`Html`] is accepted as is, so loading is
/// idempotent.
pub trait IntoDocument {
    fn into_document(self) -> Html;
}

impl IntoDocument for Html {
    fn into_document(self) -> Html {
        self
    }
}

impl IntoDocument for &Html {
    fn into_document(self) -> Html {
        self.clone()
    }
}

impl IntoDocument for &str {
    fn into_document(self) -> Html {
        Html::parse_document(self)
    }
}

impl IntoDocument for String {
    fn into_document(self) -> Html {
        Html::parse_document(&self)
    }
}

impl IntoDocument for &String {
    fn into_document(self) -> Html {
        Html::parse_document(self)
    }
}

/// Compile a CSS selector, logging and returning `None` when it is invalid.
///
/// An invalid selector behaves like one that matches nothing.
pub fn compile_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::warn!("Failed to parse CSS selector '{}': {}. Treating as no match.", css, e);
            None
        }
    }
}

/// A node a query can start from: the document itself or one element.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

impl<'a> Node<'a> {
    /// Descendant elements matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        match self {
            Node::Document(doc) => doc.select(selector).collect(),
            Node::Element(el) => el.select(selector).collect(),
        }
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'a>> {
        match self {
            Node::Document(doc) => doc.select(selector).next(),
            Node::Element(el) => el.select(selector).next(),
        }
    }

    /// Concatenated text of all descendant text nodes, untrimmed.
    pub fn text(&self) -> String {
        match self {
            Node::Document(doc) => doc.root_element().text().collect(),
            Node::Element(el) => el.text().collect(),
        }
    }

    /// Serialized markup of the children.
    pub fn inner_html(&self) -> String {
        match self {
            Node::Document(doc) => doc.root_element().html(),
            Node::Element(el) => el.inner_html(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self {
            Node::Document(_) => None,
            Node::Element(el) => el.value().attr(name),
        }
    }

    /// Lower-case tag name; the document node reports `root`.
    pub fn tag_name(&self) -> &'a str {
        match self {
            Node::Document(_) => "root",
            Node::Element(el) => el.value().name(),
        }
    }

    pub fn node_type(&self) -> u8 {
        match self {
            Node::Document(_) => 9,
            Node::Element(_) => 1,
        }
    }

    /// Raw node property for intrinsic names, `None` for anything else.
    pub fn intrinsic(&self, name: &str) -> Option<Value> {
        match name {
            "tagName" | "nodeName" | "localName" => {
                Some(Value::String(self.tag_name().to_string()))
            }
            "nodeType" => Some(Value::from(self.node_type())),
            _ => None,
        }
    }
}

/// Names read from the node itself rather than from its attributes.
pub fn is_intrinsic(name: &str) -> bool {
    matches!(name, "tagName" | "nodeName" | "localName" | "nodeType")
}

impl<'a> From<ElementRef<'a>> for Node<'a> {
    fn from(el: ElementRef<'a>) -> Self {
        Node::Element(el)
    }
}

/// Ordered set of nodes bounding the next query.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> Scope<'a> {
    pub fn document(doc: &'a Html) -> Self {
        Self {
            nodes: vec![Node::Document(doc)],
        }
    }

    pub fn element(el: ElementRef<'a>) -> Self {
        Self {
            nodes: vec![Node::Element(el)],
        }
    }

    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Scope<'a> {
        Self {
            nodes: self.nodes.first().copied().into_iter().collect(),
        }
    }

    /// All descendants of every node in scope matching `selector`.
    ///
    /// Elements reachable from more than one scope node appear once.
    pub fn find(&self, selector: &Selector) -> Scope<'a> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for node in &self.nodes {
            for el in node.select(selector) {
                if seen.insert(el.id()) {
                    nodes.push(Node::Element(el));
                }
            }
        }
        Self { nodes }
    }

    /// Like [`Scope::find`] but compiles `css` first; invalid CSS yields an
    /// empty scope.
    pub fn find_css(&self, css: &str) -> Scope<'a> {
        match compile_selector(css) {
            Some(selector) => self.find(&selector),
            None => Scope::empty(),
        }
    }
}

impl<'a> FromIterator<Node<'a>> for Scope<'a> {
    fn from_iter<I: IntoIterator<Item = Node<'a>>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> From<ElementRef<'a>> for Scope<'a> {
    fn from(el: ElementRef<'a>) -> Self {
        Scope::element(el)
    }
}
