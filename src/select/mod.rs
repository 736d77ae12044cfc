//! Schema interpreter
//!
//! Walks a [`Schema`] and the document together and produces a value of the
//! same shape. Absence is `None` throughout: a field that resolves to `None`
//! is left out of its object, an element that renders to `None` is left out
//! of its array, and neither stops sibling fields from resolving.

pub mod filters;
pub mod parser;
pub mod render;
pub mod zip;


pub use filters::*;
pub use parser::*;
pub use render::*;
pub use zip::*;

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use crate::config::{Config, Intercept};
use crate::document::{compile_selector, IntoDocument, Node, Scope};
use crate::error::Error;
use crate::schema::{FieldMapping, Schema};

/// A loaded document plus the options used to query it.
#[derive(Debug)]
pub struct Xray {
    document: Html,
    config: Config,
}

impl Xray {
    pub fn new(document: impl IntoDocument) -> Self {
        Self::with_config(document, Config::default())
    }

    pub fn with_filters(document: impl IntoDocument, filters: Filters) -> Self {
        Self::with_config(document, Config::default().with_filters(filters))
    }

    pub fn with_config(document: impl IntoDocument, config: Config) -> Self {
        Self {
            document: document.into_document(),
            config,
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scope covering the whole document.
    pub fn root(&self) -> Scope<'_> {
        Scope::document(&self.document)
    }

    pub fn scope_of<'a>(&'a self, element: ElementRef<'a>) -> Scope<'a> {
        Scope::element(element)
    }

    /// Resolve `schema` against the whole document.
    pub fn select(&self, schema: &Schema) -> Option<Value> {
        self.select_in(schema, &self.root())
    }

    /// Resolve `schema` against an explicit scope.
    pub fn select_in(&self, schema: &Schema, scope: &Scope<'_>) -> Option<Value> {
        Resolver::new(&self.config).resolve(schema, scope)
    }

    /// Resolve a schema given as plain JSON data.
    pub fn select_value(&self, schema: &Value) -> Result<Option<Value>, Error> {
        let schema = Schema::from_value(schema)?;
        Ok(self.select(&schema))
    }
}

/// The recursive interpreter. Holds nothing but the configuration, so one
/// resolver can serve any number of scopes.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'c> {
    config: &'c Config,
}

impl<'c> Resolver<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Resolve a schema node in singular context.
    pub fn resolve(&self, schema: &Schema, scope: &Scope<'_>) -> Option<Value> {
        match schema {
            Schema::Selector(expr) => self.resolve_selector(expr, scope),
            Schema::Fields(mapping) => self.resolve_fields(mapping, scope),
            Schema::Collection(inner) => Some(Value::Array(self.resolve_collection(inner, scope))),
        }
    }

    /// First match of `expr` in scope, rendered.
    fn resolve_selector(&self, expr: &str, scope: &Scope<'_>) -> Option<Value> {
        let parsed = self.config.parse(expr);
        let parsed = match self.config.selector_hook.intercept(scope, &parsed, self.config) {
            Intercept::Resolved(value) => return value,
            Intercept::Rewrite(rewritten) => rewritten,
            Intercept::Pass => parsed,
        };

        let node = first_match(scope, parsed.selector.as_deref())?;
        render(&node, &parsed)
    }

    /// Every match of `expr` in scope, rendered, keeping positions of
    /// elements that rendered nothing.
    fn resolve_selector_all(&self, expr: &str, scope: &Scope<'_>) -> Vec<Option<Value>> {
        let parsed = self.config.parse(expr);
        let matches = match parsed.selector.as_deref() {
            None => scope.clone(),
            Some(css) => scope.find_css(css),
        };
        matches
            .nodes()
            .iter()
            .map(|node| render(node, &parsed))
            .collect()
    }

    /// Object of the fields that resolved. `$root` narrows the scope to its
    /// first match; no match leaves an empty scope and every field absent.
    fn resolve_fields(&self, mapping: &FieldMapping, scope: &Scope<'_>) -> Option<Value> {
        let rewritten;
        let mapping = match self.config.object_hook.intercept(scope, mapping, self.config) {
            Intercept::Resolved(value) => return value,
            Intercept::Rewrite(m) => {
                rewritten = m;
                &rewritten
            }
            Intercept::Pass => mapping,
        };

        let narrowed;
        let scope = match mapping.root.as_deref() {
            Some(css) => {
                narrowed = scope.find_css(css).first();
                if narrowed.is_empty() {
                    log::debug!("$root '{}' matched nothing", css);
                }
                &narrowed
            }
            None => scope,
        };

        let mut out = Map::new();
        for (key, schema) in &mapping.fields {
            if let Some(value) = self.resolve(schema, scope) {
                out.insert(key.clone(), value);
            }
        }
        Some(Value::Object(out))
    }

    /// Array schema: one result per matching element.
    fn resolve_collection(&self, inner: &Schema, scope: &Scope<'_>) -> Vec<Value> {
        match inner {
            Schema::Fields(mapping) if mapping.root.is_none() => {
                let columns = mapping
                    .fields
                    .iter()
                    .map(|(key, schema)| (key.clone(), self.resolve_plural(schema, scope)))
                    .collect();
                zip_fields_to_records(columns)
                    .into_iter()
                    .map(Value::Object)
                    .collect()
            }
            Schema::Collection(nested) => {
                vec![Value::Array(self.resolve_collection(nested, scope))]
            }
            _ => self.resolve_plural(inner, scope).into_iter().flatten().collect(),
        }
    }

    /// Resolve a schema once per element it applies to.
    ///
    /// Selectors yield one entry per match. A rooted mapping yields one
    /// object per `$root` match, with empty objects turned into absence.
    /// A rootless mapping yields a single entry and a nested array none.
    fn resolve_plural(&self, schema: &Schema, scope: &Scope<'_>) -> Vec<Option<Value>> {
        match schema {
            Schema::Selector(expr) => self.resolve_selector_all(expr, scope),
            Schema::Fields(mapping) => match mapping.root.as_deref() {
                Some(css) => {
                    let unrooted = mapping.without_root();
                    scope
                        .find_css(css)
                        .nodes()
                        .iter()
                        .map(|node| {
                            let element_scope: Scope = std::iter::once(*node).collect();
                            self.resolve_fields(&unrooted, &element_scope)
                                .filter(|v| !is_empty_record(v))
                        })
                        .collect()
                }
                None => vec![self.resolve_fields(mapping, scope).filter(|v| !is_empty_record(v))],
            },
            // arrays have no per-record position, so the field stays out of every record
            Schema::Collection(_) => Vec::new(),
        }
    }
}

/// First element in scope matching `css`, or the first scope node itself
/// when there is no selector.
fn first_match<'a>(scope: &Scope<'a>, css: Option<&str>) -> Option<Node<'a>> {
    let Some(css) = css else {
        return scope.nodes().first().copied();
    };
    let selector = compile_selector(css)?;
    scope
        .nodes()
        .iter()
        .find_map(|node| node.select_first(&selector))
        .map(Node::Element)
}

fn is_empty_record(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}
