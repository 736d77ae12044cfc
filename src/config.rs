//! Construction-time options and extension hooks

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::document::Scope;
use crate::schema::FieldMapping;
use crate::select::filters::Filters;
use crate::select::parser::{ParsedSelector, Syntax};

/// What a hook wants the interpreter to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Intercept<T> {
    /// Use this value (or absence) and skip normal resolution.
    Resolved(Option<Value>),
    /// Continue with a rewritten selector or schema.
    Rewrite(T),
    /// Continue unchanged.
    Pass,
}

/// Runs before a selector string is resolved to a single value.
pub trait SelectorHook: Send + Sync {
    fn intercept(
        &self,
        scope: &Scope<'_>,
        selector: &ParsedSelector,
        config: &Config,
    ) -> Intercept<ParsedSelector>;
}

/// Runs before a field mapping is resolved.
pub trait ObjectHook: Send + Sync {
    fn intercept(
        &self,
        scope: &Scope<'_>,
        mapping: &FieldMapping,
        config: &Config,
    ) -> Intercept<FieldMapping>;
}

/// Hook that always passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl SelectorHook for NoHook {
    fn intercept(&self, _: &Scope<'_>, _: &ParsedSelector, _: &Config) -> Intercept<ParsedSelector> {
        Intercept::Pass
    }
}

impl ObjectHook for NoHook {
    fn intercept(&self, _: &Scope<'_>, _: &FieldMapping, _: &Config) -> Intercept<FieldMapping> {
        Intercept::Pass
    }
}

impl<F> SelectorHook for F
where
    F: Fn(&Scope<'_>, &ParsedSelector, &Config) -> Intercept<ParsedSelector> + Send + Sync,
{
    fn intercept(
        &self,
        scope: &Scope<'_>,
        selector: &ParsedSelector,
        config: &Config,
    ) -> Intercept<ParsedSelector> {
        self(scope, selector, config)
    }
}

impl<F> ObjectHook for F
where
    F: Fn(&Scope<'_>, &FieldMapping, &Config) -> Intercept<FieldMapping> + Send + Sync,
{
    fn intercept(
        &self,
        scope: &Scope<'_>,
        mapping: &FieldMapping,
        config: &Config,
    ) -> Intercept<FieldMapping> {
        self(scope, mapping, config)
    }
}

/// Options shared by every resolution of one [`crate::Xray`].
#[derive(Clone)]
pub struct Config {
    pub filters: Filters,
    pub syntax: Syntax,
    pub selector_hook: Arc<dyn SelectorHook>,
    pub object_hook: Arc<dyn ObjectHook>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filters: Filters::new(),
            syntax: Syntax::default(),
            selector_hook: Arc::new(NoHook),
            object_hook: Arc::new(NoHook),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_selector_hook(mut self, hook: impl SelectorHook + 'static) -> Self {
        self.selector_hook = Arc::new(hook);
        self
    }

    pub fn with_object_hook(mut self, hook: impl ObjectHook + 'static) -> Self {
        self.object_hook = Arc::new(hook);
        self
    }

    /// Parse a field expression with this syntax and filter registry.
    pub fn parse(&self, expr: &str) -> ParsedSelector {
        self.syntax.parse(expr, &self.filters)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("filters", &self.filters)
            .field("syntax", &self.syntax)
            .finish_non_exhaustive()
    }
}
