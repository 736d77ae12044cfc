//! Filter registry and pipeline
//!
//! Filters are named value transforms applied after an element is rendered,
//! e.g. `a[href] | trim | split:/`. Names missing from the registry are
//! dropped from the pipeline instead of failing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::parser::Invocation;

/// A value transform. `None` is absence (e.g. a missing attribute); filters
/// still run on it and may turn it into a value or keep it absent.
pub trait Filter: Send + Sync {
    fn apply(&self, value: Option<Value>, args: &[String]) -> Option<Value>;
}

impl<F> Filter for F
where
    F: Fn(Option<Value>, &[String]) -> Option<Value> + Send + Sync,
{
    fn apply(&self, value: Option<Value>, args: &[String]) -> Option<Value> {
        self(value, args)
    }
}

/// Wraps a string-in filter: absence passes through untouched, non-string
/// values are handed over as their JSON text.
struct TextFilter<F>(F);

impl<F> Filter for TextFilter<F>
where
    F: Fn(&str, &[String]) -> Value + Send + Sync,
{
    fn apply(&self, value: Option<Value>, args: &[String]) -> Option<Value> {
        match value? {
            Value::String(s) => Some((self.0)(&s, args)),
            other => Some((self.0)(&other.to_string(), args)),
        }
    }
}

/// Caller-supplied mapping from filter name to function.
#[derive(Clone, Default)]
pub struct Filters {
    registry: HashMap<String, Arc<dyn Filter>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `trim`, `lowercase`, `uppercase`, `split:<sep>`, `replace:<from>:<to>`
    /// and `number`.
    pub fn standard() -> Self {
        Self::new()
            .with_text("trim", |s, _| Value::String(s.trim().to_string()))
            .with_text("lowercase", |s, _| Value::String(s.to_lowercase()))
            .with_text("uppercase", |s, _| Value::String(s.to_uppercase()))
            .with_text("split", |s, args| {
                let parts: Vec<Value> = match args.first() {
                    Some(sep) if !sep.is_empty() => {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                    _ => s.split_whitespace().map(Value::from).collect(),
                };
                Value::Array(parts)
            })
            .with_text("replace", |s, args| match (args.first(), args.get(1)) {
                (Some(from), to) if !from.is_empty() => {
                    Value::String(s.replace(from.as_str(), to.map(String::as_str).unwrap_or("")))
                }
                _ => Value::String(s.to_string()),
            })
            .with("number", parse_number)
    }

    pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) -> &mut Self {
        self.registry.insert(name.into(), Arc::new(filter));
        self
    }

    /// Register a filter that works on strings.
    pub fn register_text<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&str, &[String]) -> Value + Send + Sync + 'static,
    {
        self.register(name, TextFilter(filter))
    }

    pub fn with(mut self, name: impl Into<String>, filter: impl Filter + 'static) -> Self {
        self.register(name, filter);
        self
    }

    pub fn with_text<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&str, &[String]) -> Value + Send + Sync + 'static,
    {
        self.register_text(name, filter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.registry.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Bind invocations to registered filters, dropping unknown names.
    pub fn resolve(&self, invocations: Vec<Invocation>) -> FilterPipeline {
        let calls = invocations
            .into_iter()
            .filter_map(|invocation| match self.get(&invocation.name) {
                Some(filter) => Some(FilterCall {
                    name: invocation.name,
                    args: invocation.args,
                    filter,
                }),
                None => {
                    log::debug!("Dropping unknown filter '{}'", invocation.name);
                    None
                }
            })
            .collect();
        FilterPipeline { calls }
    }
}

impl fmt::Debug for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.registry.keys().collect();
        names.sort();
        f.debug_struct("Filters").field("names", &names).finish()
    }
}

fn parse_number(value: Option<Value>, _args: &[String]) -> Option<Value> {
    match value? {
        Value::Number(n) => Some(Value::Number(n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

/// One resolved stage of a pipeline.
#[derive(Clone)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<String>,
    pub filter: Arc<dyn Filter>,
}

impl fmt::Debug for FilterCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// Filters applied left to right, each receiving the previous output.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    calls: Vec<FilterCall>,
}

impl FilterPipeline {
    pub fn calls(&self) -> &[FilterCall] {
        &self.calls
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn apply(&self, value: Option<Value>) -> Option<Value> {
        self.calls
            .iter()
            .fold(value, |acc, call| call.filter.apply(acc, &call.args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoke(name: &str, args: &[&str]) -> Invocation {
        Invocation {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_pipeline_folds_left_to_right() {
        let filters = Filters::standard();
        let pipeline = filters.resolve(vec![
            invoke("trim", &[]),
            invoke("uppercase", &[]),
            invoke("split", &["/"]),
        ]);
        assert_eq!(
            pipeline.apply(Some(json!("  mat.io/rss "))),
            Some(json!(["MAT.IO", "RSS"]))
        );
    }

    #[test]
    fn test_unknown_filters_are_dropped() {
        let filters = Filters::standard();
        let pipeline = filters.resolve(vec![invoke("nope", &[]), invoke("lowercase", &[])]);
        let names: Vec<&str> = pipeline.calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["lowercase"]);
        assert_eq!(pipeline.apply(Some(json!("ABC"))), Some(json!("abc")));
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = FilterPipeline::default();
        assert!(pipeline.is_empty());
        assert!(Filters::standard().resolve(vec![invoke("nope", &[])]).is_empty());
        assert_eq!(pipeline.apply(Some(json!("x"))), Some(json!("x")));
        assert_eq!(pipeline.apply(None), None);
    }

    #[test]
    fn test_filters_see_absence() {
        let filters = Filters::new().with("default", |v: Option<Value>, args: &[String]| {
            v.or_else(|| args.first().map(|a| Value::String(a.clone())))
        });
        let pipeline = filters.resolve(vec![invoke("default", &["none"])]);
        assert_eq!(pipeline.apply(None), Some(json!("none")));

        let text = Filters::standard().resolve(vec![invoke("uppercase", &[])]);
        assert_eq!(text.apply(None), None);
    }

    #[test]
    fn test_filters_may_change_type() {
        let filters = Filters::standard().with_text("https", |s, _| Value::Bool(s.starts_with("https://")));
        let pipeline = filters.resolve(vec![invoke("https", &[]), invoke("uppercase", &[])]);
        // uppercase receives the boolean as JSON text
        assert_eq!(pipeline.apply(Some(json!("http://mat.io"))), Some(json!("FALSE")));
    }

    #[test]
    fn test_standard_filters() {
        let filters = Filters::standard();
        let run = |name: &str, args: &[&str], input: Value| {
            filters.resolve(vec![invoke(name, args)]).apply(Some(input))
        };

        assert_eq!(run("replace", &["-", " "], json!("a-b-c")), Some(json!("a b c")));
        assert_eq!(run("replace", &["-"], json!("a-b")), Some(json!("ab")));
        assert_eq!(run("split", &[], json!(" a  b ")), Some(json!(["a", "b"])));
        assert_eq!(run("number", &[], json!(" 42 ")), Some(json!(42)));
        assert_eq!(run("number", &[], json!("1.5")), Some(json!(1.5)));
        assert_eq!(run("number", &[], json!("n/a")), None);
    }

    #[test]
    fn test_registry_debug_lists_names() {
        let filters = Filters::new().with_text("b", |s, _| Value::from(s)).with_text("a", |s, _| Value::from(s));
        assert_eq!(format!("{:?}", filters), r#"Filters { names: ["a", "b"] }"#);
        assert_eq!(filters.len(), 2);
        assert!(filters.contains("a"));
    }
}
