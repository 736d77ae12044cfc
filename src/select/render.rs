//! Leaf rendering
//!
//! Turns one matched node into a value according to the parsed attribute,
//! then runs the filter pipeline over it.

use serde_json::Value;

use super::parser::ParsedSelector;
use crate::document::{is_intrinsic, Node};

/// Attribute name that selects inner markup instead of an attribute.
pub const HTML_ACCESSOR: &str = "html";

/// Render `node`. A missing attribute renders as absence, which the filters
/// still see.
pub fn render(node: &Node<'_>, parsed: &ParsedSelector) -> Option<Value> {
    let raw = match parsed.attribute.as_deref() {
        None => Some(Value::String(node.text())),
        Some(HTML_ACCESSOR) => Some(Value::String(node.inner_html())),
        Some(name) if is_intrinsic(name) => node.intrinsic(name),
        Some(name) => node.attr(name).map(|v| Value::String(v.to_string())),
    };
    parsed.filters.apply(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{IntoDocument, Scope};
    use crate::select::filters::Filters;
    use crate::select::parser::Syntax;
    use serde_json::json;

    fn render_first(html: &str, expr: &str) -> Option<Value> {
        let doc = html.into_document();
        let parsed = Syntax::default().parse(expr, &Filters::standard());
        let css = parsed.selector.clone().unwrap_or_default();
        let scope = Scope::document(&doc).find_css(&css);
        render(&scope.nodes()[0], &parsed)
    }

    #[test]
    fn test_attribute_dispatch() {
        let html = r#"<a href="mat.io" class="link">mat <b>io</b></a>"#;
        assert_eq!(render_first(html, "a[href]"), Some(json!("mat.io")));
        assert_eq!(render_first(html, "a"), Some(json!("mat io")));
        assert_eq!(render_first(html, "a[html]"), Some(json!("mat <b>io</b>")));
        assert_eq!(render_first(html, "a[tagName]"), Some(json!("a")));
        assert_eq!(render_first(html, "a[nodeType]"), Some(json!(1)));
        assert_eq!(render_first(html, "a[title]"), None);
    }

    #[test]
    fn test_filters_run_after_render() {
        let html = r#"<p> Hello World </p>"#;
        assert_eq!(render_first(html, "p | trim | lowercase"), Some(json!("hello world")));
        assert_eq!(render_first(html, "p[title] | trim"), None);
    }

    #[test]
    fn test_text_is_untrimmed() {
        let html = "<p>\n  spaced\n</p>";
        assert_eq!(render_first(html, "p"), Some(json!("\n  spaced\n")));
    }
}
