//! Field expression parser
//!
//! Splits `"h2.title[data-id] | trim | split:/"` into a CSS selector, an
//! optional attribute name and a list of filter invocations. The delimiters
//! come from [`Syntax`] so alternate spellings such as `a@href` or `a{href}`
//! can be used.

use serde::{Deserialize, Serialize};

use super::filters::{FilterPipeline, Filters};

/// How the attribute is written after the selector text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "style")]
pub enum AttributeSyntax {
    /// `a[href]`
    Bracketed { open: char, close: char },
    /// `a@href`
    Prefixed { marker: char },
}

impl Default for AttributeSyntax {
    fn default() -> Self {
        AttributeSyntax::Bracketed {
            open: '[',
            close: ']',
        }
    }
}

/// Delimiters of the field expression grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Syntax {
    pub attribute: AttributeSyntax,
    /// Separates the field selector from filters and filters from each other.
    pub filter_separator: String,
    /// Separates a filter name from its arguments.
    pub argument_separator: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            attribute: AttributeSyntax::default(),
            filter_separator: "|".to_string(),
            argument_separator: ":".to_string(),
        }
    }
}

/// A filter reference as written, before registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

/// Field expression split into its parts, without filter lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expression {
    pub selector: Option<String>,
    pub attribute: Option<String>,
    pub invocations: Vec<Invocation>,
}

/// Field expression with filters bound to the registry.
#[derive(Debug, Clone, Default)]
pub struct ParsedSelector {
    /// CSS selector; `None` means the scope element itself.
    pub selector: Option<String>,
    /// `None` renders text, `html` inner markup, intrinsic names the node
    /// property, anything else the attribute value.
    pub attribute: Option<String>,
    pub filters: FilterPipeline,
}

impl Syntax {
    /// Alternate syntax using `a@href`.
    pub fn at_sign() -> Self {
        Self {
            attribute: AttributeSyntax::Prefixed { marker: '@' },
            ..Self::default()
        }
    }

    /// Parse and bind filters, dropping names `filters` does not know.
    pub fn parse(&self, expr: &str, filters: &Filters) -> ParsedSelector {
        let Expression {
            selector,
            attribute,
            invocations,
        } = self.split(expr);
        ParsedSelector {
            selector,
            attribute,
            filters: filters.resolve(invocations),
        }
    }

    /// Split an expression into selector, attribute and filter invocations.
    ///
    /// A field part the grammar cannot make sense of is used verbatim as the
    /// selector, with no attribute and no filters.
    pub fn split(&self, expr: &str) -> Expression {
        let mut segments = split_unquoted(expr, &self.filter_separator).into_iter();
        let field = segments.next().unwrap_or_default();

        let Some((selector, attribute)) = self.split_field(field) else {
            log::debug!("Malformed field expression '{}', using it as a plain selector", expr);
            return Expression {
                selector: non_empty(expr.trim()),
                attribute: None,
                invocations: Vec::new(),
            };
        };

        let invocations = segments
            .filter_map(|segment| self.parse_invocation(segment))
            .collect();

        Expression {
            selector: non_empty(selector),
            attribute,
            invocations,
        }
    }

    fn split_field<'e>(&self, field: &'e str) -> Option<(&'e str, Option<String>)> {
        let field = field.trim();
        match self.attribute {
            AttributeSyntax::Bracketed { open, close } => split_bracketed(field, open, close),
            AttributeSyntax::Prefixed { marker } => split_prefixed(field, marker),
        }
    }

    fn parse_invocation(&self, segment: &str) -> Option<Invocation> {
        let mut parts = split_unquoted(segment, &self.argument_separator).into_iter();
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let args = parts.map(unquote).collect();
        Some(Invocation {
            name: name.to_string(),
            args,
        })
    }
}

/// A trailing `[name]` is the attribute; other bracket groups, such as
/// `[href^="http"]`, stay part of the CSS selector.
fn split_bracketed(field: &str, open: char, close: char) -> Option<(&str, Option<String>)> {
    let mut depth: i32 = 0;
    let mut last_open = None;
    let mut quote = None;
    for (i, c) in field.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        } else if c == open {
            if depth == 0 {
                last_open = Some(i);
            }
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth < 0 {
                return None;
            }
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }

    if let (Some(start), Some(inner)) = (last_open, field.strip_suffix(close)) {
        let name = &inner[start + open.len_utf8()..];
        if is_attribute_name(name) {
            return Some((field[..start].trim(), Some(name.to_string())));
        }
    }
    Some((field, None))
}

fn split_prefixed(field: &str, marker: char) -> Option<(&str, Option<String>)> {
    match field.rsplit_once(marker) {
        None => Some((field, None)),
        Some((selector, name)) => {
            let name = name.trim();
            if is_attribute_name(name) && !selector.contains(marker) {
                Some((selector.trim(), Some(name.to_string())))
            } else {
                None
            }
        }
    }
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Split on `sep` outside of single or double quotes. An empty separator
/// never splits.
fn split_unquoted<'s>(s: &'s str, sep: &str) -> Vec<&'s str> {
    if sep.is_empty() {
        return vec![s];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote = None;
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if s[i..].starts_with(sep) => {
                parts.push(&s[start..i]);
                start = i + sep.len();
                // skip the rest of a multi-character separator
                while chars.as_str().len() > s.len() - start {
                    chars.next();
                }
            }
            None => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Trim an argument; quoted arguments keep their inner text verbatim.
fn unquote(arg: &str) -> String {
    let trimmed = arg.trim();
    for q in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
        {
            return inner.to_string();
        }
    }
    trimmed.to_string()
}
