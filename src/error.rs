//! Error types
//!
//! Only malformed schemas and undecodable JSON are errors. A selector that
//! matches nothing is absence (`None`), not an error.

use thiserror::Error;

/// Problems with the shape of a schema value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Numbers, booleans and null have no meaning as a schema node.
    #[error("unsupported schema value at {path}: expected string, object or single-element array, got {found}")]
    UnsupportedValue { path: String, found: &'static str },

    /// A collection schema must wrap exactly one inner schema.
    #[error("collection schema at {path} must contain exactly one element, got {len}")]
    CollectionArity { path: String, len: usize },

    /// `[[...]]` has no defined meaning.
    #[error("collection schema at {path} directly wraps another collection")]
    NestedCollection { path: String },

    /// `$root` must be a selector string.
    #[error("`$root` at {path} must be a selector string")]
    RootNotString { path: String },
}

/// Crate level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchemaError::CollectionArity {
            path: "$.items".to_string(),
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "collection schema at $.items must contain exactly one element, got 2"
        );

        let wrapped: Error = err.into();
        assert!(wrapped.to_string().starts_with("invalid schema:"));
    }
}
