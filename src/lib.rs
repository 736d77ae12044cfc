//! Declarative HTML to data extraction
//!
//! Describe the data you want as a schema and resolve it against a document:
//! - `"a[href] | trim"` yields the first match's attribute, filtered
//! - `{ "$root": ".item", "link": "a[href]" }` yields an object
//! - `[{ "$root": ".item", "link": "a[href]" }]` yields one object per item
//!
//! ```
//! use html_schema::Xray;
//! use serde_json::json;
//!
//! let xray = Xray::new(r#"<div class="item"><a href="http://x.io">x</a></div>"#);
//! let value = xray
//!     .select_value(&json!([{ "$root": ".item", "link": "a[href]" }]))
//!     .unwrap();
//! assert_eq!(value, Some(json!([{ "link": "http://x.io" }])));
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod ffi;
pub mod schema;
pub mod select;

pub use config::*;
pub use document::{IntoDocument, Node, Scope};
pub use error::*;
pub use ffi::*;
pub use schema::*;
pub use select::*;
