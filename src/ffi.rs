//! FFI interface for C++ interop
//!
//! Provides C-compatible functions for resolving a schema against HTML.
//! Requests and results are passed as JSON for simplicity and type safety.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::schema::Schema;
use crate::select::{Filters, Syntax, Xray};

/// Request from C++
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRequest {
    pub schema: Schema,
    /// Optional alternate expression syntax
    #[serde(default)]
    pub syntax: Syntax,
}

/// Result returned to C++
#[derive(Debug, Clone, Serialize, Default)]
pub struct ExtractionResult {
    /// Resolved value; null when the schema matched nothing
    pub value: Option<Value>,
}

/// Result struct returned to C++
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Resolve a JSON request against HTML, using the standard filter set.
pub fn extract_json(html: &str, request_json: &str) -> Result<String, Error> {
    let request: ExtractionRequest = serde_json::from_str(request_json)?;
    let config = Config::default()
        .with_filters(Filters::standard())
        .with_syntax(request.syntax);
    let xray = Xray::with_config(html, config);
    let result = ExtractionResult {
        value: xray.select(&request.schema),
    };
    Ok(serde_json::to_string(&result)?)
}

/// Resolve a schema against HTML.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized ExtractionRequest (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn html_schema_extract(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        ""
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    if request_json.is_null() {
        return make_error_result("Request JSON is null");
    }
    let request_str = match CStr::from_ptr(request_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
    };

    match extract_json(html, request_str) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free an ExtractionResultFFI returned by html_schema_extract
///
/// # Safety
/// - `result` must have been returned by `html_schema_extract`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HTML: &str = r#"
    <ul>
        <li><a href="/a"> A </a></li>
        <li><a href="/b"> B </a></li>
    </ul>
    "#;

    #[test]
    fn test_extract_json() {
        let request = json!({
            "schema": [{ "$root": "li", "href": "a[href]", "label": "a | trim | lowercase" }]
        });
        let out = extract_json(HTML, &request.to_string()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            json!({ "value": [
                { "href": "/a", "label": "a" },
                { "href": "/b", "label": "b" }
            ]})
        );
    }

    #[test]
    fn test_extract_json_with_syntax() {
        let request = json!({
            "schema": "a@href",
            "syntax": { "attribute": { "style": "prefixed", "marker": "@" } }
        });
        let out = extract_json(HTML, &request.to_string()).unwrap();
        assert_eq!(out, r#"{"value":"/a"}"#);
    }

    #[test]
    fn test_extract_json_absent_value() {
        let out = extract_json(HTML, r#"{"schema": "table"}"#).unwrap();
        assert_eq!(out, r#"{"value":null}"#);
    }

    #[test]
    fn test_extract_json_bad_schema() {
        let err = extract_json(HTML, r#"{"schema": 42}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_ffi_roundtrip() {
        let request = CString::new(r#"{"schema": ["li a[href]"]}"#).unwrap();
        unsafe {
            let result = html_schema_extract(
                HTML.as_ptr() as *const c_char,
                HTML.len(),
                request.as_ptr(),
            );
            assert!(result.error_ptr.is_null());
            let json = CStr::from_ptr(result.json_ptr).to_str().unwrap().to_string();
            free_extraction_result(result);
            assert_eq!(json, r#"{"value":["/a","/b"]}"#);
        }
    }

    #[test]
    fn test_ffi_null_request() {
        unsafe {
            let result = html_schema_extract(ptr::null(), 0, ptr::null());
            assert!(result.json_ptr.is_null());
            let msg = CStr::from_ptr(result.error_ptr).to_str().unwrap().to_string();
            free_extraction_result(result);
            assert_eq!(msg, "Request JSON is null");
        }
    }
}
