//! Positional regrouping of independently queried fields
//!
//! Used for `[{ title: "h2", href: "a[href]" }]` without `$root`: every field
//! is queried over the same scope, giving one column per field, and the
//! columns are zipped by index into records.

use serde_json::{Map, Value};

/// One field's values in document order; `None` marks a position where the
/// field rendered nothing.
pub type Column = (String, Vec<Option<Value>>);

/// Zip columns into records.
///
/// The output has as many records as the longest column. Record `i` holds the
/// `i`-th value of every column that has one, in column order; shorter
/// columns and `None` entries leave the key out rather than cutting the
/// record.
pub fn zip_fields_to_records(columns: Vec<Column>) -> Vec<Map<String, Value>> {
    let len = columns
        .iter()
        .map(|(_, values)| values.len())
        .max()
        .unwrap_or(0);
    log::trace!("Zipping {} columns into {} records", columns.len(), len);

    let mut records: Vec<Map<String, Value>> = (0..len).map(|_| Map::new()).collect();
    for (name, values) in columns {
        for (record, value) in records.iter_mut().zip(values) {
            if let Some(value) = value {
                record.insert(name.clone(), value);
            }
        }
    }
    records
}
