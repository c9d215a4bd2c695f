//! Normalization of document arguments
//!
//! Filters, updates, projections and index keys may be given as:
//! - a JSON document string,
//! - a table,
//! - a sequence of the above, merged in order into one document.
//!
//! Batches of documents (for inserts) add one more level: a sequence whose
//! elements are each normalized as above.

use bson::{Bson, Document as BsonDocument};

use tabson_common::{MarshalError, Result};

use crate::config::{get_config, MarshalConfig};
use crate::structure::encode_table_with;
use crate::value::{Table, Value};

/// Parse a (possibly extended) JSON document string
///
/// Field order is kept as written. Extended JSON forms such as
/// `{"$oid": "..."}` or `{"$date": ...}` become the matching BSON kinds.
pub fn parse_document_string(text: &str) -> Result<BsonDocument> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    match Bson::try_from(json)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(MarshalError::Parse(format!(
            "expected a JSON object, got {}",
            crate::extended::bson_type_name(&other)
        ))),
    }
}

/// Normalize a single document: a JSON string or a table
pub fn normalize_one(input: &Value) -> Result<BsonDocument> {
    normalize_one_with(input, &get_config())
}

/// [`normalize_one`] with an explicit configuration
pub fn normalize_one_with(input: &Value, config: &MarshalConfig) -> Result<BsonDocument> {
    match input {
        Value::String(text) => parse_document_string(text),
        Value::Table(table) => Ok(encode_table_with(table, config)),
        other => Err(MarshalError::InvalidShape(other.type_name().to_string())),
    }
}

/// Normalize a document that may be given as a sequence of partial documents
///
/// A non-empty array-shaped table is treated as that sequence: each element is
/// normalized with [`normalize_one`] and merged into one document. A field name
/// already present is skipped, so the first part that sets a name wins. Any
/// other input goes straight to [`normalize_one`].
pub fn normalize_ordered(input: &Value) -> Result<BsonDocument> {
    normalize_ordered_with(input, &get_config())
}

/// [`normalize_ordered`] with an explicit configuration
pub fn normalize_ordered_with(input: &Value, config: &MarshalConfig) -> Result<BsonDocument> {
    if config.ordered_sequences {
        if let Some(parts) = sequence_elements(input) {
            tracing::debug!(parts = parts.len(), "merging ordered partial documents");
            let mut merged = BsonDocument::new();
            for part in &parts {
                let doc = normalize_one_with(part, config)?;
                for (key, value) in doc {
                    if !merged.contains_key(&key) {
                        merged.insert(key, value);
                    }
                }
            }
            return Ok(merged);
        }
    }
    normalize_one_with(input, config)
}

/// Normalize a batch of documents
///
/// A non-empty array-shaped table is a batch: each element is normalized with
/// [`normalize_ordered`]. Anything else is a batch of a single document.
pub fn normalize_batch(input: &Value) -> Result<Vec<BsonDocument>> {
    normalize_batch_with(input, &get_config())
}

/// [`normalize_batch`] with an explicit configuration
pub fn normalize_batch_with(input: &Value, config: &MarshalConfig) -> Result<Vec<BsonDocument>> {
    match sequence_elements(input) {
        Some(items) => {
            tracing::debug!(documents = items.len(), "normalizing document batch");
            items
                .iter()
                .map(|item| normalize_ordered_with(item, config))
                .collect()
        }
        None => Ok(vec![normalize_one_with(input, config)?]),
    }
}

/// Elements 1..N of an array-shaped table
fn sequence_elements(input: &Value) -> Option<Vec<Value>> {
    let table: &Table = input.as_table()?;
    let len = table.sequence_len()?;
    Some((1..=len).map(|i| table.get(i)).collect())
}
