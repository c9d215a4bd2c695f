//! Recursive conversion of host tables to and from BSON documents
//!
//! # Shape
//!
//! A host table has no separate array type. A table is encoded as a BSON array
//! when it is non-empty and its keys are exactly `1..=N`; every other table,
//! including the empty one, is encoded as a document.
//!
//! # Cycles
//!
//! Every top-level encode owns a [`VisitedSet`]. A table is marked before its
//! children are visited and stays marked until the call returns, so a table
//! reached a second time (through a cycle or a repeated reference) produces no
//! field.

use bson::{Bson, Document as BsonDocument};
use std::collections::HashSet;

use tabson_common::{MarshalError, Result};

use crate::config::{get_config, MarshalConfig};
use crate::extended::{bson_type_name, decode_extended, encode_extended};
use crate::scalar::{decode_scalar, encode_scalar};
use crate::value::{Key, Table, TableId, Value};

/// Identities of the tables entered during one encode call
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<TableId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `table` as visited. Returns false if it already was.
    pub fn mark(&mut self, table: &Table) -> bool {
        self.seen.insert(table.id())
    }
}

#[cfg(test)]
impl VisitedSet {
    pub(crate) fn contains(&self, table: &Table) -> bool {
        self.seen.contains(&table.id())
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// State threaded through one top-level encode call
struct EncodeContext<'a> {
    visited: VisitedSet,
    config: &'a MarshalConfig,
}

impl<'a> EncodeContext<'a> {
    fn new(config: &'a MarshalConfig) -> Self {
        Self {
            visited: VisitedSet::new(),
            config,
        }
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Convert a BSON document to a host value
///
/// An empty document decodes to Nil, so "no document" and "empty document"
/// look the same to the caller.
pub fn decode_document(doc: &BsonDocument) -> Value {
    if doc.is_empty() {
        Value::Nil
    } else {
        Value::Table(document_to_table(doc))
    }
}

/// Convert a single BSON value to a host value
///
/// Returns `None` for kinds with no host representation (Undefined, code,
/// Decimal128, min/max keys, ...).
pub fn decode_value(bson: &Bson) -> Option<Value> {
    match bson {
        Bson::Document(doc) => Some(Value::Table(document_to_table(doc))),
        Bson::Array(items) => Some(Value::Table(array_to_table(items))),
        other => {
            let value = decode_scalar(other).or_else(|| decode_extended(other));
            if value.is_none() {
                tracing::trace!(bson_type = bson_type_name(other), "skipping unsupported BSON type");
            }
            value
        }
    }
}

fn document_to_table(doc: &BsonDocument) -> Table {
    let table = Table::new();
    for (key, value) in doc.iter() {
        if let Some(value) = decode_value(value) {
            table.set(key.as_str(), value);
        }
    }
    table
}

/// Arrays become tables keyed by 1-based position. A dropped element leaves
/// its position empty.
fn array_to_table(items: &[Bson]) -> Table {
    let table = Table::new();
    for (i, item) in items.iter().enumerate() {
        if let Some(value) = decode_value(item) {
            table.set(i + 1, value);
        }
    }
    table
}

// ============================================================================
// Encode
// ============================================================================

/// Convert a host table to a BSON document
///
/// The root is always encoded as a document: numeric keys become field names,
/// even when the table is array-shaped.
pub fn encode_table(table: &Table) -> BsonDocument {
    encode_table_with(table, &get_config())
}

/// [`encode_table`] with an explicit configuration
pub fn encode_table_with(table: &Table, config: &MarshalConfig) -> BsonDocument {
    let mut ctx = EncodeContext::new(config);
    ctx.visited.mark(table);
    table_to_document(table, &mut ctx, 0)
}

/// Convert a host value to a BSON document
///
/// Nil gives an empty document. Anything other than Nil or a table is not a
/// document and fails with [`MarshalError::InvalidShape`].
pub fn encode_document(value: &Value) -> Result<BsonDocument> {
    match value {
        Value::Nil => Ok(BsonDocument::new()),
        Value::Table(table) => Ok(encode_table(table)),
        other => Err(MarshalError::InvalidShape(other.type_name().to_string())),
    }
}

/// Convert a single host value to BSON
///
/// Unlike [`encode_table`], an array-shaped table gives a BSON array here.
/// Returns `None` when the value cannot be represented.
pub fn encode_value(value: &Value) -> Option<Bson> {
    encode_value_with(value, &get_config())
}

/// [`encode_value`] with an explicit configuration
pub fn encode_value_with(value: &Value, config: &MarshalConfig) -> Option<Bson> {
    let mut ctx = EncodeContext::new(config);
    encode_element(value, &mut ctx, 0)
}

fn encode_element(value: &Value, ctx: &mut EncodeContext<'_>, depth: usize) -> Option<Bson> {
    match value {
        Value::Extended(ext) => encode_extended(ext),
        Value::Table(table) => encode_container(table, ctx, depth),
        scalar => encode_scalar(scalar),
    }
}

fn encode_container(table: &Table, ctx: &mut EncodeContext<'_>, depth: usize) -> Option<Bson> {
    if let Some(max_depth) = ctx.config.max_depth {
        if depth > max_depth {
            tracing::warn!(depth, max_depth, "dropping table nested beyond the depth limit");
            return None;
        }
    }

    if !ctx.visited.mark(table) {
        tracing::debug!(table = ?table.id(), "skipping table already visited in this call");
        return None;
    }

    match table.sequence_len() {
        Some(len) => Some(Bson::Array(table_to_array(table, len, ctx, depth))),
        None => Some(Bson::Document(table_to_document(table, ctx, depth))),
    }
}

fn table_to_array(
    table: &Table,
    len: usize,
    ctx: &mut EncodeContext<'_>,
    depth: usize,
) -> Vec<Bson> {
    let entries = table.borrow();
    let mut items = Vec::with_capacity(len);
    for i in 1..=len {
        let Some(value) = entries.get(&Key::from(i)) else {
            continue;
        };
        match encode_element(value, ctx, depth + 1) {
            Some(bson) => items.push(bson),
            None => tracing::trace!(index = i, kind = value.type_name(), "dropping array element"),
        }
    }
    items
}

fn table_to_document(table: &Table, ctx: &mut EncodeContext<'_>, depth: usize) -> BsonDocument {
    let entries = table.borrow();
    let mut doc = BsonDocument::new();
    for (key, value) in entries.iter() {
        match encode_element(value, ctx, depth + 1) {
            Some(bson) => {
                doc.insert(key.to_field_name(), bson);
            }
            None => tracing::trace!(field = %key, kind = value.type_name(), "dropping field"),
        }
    }
    doc
}
