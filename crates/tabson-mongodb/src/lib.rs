//! Table <-> BSON marshalling for tabson
//!
//! This crate converts between dynamically-typed host values (nestable tables
//! with array-like or object-like keys) and BSON documents.
//!
//! # Features
//! - Array vs document shape inferred from table keys
//! - Cycle-safe encoding with a per-call visited set
//! - Extended BSON kinds (dates, timestamps, regexes, ObjectIds, ...) as typed host values
//! - Normalization of JSON strings, tables and ordered sequences of partial documents
//! - Query argument normalization that passes pre-built queries through
//!
//! # Example
//!
//! ```
//! use tabson_mongodb::bson::doc;
//! use tabson_mongodb::{decode_document, normalize_ordered, Table, Value};
//!
//! let filter = Table::array([
//!     Table::from_pairs([("status", "active")]),
//!     Table::from_pairs([("age", 30)]),
//! ]);
//! let doc = normalize_ordered(&Value::Table(filter)).unwrap();
//! assert_eq!(doc, doc! { "status": "active", "age": 30 });
//!
//! let value = decode_document(&doc);
//! assert_eq!(value.as_table().unwrap().get("age"), Value::Number(30.0));
//! ```

pub mod config;
pub mod extended;
pub mod normalize;
pub mod query;
pub mod scalar;
pub mod structure;
pub mod value;

pub use config::{get_config, reset_config, set_config, MarshalConfig};
pub use extended::{bson_type_name, decode_extended, encode_extended};
pub use normalize::{
    normalize_batch, normalize_batch_with, normalize_one, normalize_one_with, normalize_ordered,
    normalize_ordered_with, parse_document_string,
};
pub use query::{normalize_query, normalize_query_with, Query, QueryInput};
pub use scalar::{decode_scalar, encode_scalar};
pub use structure::{
    decode_document, decode_value, encode_document, encode_table, encode_table_with,
    encode_value, encode_value_with, VisitedSet,
};
pub use tabson_common::{MarshalError, Result};
pub use value::{ExtendedValue, Key, Table, TableId, Value};

// Re-export bson for convenience
pub use bson;
