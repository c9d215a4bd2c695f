//! Query objects and query argument normalization

use bson::{Bson, Document as BsonDocument};

use tabson_common::{MarshalError, Result};

use crate::config::{get_config, MarshalConfig};
use crate::normalize::normalize_ordered_with;
use crate::value::Value;

/// A query: a filter document plus optional modifiers
///
/// Queries built from a plain document only carry the filter. Pre-built query
/// objects may also set sort order, index hint, snapshot and explain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    filter: BsonDocument,
    sort: Option<BsonDocument>,
    hint: Option<BsonDocument>,
    snapshot: bool,
    explain: bool,
}

impl Query {
    /// Create an empty query (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter-only query
    pub fn from_filter(filter: BsonDocument) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the index hint
    pub fn hint(mut self, hint: BsonDocument) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn snapshot(mut self) -> Self {
        self.snapshot = true;
        self
    }

    pub fn explain(mut self) -> Self {
        self.explain = true;
        self
    }

    /// Get the filter document
    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    /// Get the sort document
    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    /// Get the hint document
    pub fn get_hint(&self) -> Option<&BsonDocument> {
        self.hint.as_ref()
    }

    pub fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    pub fn is_explain(&self) -> bool {
        self.explain
    }

    /// True if only the filter is set
    pub fn is_filter_only(&self) -> bool {
        self.sort.is_none() && self.hint.is_none() && !self.snapshot && !self.explain
    }

    /// Render the query as a single document
    ///
    /// A filter-only query renders as the bare filter. Otherwise the filter is
    /// wrapped under `$query` next to the modifiers.
    pub fn to_document(&self) -> BsonDocument {
        if self.is_filter_only() {
            return self.filter.clone();
        }

        let mut doc = BsonDocument::new();
        doc.insert("$query", self.filter.clone());
        if let Some(sort) = &self.sort {
            doc.insert("$orderby", sort.clone());
        }
        if let Some(hint) = &self.hint {
            doc.insert("$hint", hint.clone());
        }
        if self.snapshot {
            doc.insert("$snapshot", Bson::Boolean(true));
        }
        if self.explain {
            doc.insert("$explain", Bson::Boolean(true));
        }
        doc
    }
}

impl From<BsonDocument> for Query {
    fn from(filter: BsonDocument) -> Self {
        Query::from_filter(filter)
    }
}

/// A query argument as received from the scripting side
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// An already-built query object
    Query(Query),
    /// A document string, a table, or a sequence of partial documents
    Value(Value),
}

impl From<Query> for QueryInput {
    fn from(query: Query) -> Self {
        QueryInput::Query(query)
    }
}

impl From<Value> for QueryInput {
    fn from(value: Value) -> Self {
        QueryInput::Value(value)
    }
}

/// Normalize a query argument
///
/// A pre-built [`Query`] is returned as is, without re-encoding. A string or
/// table goes through ordered normalization and becomes a filter-only query.
pub fn normalize_query(input: QueryInput) -> Result<Query> {
    normalize_query_with(input, &get_config())
}

/// [`normalize_query`] with an explicit configuration
pub fn normalize_query_with(input: QueryInput, config: &MarshalConfig) -> Result<Query> {
    match input {
        QueryInput::Query(query) => Ok(query),
        QueryInput::Value(value @ (Value::String(_) | Value::Table(_))) => {
            normalize_ordered_with(&value, config).map(Query::from_filter)
        }
        QueryInput::Value(other) => Err(MarshalError::InvalidQueryShape(
            other.type_name().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Table;
    use bson::doc;

    #[test]
    fn test_query_new() {
        let q = Query::new();
        assert!(q.get_filter().is_empty());
        assert!(q.get_sort().is_none());
        assert!(q.get_hint().is_none());
        assert!(q.is_filter_only());
    }

    #[test]
    fn test_query_chaining() {
        let q = Query::from_filter(doc! { "active": true })
            .sort(doc! { "name": 1 })
            .hint(doc! { "name": 1 })
            .snapshot();

        assert_eq!(q.get_filter(), &doc! { "active": true });
        assert_eq!(q.get_sort(), Some(&doc! { "name": 1 }));
        assert_eq!(q.get_hint(), Some(&doc! { "name": 1 }));
        assert!(q.is_snapshot());
        assert!(!q.is_explain());
        assert!(!q.is_filter_only());
    }

    #[test]
    fn test_to_document_filter_only() {
        let q = Query::from_filter(doc! { "a": 1 });
        assert_eq!(q.to_document(), doc! { "a": 1 });
    }

    #[test]
    fn test_to_document_with_modifiers() {
        let q = Query::from_filter(doc! { "a": 1 })
            .sort(doc! { "b": -1 })
            .explain();
        assert_eq!(
            q.to_document(),
            doc! { "$query": { "a": 1 }, "$orderby": { "b": -1 }, "$explain": true }
        );
    }

    #[test]
    fn test_normalize_query_passes_query_through() {
        let q = Query::from_filter(doc! { "a": 1 }).sort(doc! { "a": 1 });
        let normalized = normalize_query(QueryInput::from(q.clone())).unwrap();
        assert_eq!(normalized, q);
    }

    #[test]
    fn test_normalize_query_from_string() {
        let q = normalize_query_with(
            Value::from(r#"{"age": {"$gte": 18}}"#).into(),
            &MarshalConfig::default(),
        )
        .unwrap();
        assert_eq!(q.get_filter(), &doc! { "age": { "$gte": 18 } });
        assert!(q.is_filter_only());
    }

    #[test]
    fn test_normalize_query_from_ordered_tables() {
        let input = Table::array([
            Table::from_pairs([("a", 1)]),
            Table::from_pairs([("b", 2)]),
        ]);
        let q = normalize_query_with(Value::Table(input).into(), &MarshalConfig::default())
            .unwrap();
        assert_eq!(q.get_filter(), &doc! { "a": 1, "b": 2 });
    }

    #[test]
    fn test_normalize_query_rejects_other_shapes() {
        let err = normalize_query_with(Value::Boolean(true).into(), &MarshalConfig::default())
            .unwrap_err();
        assert_eq!(err, MarshalError::InvalidQueryShape("boolean".to_string()));
        assert!(err.is_shape_error());
    }
}
