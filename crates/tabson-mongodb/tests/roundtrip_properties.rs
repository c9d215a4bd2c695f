//! Property tests for encode/decode round trips, shape inference and cycle handling

use proptest::prelude::*;
use std::collections::BTreeMap;
use tabson_mongodb::bson::{Bson, Document};
use tabson_mongodb::{
    decode_document, encode_table, encode_value, ExtendedValue, Table, Value,
};

/// Plain description of a host value, turned into a [`Value`] inside each test
#[derive(Debug, Clone)]
enum Model {
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
    Date(i64),
    Symbol(String),
    Binary(Vec<u8>),
    Regex(String, String),
    ObjectId([u8; 12]),
    Null,
    Array(Vec<Model>),
    Object(BTreeMap<String, Model>),
}

impl Model {
    fn to_value(&self) -> Value {
        match self {
            Model::Bool(b) => Value::Boolean(*b),
            Model::Int(i) => Value::from(*i),
            Model::Float(f) => Value::Number(*f),
            Model::Str(s) => Value::from(s.as_str()),
            Model::Date(ms) => ExtendedValue::date(*ms).into(),
            Model::Symbol(s) => ExtendedValue::symbol(s.as_str()).into(),
            Model::Binary(b) => ExtendedValue::binary(b.clone()).into(),
            Model::Regex(p, f) => ExtendedValue::regex(p.as_str(), f.as_str()).into(),
            Model::ObjectId(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                ExtendedValue::object_id(hex).into()
            }
            Model::Null => ExtendedValue::Null.into(),
            Model::Array(items) => Value::Table(Table::array(items.iter().map(Model::to_value))),
            Model::Object(fields) => Value::Table(object_table(fields)),
        }
    }
}

fn object_table(fields: &BTreeMap<String, Model>) -> Table {
    Table::from_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.to_value())))
}

fn leaf() -> impl Strategy<Value = Model> {
    prop_oneof![
        any::<bool>().prop_map(Model::Bool),
        any::<i32>().prop_map(Model::Int),
        (-1.0e9f64..1.0e9)
            .prop_filter("fractional", |f| f.fract() != 0.0)
            .prop_map(Model::Float),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Model::Str),
        (-10_000_000_000_000i64..10_000_000_000_000).prop_map(Model::Date),
        "[a-z]{1,8}".prop_map(Model::Symbol),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Model::Binary),
        ("[a-z^$.*]{1,8}", "[imsx]{0,3}").prop_map(|(p, f)| Model::Regex(p, f)),
        any::<[u8; 12]>().prop_map(Model::ObjectId),
        Just(Model::Null),
    ]
}

fn model() -> impl Strategy<Value = Model> {
    leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Model::Array),
            prop::collection::btree_map("[a-z_]{1,6}", inner, 0..5).prop_map(Model::Object),
        ]
    })
}

fn root() -> impl Strategy<Value = BTreeMap<String, Model>> {
    prop::collection::btree_map("[a-z_]{1,6}", model(), 1..6)
}

/// Number of embedded documents and arrays in a BSON value
fn container_count(bson: &Bson) -> usize {
    match bson {
        Bson::Document(doc) => 1 + doc.values().map(container_count).sum::<usize>(),
        Bson::Array(items) => 1 + items.iter().map(container_count).sum::<usize>(),
        _ => 0,
    }
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(fields in root()) {
        let table = object_table(&fields);
        let doc = encode_table(&table);
        prop_assert_eq!(decode_document(&doc), Value::Table(table));
    }

    #[test]
    fn prop_encoded_fields_follow_table_order(fields in root()) {
        let table = object_table(&fields);
        let doc = encode_table(&table);
        let keys: Vec<&String> = doc.keys().collect();
        let expected: Vec<&String> = fields.keys().collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn prop_dense_tables_are_arrays(items in prop::collection::vec(any::<i32>(), 1..20)) {
        let table = Table::array(items.iter().copied());
        match encode_value(&Value::Table(table)) {
            Some(Bson::Array(encoded)) => {
                let expected: Vec<Bson> = items.iter().map(|i| Bson::Int32(*i)).collect();
                prop_assert_eq!(encoded, expected);
            }
            other => prop_assert!(false, "expected array, got {:?}", other),
        }
    }

    #[test]
    fn prop_tables_with_gaps_are_documents(
        keys in prop::collection::btree_set(1i32..50, 1..10)
    ) {
        let n = keys.len() as i32;
        prop_assume!(keys.iter().any(|k| *k > n));
        let table = Table::from_pairs(keys.iter().map(|k| (*k, *k)));
        match encode_value(&Value::Table(table)) {
            Some(Bson::Document(doc)) => {
                let expected: Document =
                    keys.iter().map(|k| (k.to_string(), Bson::Int32(*k))).collect();
                prop_assert_eq!(doc, expected);
            }
            other => prop_assert!(false, "expected document, got {:?}", other),
        }
    }

    #[test]
    fn prop_cyclic_graphs_encode_each_table_once(
        size in 1usize..8,
        edges in prop::collection::vec((0usize..8, 0usize..8), 0..24),
    ) {
        let tables: Vec<Table> = (0..size)
            .map(|i| Table::from_pairs([("id", i as i32)]))
            .collect();
        for (n, (from, to)) in edges.iter().enumerate() {
            let (from, to) = (from % size, to % size);
            tables[from].set(format!("e{}", n), tables[to].clone());
        }

        let doc = encode_table(&tables[0]);
        let nested = container_count(&Bson::Document(doc));
        // The root document plus at most one embedded document per other table.
        prop_assert!(nested <= size);
    }
}
