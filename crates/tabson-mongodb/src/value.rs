//! Host value model
//!
//! A [`Value`] is the dynamically-typed value handed over by the scripting side.
//! Tables are shared by reference: cloning a [`Table`] clones the handle, not the
//! entries, so the same table can appear several times in a value graph (or
//! contain itself).

use indexmap::IndexMap;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Dynamically-typed host value
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Table(Table),
    /// A value carrying one of the extended BSON kinds
    Extended(ExtendedValue),
}

impl Value {
    /// Kind name used in error messages and logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Extended(ext) => ext.type_name(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<ExtendedValue> for Value {
    fn from(ext: ExtendedValue) -> Self {
        Value::Extended(ext)
    }
}

/// Extended BSON kinds expressed as host values
///
/// Payloads that the scripting side may leave out are optional; encoding a
/// value whose required payload is missing produces no field.
#[derive(Clone, Debug, PartialEq)]
pub enum ExtendedValue {
    /// Milliseconds since the Unix epoch
    Date(f64),
    /// Seconds plus increment of a decoded timestamp
    ///
    /// Encoding ignores the payload and mints a fresh timestamp.
    Timestamp(f64),
    Symbol(Option<String>),
    Binary(Option<Vec<u8>>),
    Regex {
        pattern: Option<String>,
        flags: Option<String>,
    },
    /// 24-character hex string
    ObjectId(Option<String>),
    /// Explicit null, as opposed to an absent value
    Null,
    /// Forces a 32-bit integer field
    Int32(i32),
    /// Forces a 64-bit integer field
    Int64(i64),
}

impl ExtendedValue {
    pub fn date(millis: i64) -> Self {
        ExtendedValue::Date(millis as f64)
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        ExtendedValue::Symbol(Some(s.into()))
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        ExtendedValue::Binary(Some(bytes.into()))
    }

    pub fn regex(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        ExtendedValue::Regex {
            pattern: Some(pattern.into()),
            flags: Some(flags.into()),
        }
    }

    pub fn object_id(hex: impl Into<String>) -> Self {
        ExtendedValue::ObjectId(Some(hex.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ExtendedValue::Date(_) => "Date",
            ExtendedValue::Timestamp(_) => "Timestamp",
            ExtendedValue::Symbol(_) => "Symbol",
            ExtendedValue::Binary(_) => "BinData",
            ExtendedValue::Regex { .. } => "RegEx",
            ExtendedValue::ObjectId(_) => "ObjectID",
            ExtendedValue::Null => "NULL",
            ExtendedValue::Int32(_) => "NumberInt",
            ExtendedValue::Int64(_) => "NumberLong",
        }
    }
}

/// Table key: a number or a string
#[derive(Clone, Debug)]
pub enum Key {
    Number(f64),
    String(String),
}

impl Key {
    /// Positive integer value of the key, if it has one
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Number(n) if *n >= 1.0 && n.fract() == 0.0 && *n <= usize::MAX as f64 => {
                Some(*n as usize)
            }
            _ => None,
        }
    }

    /// Field name this key produces in a document
    ///
    /// Integral numbers print without a fractional part, other numbers use the
    /// shortest decimal form that reads back to the same value.
    pub fn to_field_name(&self) -> String {
        match self {
            Key::String(s) => s.clone(),
            Key::Number(n) => format_number(*n),
        }
    }

    fn normalized_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Number(a), Key::Number(b)) => {
                Key::normalized_bits(*a) == Key::normalized_bits(*b)
            }
            (Key::String(a), Key::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Number(n) => {
                0u8.hash(state);
                Key::normalized_bits(*n).hash(state);
            }
            Key::String(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_field_name())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Number(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Number(n as f64)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Number(n as f64)
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Number(n as f64)
    }
}

/// Opaque identity of a table, stable for the table's lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableId(usize);

/// Shared, mutable host table
///
/// Entries keep insertion order. Storing [`Value::Nil`] under a key removes
/// the key, so a table never holds a nil entry.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<IndexMap<Key, Value>>>);

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an array-shaped table keyed 1..N
    pub fn array<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let table = Self::new();
        for (i, value) in values.into_iter().enumerate() {
            table.set(i + 1, value);
        }
        table
    }

    /// Build a table from key/value pairs, in order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let table = Self::new();
        for (key, value) in pairs {
            table.set(key, value);
        }
        table
    }

    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.0.borrow_mut();
        if value.is_nil() {
            entries.shift_remove(&key);
        } else {
            entries.insert(key, value);
        }
    }

    /// Value stored under `key`, or Nil
    pub fn get(&self, key: impl Into<Key>) -> Value {
        self.0
            .borrow()
            .get(&key.into())
            .cloned()
            .unwrap_or(Value::Nil)
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.0.borrow().contains_key(&key.into())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries in iteration order
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn borrow(&self) -> Ref<'_, IndexMap<Key, Value>> {
        self.0.borrow()
    }

    pub fn id(&self) -> TableId {
        TableId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    /// True if both handles refer to the same table
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Length N if the table is non-empty and its keys are exactly 1..N
    ///
    /// This is what makes a table array-shaped.
    pub fn sequence_len(&self) -> Option<usize> {
        let entries = self.0.borrow();
        let len = entries.len();
        if len == 0 {
            return None;
        }
        let dense = entries
            .keys()
            .all(|key| matches!(key.as_index(), Some(i) if i <= len));
        dense.then_some(len)
    }

    pub fn is_sequence(&self) -> bool {
        self.sequence_len().is_some()
    }
}

impl PartialEq for Table {
    /// Structural equality, independent of entry order
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.0.borrow();
        let b = other.0.borrow();
        a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Entries are not printed to keep self-referencing tables printable.
        f.debug_struct("Table")
            .field("id", &self.id())
            .field("len", &self.len())
            .finish()
    }
}
