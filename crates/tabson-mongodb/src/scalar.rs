//! Scalar conversion between host values and BSON

use bson::Bson;

use crate::value::Value;

/// Convert a scalar host value to BSON
///
/// Integral numbers that fit a 32-bit signed integer become `Int32`, which is
/// how numbers coming from JSON-like sources are expected to be typed. Every
/// other number stays a double. Returns `None` for tables and extended values.
pub fn encode_scalar(value: &Value) -> Option<Bson> {
    match value {
        Value::Nil => Some(Bson::Null),
        Value::Boolean(b) => Some(Bson::Boolean(*b)),
        Value::String(s) => Some(Bson::String(s.clone())),
        Value::Number(n) => Some(encode_number(*n)),
        Value::Table(_) | Value::Extended(_) => None,
    }
}

fn encode_number(n: f64) -> Bson {
    if n == n.floor() && n.abs() < i32::MAX as f64 {
        Bson::Int32(n as i32)
    } else {
        Bson::Double(n)
    }
}

/// Convert a scalar BSON value to a host value
///
/// All numeric kinds collapse to a host number; 64-bit integers beyond f64
/// precision lose their low bits. `Undefined` and non-scalar kinds give `None`.
pub fn decode_scalar(bson: &Bson) -> Option<Value> {
    match bson {
        Bson::Int32(i) => Some(Value::Number(*i as f64)),
        Bson::Int64(i) => Some(Value::Number(*i as f64)),
        Bson::Double(f) => Some(Value::Number(*f)),
        Bson::Boolean(b) => Some(Value::Boolean(*b)),
        Bson::String(s) => Some(Value::String(s.clone())),
        _ => None,
    }
}
