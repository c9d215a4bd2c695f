//! Extended BSON kinds: dates, timestamps, symbols, binary, regexes, ObjectIds
//! and explicit nulls.

use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Regex, Timestamp};

use crate::value::{ExtendedValue, Value};

/// Decode an extended BSON value to a host value
///
/// Returns `None` for plain scalars and containers, which are handled elsewhere.
pub fn decode_extended(bson: &Bson) -> Option<Value> {
    let ext = match bson {
        Bson::DateTime(dt) => ExtendedValue::Date(dt.timestamp_millis() as f64),
        // Seconds and increment are merged into a single number.
        Bson::Timestamp(ts) => ExtendedValue::Timestamp(ts.time as f64 + ts.increment as f64),
        Bson::Symbol(s) => ExtendedValue::Symbol(Some(s.clone())),
        Bson::Binary(bin) => ExtendedValue::Binary(Some(bin.bytes.clone())),
        Bson::RegularExpression(regex) => ExtendedValue::Regex {
            pattern: Some(regex.pattern.clone()),
            flags: Some(regex.options.clone()),
        },
        Bson::ObjectId(oid) => ExtendedValue::ObjectId(Some(oid.to_hex())),
        Bson::Null => ExtendedValue::Null,
        _ => return None,
    };
    Some(Value::Extended(ext))
}

/// Encode an extended host value to BSON
///
/// A missing or malformed payload yields `None` and the field is left out.
pub fn encode_extended(ext: &ExtendedValue) -> Option<Bson> {
    match ext {
        ExtendedValue::Date(millis) => Some(Bson::DateTime(bson::DateTime::from_millis(
            *millis as i64,
        ))),
        ExtendedValue::Timestamp(_) => Some(Bson::Timestamp(fresh_timestamp())),
        ExtendedValue::Symbol(s) => s.as_ref().map(|s| Bson::Symbol(s.clone())),
        ExtendedValue::Binary(bytes) => bytes.as_ref().map(|bytes| {
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: bytes.clone(),
            })
        }),
        ExtendedValue::Regex { pattern, flags } => match (pattern, flags) {
            (Some(pattern), Some(flags)) => Some(Bson::RegularExpression(Regex {
                pattern: pattern.clone(),
                options: flags.clone(),
            })),
            _ => None,
        },
        ExtendedValue::ObjectId(hex) => {
            let hex = hex.as_ref()?;
            match ObjectId::parse_str(hex) {
                Ok(oid) => Some(Bson::ObjectId(oid)),
                Err(e) => {
                    tracing::trace!(error = %e, "dropping malformed ObjectId payload");
                    None
                }
            }
        }
        ExtendedValue::Null => Some(Bson::Null),
        ExtendedValue::Int32(i) => Some(Bson::Int32(*i)),
        ExtendedValue::Int64(i) => Some(Bson::Int64(*i)),
    }
}

/// Timestamps are write-once markers: every encode mints a new one.
fn fresh_timestamp() -> Timestamp {
    let now = chrono::Utc::now().timestamp();
    Timestamp {
        time: u32::try_from(now).unwrap_or(u32::MAX),
        increment: 0,
    }
}

/// Human-readable name of a BSON kind
pub fn bson_type_name(bson: &Bson) -> &'static str {
    match bson {
        Bson::Double(_) => "NumberDouble",
        Bson::String(_) => "String",
        Bson::Document(_) => "Object",
        Bson::Array(_) => "Array",
        Bson::Binary(_) => "BinData",
        Bson::Undefined => "Undefined",
        Bson::ObjectId(_) => "ObjectID",
        Bson::Boolean(_) => "Bool",
        Bson::DateTime(_) => "Date",
        Bson::Null => "NULL",
        Bson::RegularExpression(_) => "RegEx",
        Bson::DbPointer(_) => "DBRef",
        Bson::JavaScriptCode(_) => "Code",
        Bson::Symbol(_) => "Symbol",
        Bson::JavaScriptCodeWithScope(_) => "CodeWScope",
        Bson::Int32(_) => "NumberInt",
        Bson::Timestamp(_) => "Timestamp",
        Bson::Int64(_) => "NumberLong",
        Bson::Decimal128(_) => "NumberDecimal",
        Bson::MinKey => "MinKey",
        Bson::MaxKey => "MaxKey",
        #[allow(unreachable_patterns)]
        _ => "UnknownType",
    }
}
