//! Conversion between a flag's stored JSON payload and the dynamic value used on the RPC wire.
//!
//! The RPC side speaks `google.protobuf.Value`, whose numbers are all doubles. Integral
//! doubles that fit in the exactly-representable range are written back as JSON integers
//! so a value round-trips to the same text through either transport. Anything beyond
//! double precision is not preserved.

use prost_types::value::Kind;
use prost_types::{ListValue, NullValue, Struct, Value};
use serde_json::Number;
use serde_json::value::RawValue;

use crate::domain::{DomainError, FlagValue};

/// 2^53: every integer of smaller magnitude is exact in an `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Turns an RPC dynamic value into the stored representation. A missing value stays missing.
pub fn decode(wire: Option<Value>) -> Result<FlagValue, DomainError> {
    match wire {
        None => Ok(FlagValue::none()),
        Some(value) => Ok(FlagValue::from_json(&wire_to_json(value)?)),
    }
}

/// Turns a stored value into an RPC dynamic value. No value yields `None` (field omitted).
pub fn encode(value: &FlagValue) -> Result<Option<Value>, DomainError> {
    let Some(text) = value.as_str() else {
        return Ok(None);
    };

    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| DomainError::encoding(format!("stored value is not valid JSON: {e}")))?;

    json_to_wire(json).map(Some)
}

/// Builds the stored representation from a JSON request body field.
#[must_use]
pub fn from_json(value: Option<serde_json::Value>) -> FlagValue {
    value.map_or_else(FlagValue::none, |v| FlagValue::from_json(&v))
}

/// Hands the stored text back as embedded JSON without re-encoding it.
pub fn to_raw_json(value: &FlagValue) -> Result<Option<Box<RawValue>>, DomainError> {
    value
        .as_str()
        .map(|text| {
            RawValue::from_string(text.to_owned())
                .map_err(|e| DomainError::encoding(format!("stored value is not valid JSON: {e}")))
        })
        .transpose()
}

pub fn wire_to_json(value: Value) -> Result<serde_json::Value, DomainError> {
    let kind = value
        .kind
        .ok_or_else(|| DomainError::encoding("dynamic value has no kind set"))?;

    let json = match kind {
        Kind::NullValue(_) => serde_json::Value::Null,
        Kind::BoolValue(b) => serde_json::Value::Bool(b),
        Kind::NumberValue(n) => serde_json::Value::Number(number_from_f64(n)?),
        Kind::StringValue(s) => serde_json::Value::String(s),
        Kind::ListValue(list) => serde_json::Value::Array(
            list.values
                .into_iter()
                .map(wire_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Kind::StructValue(object) => serde_json::Value::Object(
            object
                .fields
                .into_iter()
                .map(|(key, value)| Ok((key, wire_to_json(value)?)))
                .collect::<Result<_, DomainError>>()?,
        ),
    };

    Ok(json)
}

pub fn json_to_wire(json: serde_json::Value) -> Result<Value, DomainError> {
    let kind = match json {
        serde_json::Value::Null => Kind::NullValue(NullValue::NullValue.into()),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => Kind::NumberValue(
            n.as_f64()
                .ok_or_else(|| DomainError::encoding(format!("number {n} is out of range")))?,
        ),
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items
                .into_iter()
                .map(json_to_wire)
                .collect::<Result<_, _>>()?,
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(key, value)| Ok((key, json_to_wire(value)?)))
                .collect::<Result<_, DomainError>>()?,
        }),
    };

    Ok(Value { kind: Some(kind) })
}

#[allow(clippy::cast_possible_truncation)]
fn number_from_f64(n: f64) -> Result<Number, DomainError> {
    if !n.is_finite() {
        return Err(DomainError::encoding(format!(
            "{n} cannot be represented as a JSON number"
        )));
    }

    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        return Ok(Number::from(n as i64));
    }

    Number::from_f64(n)
        .ok_or_else(|| DomainError::encoding(format!("{n} cannot be represented as a JSON number")))
}
