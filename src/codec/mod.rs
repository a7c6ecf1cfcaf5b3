//! Typed decoding of the gateway's untyped JSON trees.
//!
//! Each wire record describes its own shape through its serde implementation: the
//! field list, the wire names (`#[serde(rename = "...")]`) and the defaults for
//! fields the gateway leaves out. Generic wrappers such as `ApiResult<T>` are
//! resolved per payload type at compile time, so decoding `ApiResult<Device>`
//! decodes every element of `data.arr` as a `Device`. Records only decode from
//! JSON objects.

mod flag;
mod maps_only;

pub use flag::Flag;

use maps_only::MapsOnly;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::type_name;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unable to decode {target}: {source}")]
    Decode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to encode {target}: {source}")]
    Encode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected {target} to encode as a map, got {found}")]
    NotAMap { target: &'static str, found: &'static str },
}

/// Controls how records are turned back into wire maps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncodeOptions {
    /// Emit absent fields as `null` instead of leaving them out.
    pub keep_absent: bool,
}

pub fn decode<T: DeserializeOwned>(raw: Value) -> Result<T, DecodeError> {
    <T as Deserialize>::deserialize(MapsOnly(raw)).map_err(|source| DecodeError::Decode {
        target: type_name::<T>(),
        source,
    })
}

pub fn decode_str<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let raw = serde_json::from_str(raw).map_err(|source| DecodeError::Decode {
        target: type_name::<T>(),
        source,
    })?;
    decode(raw)
}

pub fn decode_slice<T: DeserializeOwned>(raw: &[u8]) -> Result<T, DecodeError> {
    let raw = serde_json::from_slice(raw).map_err(|source| DecodeError::Decode {
        target: type_name::<T>(),
        source,
    })?;
    decode(raw)
}

pub fn encode<T: Serialize>(record: &T, options: EncodeOptions) -> Result<Value, DecodeError> {
    let value = serde_json::to_value(record).map_err(|source| DecodeError::Encode {
        target: type_name::<T>(),
        source,
    })?;

    if options.keep_absent { Ok(value) } else { Ok(drop_absent(value)) }
}

/// Flattens a form record into query parameters. Absent fields are left out and
/// nested values are sent as their JSON text.
pub fn encode_query<T: Serialize>(record: &T) -> Result<Vec<(String, String)>, DecodeError> {
    let value = encode(record, EncodeOptions::default())?;
    let Value::Object(map) = value else {
        return Err(DecodeError::NotAMap {
            target: type_name::<T>(),
            found: kind_of(&value),
        });
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

fn drop_absent(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, drop_absent(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(drop_absent).collect()),
        other => other,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
