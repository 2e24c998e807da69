//! Normalized location records and the recognizer output boundary.
//!
//! Recognizer backends differ in how they shape location output: a
//! JSON-speaking sidecar returns free-form objects, while an embedded backend
//! can build typed records directly. [`RawLocation`] captures that choice as a
//! variant selected once per backend, and [`normalize`] flattens either shape
//! into the fixed-schema [`LocationRecord`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One resolved place mention.
///
/// Every field is independently optional, and absence is serialized as an
/// explicit `null` so all output records share the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: Option<String>,
    pub geonameid: Option<String>,
    pub feature_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    pub population: Option<u64>,
    pub admin2_name: Option<String>,
    pub admin1_name: Option<String>,
    pub country_name: Option<String>,
}

/// Location payload as produced by a recognizer backend.
#[derive(Debug, Clone)]
pub enum RawLocation {
    /// Typed record from a backend that emits structured output.
    Record(LocationRecord),
    /// Loose key-value object from a JSON-speaking backend.
    Mapping(Map<String, Value>),
}

impl RawLocation {
    /// Build from a loosely typed JSON value.
    ///
    /// Non-object values carry no usable location data and yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(RawLocation::Mapping(map)),
            _ => None,
        }
    }
}

/// Flatten a recognizer location into the fixed output schema.
///
/// Fields missing on the source are explicit `None`s in the record; a source
/// with none of the expected fields still yields a (fully null) record.
pub fn normalize(raw: &RawLocation) -> Option<LocationRecord> {
    match raw {
        RawLocation::Record(record) => Some(record.clone()),
        RawLocation::Mapping(map) => Some(LocationRecord {
            name: string_field(map, "name"),
            geonameid: id_field(map, "geonameid"),
            feature_type: string_field(map, "feature_type"),
            latitude: float_field(map, "latitude"),
            longitude: float_field(map, "longitude"),
            elevation: float_field(map, "elevation"),
            population: count_field(map, "population"),
            admin2_name: string_field(map, "admin2_name"),
            admin1_name: string_field(map, "admin1_name"),
            country_name: string_field(map, "country_name"),
        }),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Gazetteer ids arrive as strings or integers depending on the backend.
fn id_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn float_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

fn count_field(map: &Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}
