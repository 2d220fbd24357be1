//! The geometry-aware encoder: generic JSON encoding through serde, with
//! one hook that substitutes a structured geometry's `GeoJSON` projection
//! for its generic structure encoding.

use geo::Geometry;
use geozero::ToJson;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::{self, SerializeMap};
use serde::Serialize;
use serde_json::Value;

use crate::collector::{Feature, FeatureCollection};
use crate::record::Scalar;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serializes a property scalar with the projections expected in the
/// output document: dates and times as formatted strings, decimals as
/// floats. Everything else keeps its JSON-native encoding.
pub struct ScalarSerializer<'a>(pub &'a Scalar);

impl ser::Serialize for ScalarSerializer<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match &self.0 {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(val) => serializer.serialize_bool(*val),
            Scalar::Int(val) => serializer.serialize_i64(*val),
            Scalar::UInt(val) => serializer.serialize_u64(*val),
            Scalar::Float(val) => serializer.serialize_f32(*val),
            Scalar::Double(val) => serializer.serialize_f64(*val),
            Scalar::Decimal(val) => {
                let float = val
                    .to_f64()
                    .ok_or_else(|| ser::Error::custom("decimal does not fit a float"))?;
                serializer.serialize_f64(float)
            }
            Scalar::String(val) | Scalar::Json(val) => serializer.serialize_str(val),
            Scalar::Date(val) => serializer.serialize_str(&val.format(DATE_FORMAT).to_string()),
            Scalar::Time(val) => serializer.serialize_str(&val.format(TIME_FORMAT).to_string()),
            Scalar::DateTime(val) => {
                serializer.serialize_str(&val.format(DATETIME_FORMAT).to_string())
            }
            Scalar::Binary(val) => serializer.serialize_bytes(val),
        }
    }
}

/// Serializes a structured geometry as its `GeoJSON` geometry object.
pub struct GeometrySerializer<'a>(pub &'a Geometry);

impl ser::Serialize for GeometrySerializer<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let json = self.0.to_json().map_err(ser::Error::custom)?;
        let value: Value = serde_json::from_str(&json).map_err(ser::Error::custom)?;
        value.serialize(serializer)
    }
}

impl ser::Serialize for Feature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Feature")?;
        // An absent identifier omits the key, it never encodes as null.
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        map.serialize_entry("properties", &self.properties)?;
        match &self.geometry {
            Some(geometry) => map.serialize_entry("geometry", &GeometrySerializer(geometry))?,
            None => map.serialize_entry("geometry", &Value::Null)?,
        }
        map.end()
    }
}

impl ser::Serialize for FeatureCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "FeatureCollection")?;
        if let Some(crs) = &self.crs {
            map.serialize_entry("crs", crs)?;
        }
        if let Some(bbox) = &self.bbox {
            map.serialize_entry("bbox", bbox)?;
        }
        map.serialize_entry("features", &self.features)?;
        map.end()
    }
}
