//! The record adapter: one uniform field surface over the two record shapes
//! the serializer accepts.
//!
//! Records come in as either attribute-bearing objects implementing
//! [`FeatureRecord`] (with a declared schema, an optional conventional
//! primary key and relational fields) or as plain [`ValueRecord`] mappings,
//! the shape produced by relational "values" projections. [`Record`] tags
//! the shape once and every later lookup goes through it.
//!
//! # Example
//!
//! ```rust
//! use geojson_features::{FieldValue, GeomValue, Record, Scalar, ValueRecord};
//!
//! let row = ValueRecord::new()
//!     .field("id", 7_i64)
//!     .field("name", "Rotes Rathaus")
//!     .field("location", GeomValue::Wkt("POINT (13.408 52.518)".into()))
//!     .primary_key("id");
//!
//! let record = Record::Values(&row);
//! assert_eq!(record.primary_key(), Some(Scalar::Int(7)));
//! assert!(matches!(
//!     record.get("location"),
//!     Some(FieldValue::Geometry(GeomValue::Wkt(_)))
//! ));
//! ```

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use geo::Geometry;
use geozero::error::GeozeroError;
use geozero::geojson::GeoJson;
use geozero::wkb::Wkb;
use geozero::wkt::WktStr;
use geozero::ToGeo;
use rust_decimal::Decimal;

use crate::ser::{DATE_FORMAT, DATETIME_FORMAT, TIME_FORMAT};

/// A single attribute value with no geometry or relational meaning.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    /// Pre-encoded JSON text, passed through as a string.
    Json(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

impl fmt::Display for Scalar {
    #[allow(clippy::match_same_arms)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(val) => write!(f, "{val}"),
            Self::Int(val) => write!(f, "{val}"),
            Self::UInt(val) => write!(f, "{val}"),
            Self::Float(val) => write!(f, "{val}"),
            Self::Double(val) => write!(f, "{val}"),
            Self::Decimal(val) => write!(f, "{val}"),
            Self::String(val) | Self::Json(val) => f.write_str(val),
            Self::Date(val) => write!(f, "{}", val.format(DATE_FORMAT)),
            Self::Time(val) => write!(f, "{}", val.format(TIME_FORMAT)),
            Self::DateTime(val) => write!(f, "{}", val.format(DATETIME_FORMAT)),
            Self::Binary(val) => f.write_str(&String::from_utf8_lossy(val)),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A raw geometry value prior to parsing: either already structured, or one
/// of the text/binary encodings a record source may hand over.
#[derive(Debug, Clone, PartialEq)]
pub enum GeomValue {
    Geometry(Geometry),
    Wkt(String),
    Wkb(Vec<u8>),
    GeoJson(String),
}

impl GeomValue {
    /// Geometry text starting with a brace is a `GeoJSON` geometry object,
    /// anything else is treated as well-known text.
    pub(crate) fn from_text(text: String) -> Self {
        if text.trim_start().starts_with('{') {
            Self::GeoJson(text)
        } else {
            Self::Wkt(text)
        }
    }

    pub(crate) fn to_geometry(&self) -> Result<Geometry, GeozeroError> {
        match self {
            Self::Geometry(geom) => Ok(geom.clone()),
            Self::Wkt(text) => WktStr(text).to_geo(),
            Self::Wkb(bytes) => Wkb(bytes.clone()).to_geo(),
            Self::GeoJson(text) => GeoJson(text).to_geo(),
        }
    }
}

impl fmt::Display for GeomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry(_) => f.write_str("<geometry>"),
            Self::Wkt(text) | Self::GeoJson(text) => f.write_str(text),
            Self::Wkb(bytes) => write!(f, "<{} bytes of wkb>", bytes.len()),
        }
    }
}

/// What a record hands back for one of its fields.
#[derive(Clone)]
pub enum FieldValue<'a> {
    Scalar(Scalar),
    Geometry(GeomValue),
    /// A to-one relation, absent when the foreign key is unset.
    Related(Option<&'a dyn RelatedRecord>),
    /// A to-many relation, in the relation's own iteration order.
    RelatedMany(Vec<&'a dyn RelatedRecord>),
}

impl FieldValue<'_> {
    fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar(_) => FieldKind::Scalar,
            Self::Geometry(_) => FieldKind::Geometry,
            Self::Related(target) => FieldKind::ForeignKey {
                remote_field: match target {
                    Some(related) => related.primary_key_field().to_string(),
                    None => String::new(),
                },
            },
            Self::RelatedMany(_) => FieldKind::ManyToMany { auto_through: true },
        }
    }
}

impl From<Scalar> for FieldValue<'_> {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<GeomValue> for FieldValue<'_> {
    fn from(value: GeomValue) -> Self {
        Self::Geometry(value)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(value: i32) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<u64> for FieldValue<'_> {
    fn from(value: u64) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<&str> for FieldValue<'_> {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<String> for FieldValue<'_> {
    fn from(value: String) -> Self {
        Self::Scalar(value.into())
    }
}

/// How a declared field participates in serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar,
    Geometry,
    /// To-one relation; `remote_field` names the field on the target record
    /// the relation points at.
    ForeignKey { remote_field: String },
    /// To-many relation; `auto_through` is false when the join goes through
    /// an explicitly declared intermediate record, which excludes the field
    /// from serialization.
    ManyToMany { auto_through: bool },
}

/// One entry of a record's declared schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Fields declared as non-serializable never reach the output,
    /// independent of any property filter.
    pub serialize: bool,
}

impl FieldDef {
    #[must_use]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar,
            serialize: true,
        }
    }

    #[must_use]
    pub fn geometry(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Geometry,
            serialize: true,
        }
    }

    #[must_use]
    pub fn foreign_key(name: impl Into<String>, remote_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ForeignKey {
                remote_field: remote_field.into(),
            },
            serialize: true,
        }
    }

    #[must_use]
    pub fn many_to_many(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ManyToMany { auto_through: true },
            serialize: true,
        }
    }

    /// Marks the relation as joined through an explicitly declared
    /// intermediate record.
    #[must_use]
    pub fn explicit_through(mut self) -> Self {
        if let FieldKind::ManyToMany { ref mut auto_through } = self.kind {
            *auto_through = false;
        }
        self
    }

    /// Excludes the field from serialization entirely.
    #[must_use]
    pub fn skip_serialization(mut self) -> Self {
        self.serialize = false;
        self
    }
}

/// An attribute-bearing record with a declared schema.
pub trait FeatureRecord {
    /// Declared fields, in serialization order.
    fn fields(&self) -> Vec<FieldDef>;

    /// Looks a field value up by name.
    fn get(&self, field: &str) -> Option<FieldValue<'_>>;

    /// Name of the conventional primary-key field, when the record has one.
    fn primary_key_field(&self) -> Option<&str> {
        None
    }

    /// The conventional primary-key value.
    fn primary_key(&self) -> Option<Scalar> {
        match self.primary_key_field().and_then(|field| self.get(field)) {
            Some(FieldValue::Scalar(scalar)) => Some(scalar),
            _ => None,
        }
    }
}

/// The target of a relational field.
pub trait RelatedRecord {
    fn primary_key_field(&self) -> &str;

    fn primary_key(&self) -> Scalar;

    /// Natural-key projection. Records without one return `None`, which is
    /// how the serializer checks for the capability.
    fn natural_key(&self) -> Option<Vec<Scalar>> {
        None
    }

    /// Looks a plain field up by name.
    fn get(&self, field: &str) -> Option<Scalar>;
}

/// A mapping-shaped record: ordered field-name/value pairs, as produced by
/// relational "values" projections.
#[derive(Default)]
pub struct ValueRecord {
    entries: Vec<(String, FieldValue<'static>)>,
    primary_key_field: Option<String>,
}

impl ValueRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping insertion order.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue<'static>>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// Marks one of the fields as the record's primary key.
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key_field = Some(field.into());
        self
    }

    fn fields(&self) -> Vec<FieldDef> {
        self.entries
            .iter()
            .map(|(name, value)| FieldDef {
                name: name.clone(),
                kind: value.kind(),
                serialize: true,
            })
            .collect()
    }

    fn get(&self, field: &str) -> Option<&FieldValue<'static>> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// A record tagged with the shape it was supplied in. The shape is resolved
/// once here; everything downstream queries the uniform surface.
#[derive(Clone, Copy)]
pub enum Record<'a> {
    /// An attribute-bearing object with a declared schema.
    Object(&'a dyn FeatureRecord),
    /// A plain field-name/value mapping.
    Values(&'a ValueRecord),
}

impl<'a> Record<'a> {
    /// Declared fields, in serialization order.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldDef> {
        match self {
            Self::Object(record) => record.fields(),
            Self::Values(record) => record.fields(),
        }
    }

    /// Looks a field value up by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<FieldValue<'a>> {
        match self {
            Self::Object(record) => record.get(field),
            Self::Values(record) => record.get(field).cloned(),
        }
    }

    /// Name of the record's own primary-key field, when it has one.
    #[must_use]
    pub fn primary_key_field(&self) -> Option<&'a str> {
        match self {
            Self::Object(record) => record.primary_key_field(),
            Self::Values(record) => record.primary_key_field.as_deref(),
        }
    }

    /// The record's own primary-key value.
    #[must_use]
    pub fn primary_key(&self) -> Option<Scalar> {
        match self {
            Self::Object(record) => record.primary_key(),
            Self::Values(record) => {
                match record.primary_key_field.as_deref().and_then(|field| record.get(field)) {
                    Some(FieldValue::Scalar(scalar)) => Some(scalar.clone()),
                    _ => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn value_record_keeps_insertion_order() {
        let row = ValueRecord::new()
            .field("zebra", 1_i64)
            .field("apple", 2_i64)
            .field("outline", GeomValue::Wkt("POINT (0 0)".into()));

        let names: Vec<_> = row.fields().into_iter().map(|field| field.name).collect();
        assert_eq!(names, ["zebra", "apple", "outline"]);
        assert_eq!(
            row.fields()[2].kind,
            FieldKind::Geometry,
            "kind is derived from the stored value"
        );
    }

    #[test]
    fn record_adapter_resolves_both_shapes() {
        let row = ValueRecord::new().field("name", "A").primary_key("name");
        let record = Record::Values(&row);
        assert_eq!(record.primary_key_field(), Some("name"));
        assert_eq!(record.primary_key(), Some(Scalar::String("A".into())));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn geometry_text_classification() {
        assert!(matches!(
            GeomValue::from_text("POINT (1 2)".into()),
            GeomValue::Wkt(_)
        ));
        assert!(matches!(
            GeomValue::from_text(r#"  {"type":"Point","coordinates":[1,2]}"#.into()),
            GeomValue::GeoJson(_)
        ));
    }

    #[test]
    fn wkt_parses_into_geometry() {
        let geom = GeomValue::Wkt("POINT (1 2)".into()).to_geometry().unwrap();
        match geom {
            Geometry::Point(point) => {
                assert_relative_eq!(point.x(), 1.0);
                assert_relative_eq!(point.y(), 2.0);
            }
            _ => panic!("expected a point"),
        }
    }

    #[test]
    fn scalar_coercion_uses_encoder_formats() {
        let date = NaiveDate::from_ymd_opt(2014, 7, 8).unwrap();
        assert_eq!(Scalar::Date(date).to_string(), "2014-07-08");
        assert_eq!(Scalar::Int(42).to_string(), "42");
        assert_eq!(Scalar::Null.to_string(), "");
    }
}
