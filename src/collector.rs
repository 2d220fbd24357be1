//! Feature collection assembly.
//!
//! [`to_feature_collection`] walks an ordered sequence of records into an
//! in-memory [`FeatureCollection`]; [`to_string`] and [`to_writer`] encode
//! that document through the geometry-aware encoder in [`crate::ser`]. The
//! accumulator lives on a per-call [`FeatureCollector`], so independent
//! calls never share state.
//!
//! # Example
//!
//! ```rust
//! use geojson_features::{to_feature_collection, Record, SerializerConfig, ValueRecord};
//!
//! let rows = [
//!     ValueRecord::new()
//!         .field("name", "Tiergarten")
//!         .field("area", "POLYGON ((0 0, 2 0, 2 1, 0 1, 0 0))"),
//!     ValueRecord::new()
//!         .field("name", "Tempelhofer Feld")
//!         .field("area", "POINT (13.4 52.47)"),
//! ];
//!
//! let config = SerializerConfig::new().geometry_field("area");
//! let collection =
//!     to_feature_collection(rows.iter().map(Record::Values), &config).unwrap();
//!
//! assert_eq!(collection.features.len(), 2);
//! assert_eq!(collection.features[0].properties["name"], "Tiergarten");
//! ```

use geo::Geometry;
use geozero::error::GeozeroError;
use hashbrown::HashMap;
use log::{debug, trace};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{PrimaryKey, Properties, SerializerConfig};
use crate::error::{Error, Result};
use crate::record::{FieldKind, FieldValue, GeomValue, Record, RelatedRecord, Scalar};
use crate::ser::ScalarSerializer;

/// One assembled feature: resolved identifier, filtered properties and the
/// parsed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

/// The assembled document, in input record order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub crs: Option<Crs>,
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<Feature>,
}

/// Legacy CRS link object carried for pre-RFC 7946 consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crs {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: CrsProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsProperties {
    pub href: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Crs {
    /// Builds the spatialreference.org link for an EPSG code.
    #[must_use]
    pub fn from_srid(srid: &str) -> Self {
        Self {
            kind: String::from("link"),
            properties: CrsProperties {
                href: format!("http://spatialreference.org/ref/epsg/{srid}/"),
                kind: String::from("proj4"),
            },
        }
    }
}

/// Per-call accumulator walking records into features.
struct FeatureCollector<'a> {
    config: &'a SerializerConfig,
    features: Vec<Feature>,
}

impl<'a> FeatureCollector<'a> {
    fn new(config: &'a SerializerConfig) -> Self {
        Self {
            config,
            features: Vec::new(),
        }
    }

    /// Checks every explicitly requested field name against the record
    /// schema before any feature is built.
    fn validate(&self, record: &Record<'_>) -> Result<()> {
        let fields = record.fields();
        let known = |name: &str| fields.iter().any(|field| field.name == name);

        if let Some(geometry_field) = &self.config.geometry_field {
            if !known(geometry_field) {
                return Err(Error::UnknownField {
                    field: geometry_field.clone(),
                });
            }
        }
        let requested: Vec<&String> = match &self.config.properties {
            Some(Properties::Fields(names)) => names.iter().collect(),
            Some(Properties::Rename(renames)) => renames.keys().collect(),
            None => Vec::new(),
        };
        for name in requested {
            if !known(name) {
                return Err(Error::UnknownField {
                    field: name.clone(),
                });
            }
        }
        Ok(())
    }

    fn collect(&mut self, record: &Record<'_>) -> Result<()> {
        let id = self.resolve_id(record)?;
        let pk_field = record.primary_key_field();
        let mut geometry = None;
        let mut staged: HashMap<String, Value> = HashMap::new();

        for field in record.fields() {
            let is_geometry_field =
                self.config.geometry_field.as_deref() == Some(field.name.as_str());
            if !field.serialize && !is_geometry_field {
                continue;
            }
            // The primary key already lives in the feature id.
            if pk_field == Some(field.name.as_str()) && !is_geometry_field {
                continue;
            }
            let Some(value) = record.get(&field.name) else {
                continue;
            };
            if is_geometry_field {
                if geometry.is_none() {
                    geometry = parse_geometry(&field.name, value)?;
                }
                continue;
            }
            match (&field.kind, value) {
                (FieldKind::ForeignKey { remote_field }, FieldValue::Related(target)) => {
                    staged.insert(field.name, resolve_related(self.config, target, remote_field)?);
                }
                (FieldKind::ManyToMany { auto_through }, FieldValue::RelatedMany(targets)) => {
                    if *auto_through {
                        staged.insert(field.name, resolve_related_many(self.config, &targets)?);
                    }
                }
                (_, FieldValue::Scalar(scalar)) => {
                    staged.insert(field.name, scalar_value(&scalar)?);
                }
                // Geometry outside the designated field and relations on
                // scalar-declared fields have no property representation.
                (_, FieldValue::Geometry(_) | FieldValue::Related(_) | FieldValue::RelatedMany(_)) => {}
            }
        }

        let properties = self.filter_properties(staged);
        trace!("assembled feature {}", self.features.len());
        self.features.push(Feature {
            id,
            properties,
            geometry,
        });
        Ok(())
    }

    /// Identifier priority: configured resolver, then configured field
    /// name, then the record's own primary key.
    fn resolve_id(&self, record: &Record<'_>) -> Result<Option<Value>> {
        let scalar = match &self.config.primary_key {
            Some(PrimaryKey::Resolver(resolver)) => {
                return Ok(resolver(record).filter(|value| !value.is_null()));
            }
            Some(PrimaryKey::Field(name)) => match record.get(name) {
                Some(FieldValue::Scalar(scalar)) => Some(scalar),
                _ => None,
            },
            None => record.primary_key(),
        };
        match scalar {
            None | Some(Scalar::Null) => Ok(None),
            Some(scalar) => scalar_value(&scalar).map(Some),
        }
    }

    fn filter_properties(&self, mut staged: HashMap<String, Value>) -> Map<String, Value> {
        let mut properties = Map::new();
        match &self.config.properties {
            Some(Properties::Fields(names)) => {
                for name in names {
                    if let Some(value) = staged.remove(name) {
                        properties.insert(name.clone(), value);
                    }
                }
            }
            Some(Properties::Rename(renames)) => {
                for (name, renamed) in renames {
                    if let Some(value) = staged.remove(name) {
                        properties.insert(renamed.clone(), value);
                    }
                }
            }
            None => {
                for (name, value) in staged {
                    properties.insert(name, value);
                }
            }
        }
        properties
    }
}

/// Routes a geometry field's raw value through geometry parsing. Null
/// stays null; plain strings and byte blobs are treated as encoded
/// geometry text respectively WKB.
fn parse_geometry(field: &str, value: FieldValue<'_>) -> Result<Option<Geometry>> {
    let raw = match value {
        FieldValue::Geometry(raw) => raw,
        FieldValue::Scalar(Scalar::Null) => return Ok(None),
        FieldValue::Scalar(Scalar::String(text) | Scalar::Json(text)) => GeomValue::from_text(text),
        FieldValue::Scalar(Scalar::Binary(bytes)) => GeomValue::Wkb(bytes),
        FieldValue::Scalar(other) => {
            return Err(Error::GeometryParse {
                field: field.to_string(),
                value: other.to_string(),
                source: GeozeroError::Geometry(String::from("value is not a geometry")),
            })
        }
        FieldValue::Related(_) | FieldValue::RelatedMany(_) => {
            return Err(Error::GeometryParse {
                field: field.to_string(),
                value: String::from("<related record>"),
                source: GeozeroError::Geometry(String::from("value is not a geometry")),
            })
        }
    };
    match raw.to_geometry() {
        Ok(geometry) => Ok(Some(geometry)),
        Err(source) => Err(Error::GeometryParse {
            field: field.to_string(),
            value: raw.to_string(),
            source,
        }),
    }
}

/// To-one resolution: absent targets encode as null; otherwise the natural
/// key when enabled and supported, the primary key when the relation points
/// at it, or the string-coerced remote field value.
fn resolve_related(
    config: &SerializerConfig,
    target: Option<&dyn RelatedRecord>,
    remote_field: &str,
) -> Result<Value> {
    let Some(related) = target else {
        return Ok(Value::Null);
    };
    if config.use_natural_keys {
        if let Some(key) = related.natural_key() {
            return natural_key_value(&key);
        }
    }
    if remote_field == related.primary_key_field() {
        scalar_value(&related.primary_key())
    } else {
        match related.get(remote_field) {
            None | Some(Scalar::Null) => Ok(Value::Null),
            Some(scalar) => Ok(Value::String(scalar.to_string())),
        }
    }
}

/// To-many resolution: natural keys when enabled and supported, otherwise
/// stringified primary keys, kept in the relation's iteration order.
fn resolve_related_many(
    config: &SerializerConfig,
    targets: &[&dyn RelatedRecord],
) -> Result<Value> {
    let mut values = Vec::with_capacity(targets.len());
    for related in targets {
        if config.use_natural_keys {
            if let Some(key) = related.natural_key() {
                values.push(natural_key_value(&key)?);
                continue;
            }
        }
        values.push(Value::String(related.primary_key().to_string()));
    }
    Ok(Value::Array(values))
}

fn natural_key_value(key: &[Scalar]) -> Result<Value> {
    let parts = key.iter().map(scalar_value).collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(parts))
}

fn scalar_value(scalar: &Scalar) -> Result<Value> {
    serde_json::to_value(ScalarSerializer(scalar)).map_err(Error::from)
}

/// Assembles records into a [`FeatureCollection`] without encoding it.
///
/// Feature order equals input record order. Explicitly requested field
/// names are validated against the first record's schema before any
/// feature is built.
///
/// # Errors
///
/// Returns an error if a requested field name is unknown, a geometry value
/// cannot be parsed, or a property value cannot be encoded.
pub fn to_feature_collection<'a, I>(
    records: I,
    config: &SerializerConfig,
) -> Result<FeatureCollection>
where
    I: IntoIterator<Item = Record<'a>>,
{
    let mut collector = FeatureCollector::new(config);
    let mut records = records.into_iter();

    let crs = config.crs.then(|| Crs::from_srid(&config.srid));
    // Only the values after the first element of the first tuple are kept.
    let bbox = config
        .bbox
        .as_ref()
        .and_then(|tuples| tuples.first())
        .and_then(|tuple| tuple.get(1..))
        .map(<[f64]>::to_vec);

    if let Some(first) = records.next() {
        collector.validate(&first)?;
        collector.collect(&first)?;
        for record in records {
            collector.collect(&record)?;
        }
    }
    debug!("collected {} features", collector.features.len());

    Ok(FeatureCollection {
        crs,
        bbox,
        features: collector.features,
    })
}

/// Serializes records into a `GeoJSON` feature collection string.
///
/// # Errors
///
/// Returns an error under the same conditions as [`to_feature_collection`],
/// or when JSON encoding fails. Nothing is emitted on error.
pub fn to_string<'a, I>(records: I, config: &SerializerConfig) -> Result<String>
where
    I: IntoIterator<Item = Record<'a>>,
{
    let collection = to_feature_collection(records, config)?;
    serde_json::to_string(&collection).map_err(Error::from)
}

/// Serializes records as a `GeoJSON` feature collection into a caller-owned
/// sink. The document is fully assembled before the first byte is written,
/// so a failed call leaves the sink untouched.
///
/// # Errors
///
/// Returns an error under the same conditions as [`to_string`], or when the
/// sink rejects a write.
pub fn to_writer<'a, I, W>(records: I, config: &SerializerConfig, writer: W) -> Result<()>
where
    I: IntoIterator<Item = Record<'a>>,
    W: std::io::Write,
{
    let collection = to_feature_collection(records, config)?;
    serde_json::to_writer(writer, &collection).map_err(Error::from)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::record::{FeatureRecord, FieldDef, ValueRecord};

    struct Country {
        id: i64,
        code: String,
    }

    impl RelatedRecord for Country {
        fn primary_key_field(&self) -> &str {
            "id"
        }

        fn primary_key(&self) -> Scalar {
            Scalar::Int(self.id)
        }

        fn natural_key(&self) -> Option<Vec<Scalar>> {
            Some(vec![Scalar::String(self.code.clone())])
        }

        fn get(&self, field: &str) -> Option<Scalar> {
            match field {
                "id" => Some(Scalar::Int(self.id)),
                "code" => Some(Scalar::String(self.code.clone())),
                _ => None,
            }
        }
    }

    struct Landmark {
        id: i64,
    }

    impl RelatedRecord for Landmark {
        fn primary_key_field(&self) -> &str {
            "id"
        }

        fn primary_key(&self) -> Scalar {
            Scalar::Int(self.id)
        }

        fn get(&self, field: &str) -> Option<Scalar> {
            (field == "id").then(|| Scalar::Int(self.id))
        }
    }

    struct City {
        id: i64,
        name: String,
        population: i64,
        boundary: String,
    }

    impl City {
        fn new(id: i64, name: &str, population: i64, boundary: &str) -> Self {
            Self {
                id,
                name: name.into(),
                population,
                boundary: boundary.into(),
            }
        }
    }

    impl FeatureRecord for City {
        fn fields(&self) -> Vec<FieldDef> {
            vec![
                FieldDef::scalar("id"),
                FieldDef::scalar("name"),
                FieldDef::scalar("population"),
                FieldDef::geometry("boundary"),
            ]
        }

        fn get(&self, field: &str) -> Option<FieldValue<'_>> {
            match field {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.clone().into()),
                "population" => Some(self.population.into()),
                "boundary" => Some(GeomValue::Wkt(self.boundary.clone()).into()),
                _ => None,
            }
        }

        fn primary_key_field(&self) -> Option<&str> {
            Some("id")
        }
    }

    struct Shop {
        id: i64,
        owner: Option<Country>,
        remote: &'static str,
    }

    impl FeatureRecord for Shop {
        fn fields(&self) -> Vec<FieldDef> {
            vec![
                FieldDef::scalar("id"),
                FieldDef::foreign_key("owner", self.remote),
            ]
        }

        fn get(&self, field: &str) -> Option<FieldValue<'_>> {
            match field {
                "id" => Some(self.id.into()),
                "owner" => Some(FieldValue::Related(
                    self.owner.as_ref().map(|owner| owner as &dyn RelatedRecord),
                )),
                _ => None,
            }
        }

        fn primary_key_field(&self) -> Option<&str> {
            Some("id")
        }
    }

    struct Route {
        id: i64,
        stops: Vec<Box<dyn RelatedRecord>>,
        explicit_through: bool,
    }

    impl FeatureRecord for Route {
        fn fields(&self) -> Vec<FieldDef> {
            let stops = if self.explicit_through {
                FieldDef::many_to_many("stops").explicit_through()
            } else {
                FieldDef::many_to_many("stops")
            };
            vec![FieldDef::scalar("id"), stops]
        }

        fn get(&self, field: &str) -> Option<FieldValue<'_>> {
            match field {
                "id" => Some(self.id.into()),
                "stops" => Some(FieldValue::RelatedMany(
                    self.stops.iter().map(AsRef::as_ref).collect(),
                )),
                _ => None,
            }
        }

        fn primary_key_field(&self) -> Option<&str> {
            Some("id")
        }
    }

    fn document<'a, I>(records: I, config: &SerializerConfig) -> Value
    where
        I: IntoIterator<Item = Record<'a>>,
    {
        serde_json::from_str(&to_string(records, config).unwrap()).unwrap()
    }

    #[test]
    fn features_follow_record_order() {
        let cities = [
            City::new(1, "A", 10, "POINT (0 0)"),
            City::new(2, "B", 20, "POINT (1 1)"),
            City::new(3, "C", 30, "POINT (2 2)"),
        ];
        let config = SerializerConfig::new().geometry_field("boundary");
        let collection = to_feature_collection(
            cities.iter().map(|city| Record::Object(city)),
            &config,
        )
        .unwrap();

        assert_eq!(collection.features.len(), cities.len());
        for (feature, city) in collection.features.iter().zip(&cities) {
            assert_eq!(feature.id, Some(json!(city.id)));
            assert_eq!(feature.properties["name"], json!(city.name));
        }
    }

    #[test]
    fn wkt_polygon_projects_to_geojson() {
        let city = City::new(1, "A", 10, "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))");
        let config = SerializerConfig::new().geometry_field("boundary");
        let doc = document([Record::Object(&city)], &config);

        assert_eq!(
            doc["features"][0]["geometry"],
            json!({
                "type": "Polygon",
                "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]],
            })
        );
    }

    #[test]
    fn malformed_wkt_aborts_serialization() {
        let city = City::new(1, "A", 10, "POINT (bogus");
        let config = SerializerConfig::new().geometry_field("boundary");

        let mut sink = Vec::new();
        let err = to_writer([Record::Object(&city)], &config, &mut sink).unwrap_err();
        match err {
            Error::GeometryParse { field, value, .. } => {
                assert_eq!(field, "boundary");
                assert!(value.contains("POINT (bogus"));
            }
            other => panic!("expected a geometry parse error, got {other:?}"),
        }
        assert!(sink.is_empty(), "no partial document may reach the sink");
    }

    #[test]
    fn repeated_serialization_is_byte_identical() -> anyhow::Result<()> {
        let cities = [
            City::new(1, "A", 10, "POINT (0 0)"),
            City::new(2, "B", 20, "POINT (1 1)"),
        ];
        let config = SerializerConfig::new()
            .geometry_field("boundary")
            .rename_properties([("name", "label"), ("population", "pop")]);

        let first = to_string(cities.iter().map(|city| Record::Object(city)), &config)?;
        let second = to_string(cities.iter().map(|city| Record::Object(city)), &config)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn rename_filters_to_mapped_fields_only() {
        let row = ValueRecord::new().field("pop", 42_i64).field("name", "A");
        let config = SerializerConfig::new().rename_properties([("pop", "population")]);
        let collection = to_feature_collection([Record::Values(&row)], &config).unwrap();

        let properties = &collection.features[0].properties;
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["population"], json!(42));
    }

    #[test]
    fn configured_primary_key_beats_record_primary_key() {
        let city = City::new(1, "A", 3_500_000, "POINT (0 0)");
        let config = SerializerConfig::new()
            .geometry_field("boundary")
            .primary_key_field("population");
        let collection = to_feature_collection([Record::Object(&city)], &config).unwrap();

        assert_eq!(collection.features[0].id, Some(json!(3_500_000)));
    }

    #[test]
    fn custom_id_resolver_wins_over_everything() {
        let city = City::new(1, "A", 10, "POINT (0 0)");
        let config = SerializerConfig::new()
            .geometry_field("boundary")
            .primary_key_with(|record| match record.get("name") {
                Some(FieldValue::Scalar(Scalar::String(name))) => {
                    Some(Value::String(format!("city-{name}")))
                }
                _ => None,
            });
        let collection = to_feature_collection([Record::Object(&city)], &config).unwrap();

        assert_eq!(collection.features[0].id, Some(json!("city-A")));
    }

    #[test]
    fn disabled_crs_omits_the_key() {
        let city = City::new(1, "A", 10, "POINT (0 0)");
        let config = SerializerConfig::new().geometry_field("boundary").crs(false);
        let doc = document([Record::Object(&city)], &config);

        assert!(!doc.as_object().unwrap().contains_key("crs"));
    }

    #[test]
    fn point_feature_document() {
        let row = ValueRecord::new()
            .field("id", 1_i64)
            .field("name", "A")
            .field("geom", "POINT (1 2)")
            .primary_key("id");
        let config = SerializerConfig::new()
            .geometry_field("geom")
            .properties(["name"]);
        let doc = document([Record::Values(&row)], &config);

        assert_eq!(
            doc,
            json!({
                "type": "FeatureCollection",
                "crs": {
                    "type": "link",
                    "properties": {
                        "href": "http://spatialreference.org/ref/epsg/4326/",
                        "type": "proj4",
                    },
                },
                "features": [{
                    "type": "Feature",
                    "id": 1,
                    "properties": {"name": "A"},
                    "geometry": {"type": "Point", "coordinates": [1, 2]},
                }],
            })
        );
    }

    #[test]
    fn many_to_many_keeps_iteration_order() {
        let route = Route {
            id: 1,
            stops: vec![
                Box::new(Landmark { id: 30 }),
                Box::new(Landmark { id: 10 }),
                Box::new(Landmark { id: 20 }),
            ],
            explicit_through: false,
        };
        let collection = to_feature_collection([Record::Object(&route)], &SerializerConfig::new())
            .unwrap();

        assert_eq!(
            collection.features[0].properties["stops"],
            json!(["30", "10", "20"])
        );
    }

    #[test]
    fn many_to_many_prefers_natural_keys_when_enabled() {
        let route = Route {
            id: 1,
            stops: vec![
                Box::new(Country { id: 1, code: "de".into() }),
                Box::new(Country { id: 2, code: "fr".into() }),
            ],
            explicit_through: false,
        };
        let config = SerializerConfig::new().use_natural_keys(true);
        let collection = to_feature_collection([Record::Object(&route)], &config).unwrap();

        assert_eq!(
            collection.features[0].properties["stops"],
            json!([["de"], ["fr"]])
        );
    }

    #[test]
    fn explicitly_joined_relations_are_skipped() {
        let route = Route {
            id: 1,
            stops: vec![Box::new(Landmark { id: 30 })],
            explicit_through: true,
        };
        let collection = to_feature_collection([Record::Object(&route)], &SerializerConfig::new())
            .unwrap();

        assert!(collection.features[0].properties.is_empty());
    }

    #[test]
    fn absent_relation_resolves_to_null() {
        let shop = Shop { id: 1, owner: None, remote: "id" };
        let collection = to_feature_collection([Record::Object(&shop)], &SerializerConfig::new())
            .unwrap();

        assert_eq!(collection.features[0].properties["owner"], Value::Null);
    }

    #[test]
    fn relation_on_primary_key_resolves_to_the_key() {
        let shop = Shop {
            id: 1,
            owner: Some(Country { id: 49, code: "de".into() }),
            remote: "id",
        };
        let collection = to_feature_collection([Record::Object(&shop)], &SerializerConfig::new())
            .unwrap();

        assert_eq!(collection.features[0].properties["owner"], json!(49));
    }

    #[test]
    fn relation_on_other_field_is_string_coerced() {
        let shop = Shop {
            id: 1,
            owner: Some(Country { id: 49, code: "de".into() }),
            remote: "code",
        };
        let collection = to_feature_collection([Record::Object(&shop)], &SerializerConfig::new())
            .unwrap();

        assert_eq!(collection.features[0].properties["owner"], json!("de"));
    }

    #[test]
    fn relation_uses_natural_key_when_enabled() {
        let shop = Shop {
            id: 1,
            owner: Some(Country { id: 49, code: "de".into() }),
            remote: "id",
        };
        let config = SerializerConfig::new().use_natural_keys(true);
        let collection = to_feature_collection([Record::Object(&shop)], &config).unwrap();

        assert_eq!(collection.features[0].properties["owner"], json!(["de"]));
    }

    #[test]
    fn bbox_keeps_tail_of_first_tuple() {
        let city = City::new(1, "A", 10, "POINT (0 0)");
        let config = SerializerConfig::new()
            .geometry_field("boundary")
            .bbox(vec![vec![9.0, 1.0, 2.0, 3.0], vec![7.0, 7.0, 7.0, 7.0]]);
        let doc = document([Record::Object(&city)], &config);

        assert_eq!(doc["bbox"], json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn record_primary_key_stays_out_of_properties() {
        let city = City::new(1, "A", 10, "POINT (0 0)");
        let config = SerializerConfig::new().geometry_field("boundary");
        let collection = to_feature_collection([Record::Object(&city)], &config).unwrap();

        let properties = &collection.features[0].properties;
        assert!(!properties.contains_key("id"));
        assert!(!properties.contains_key("boundary"));
        assert_eq!(properties.len(), 2);
    }

    #[test]
    fn declared_unserializable_fields_never_appear() {
        struct Secretive;

        impl FeatureRecord for Secretive {
            fn fields(&self) -> Vec<FieldDef> {
                vec![
                    FieldDef::scalar("public"),
                    FieldDef::scalar("secret").skip_serialization(),
                ]
            }

            fn get(&self, field: &str) -> Option<FieldValue<'_>> {
                match field {
                    "public" => Some(1_i64.into()),
                    "secret" => Some("hidden".into()),
                    _ => None,
                }
            }
        }

        let collection =
            to_feature_collection([Record::Object(&Secretive)], &SerializerConfig::new()).unwrap();
        let properties = &collection.features[0].properties;
        assert!(properties.contains_key("public"));
        assert!(!properties.contains_key("secret"));
    }

    #[test]
    fn unknown_requested_field_is_rejected_up_front() {
        let city = City::new(1, "A", 10, "POINT (0 0)");

        let config = SerializerConfig::new().geometry_field("nope");
        let err = to_string([Record::Object(&city)], &config).unwrap_err();
        assert!(matches!(err, Error::UnknownField { field } if field == "nope"));

        let config = SerializerConfig::new()
            .geometry_field("boundary")
            .properties(["missing"]);
        let err = to_string([Record::Object(&city)], &config).unwrap_err();
        assert!(matches!(err, Error::UnknownField { field } if field == "missing"));
    }

    #[test]
    fn empty_record_sequence_keeps_the_envelope() {
        let doc = document(std::iter::empty::<Record<'_>>(), &SerializerConfig::new());

        assert_eq!(doc["features"], json!([]));
        assert_eq!(doc["crs"]["properties"]["href"], json!("http://spatialreference.org/ref/epsg/4326/"));
    }

    #[test]
    fn missing_geometry_designation_yields_null_geometry() {
        let row = ValueRecord::new().field("name", "A");
        let doc = document([Record::Values(&row)], &SerializerConfig::new());

        assert_eq!(doc["features"][0]["geometry"], Value::Null);
    }
}
