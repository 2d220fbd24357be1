//! Serialization options, normalized once at call entry and immutable for
//! the rest of the pass.

use std::fmt;

use hashbrown::HashMap;
use serde_json::Value;

use crate::record::Record;

/// Property selection applied to every feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Properties {
    /// Keep only the named fields, under their original names.
    Fields(Vec<String>),
    /// Keep only the mapped fields, output under the mapped names.
    Rename(HashMap<String, String>),
}

/// How a feature's `id` is derived from its record.
pub enum PrimaryKey {
    /// Look the named field up on the record.
    Field(String),
    /// Apply a caller-supplied resolver to the record.
    Resolver(Box<dyn Fn(&Record<'_>) -> Option<Value> + Send + Sync>),
}

impl fmt::Debug for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Options for one serialization pass.
///
/// Built once through the consuming setters below and then only read;
/// nothing mutates a config mid-pass, so one value can drive any number of
/// independent calls.
///
/// ```rust
/// use geojson_features::SerializerConfig;
///
/// let config = SerializerConfig::new()
///     .geometry_field("boundary")
///     .rename_properties([("pop", "population")])
///     .srid("3857")
///     .crs(true);
/// ```
#[derive(Debug)]
pub struct SerializerConfig {
    pub(crate) geometry_field: Option<String>,
    pub(crate) properties: Option<Properties>,
    pub(crate) primary_key: Option<PrimaryKey>,
    pub(crate) use_natural_keys: bool,
    pub(crate) crs: bool,
    pub(crate) srid: String,
    pub(crate) bbox: Option<Vec<Vec<f64>>>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            geometry_field: None,
            properties: None,
            primary_key: None,
            use_natural_keys: false,
            crs: true,
            srid: String::from("4326"),
            bbox: None,
        }
    }
}

impl SerializerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the field holding each record's geometry.
    #[must_use]
    pub fn geometry_field(mut self, name: impl Into<String>) -> Self {
        self.geometry_field = Some(name.into());
        self
    }

    /// Keeps only the named fields as feature properties.
    #[must_use]
    pub fn properties<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(Properties::Fields(
            fields.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Keeps only the mapped fields, renaming each to its mapped name on
    /// output.
    #[must_use]
    pub fn rename_properties<I, S, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        self.properties = Some(Properties::Rename(
            fields
                .into_iter()
                .map(|(name, renamed)| (name.into(), renamed.into()))
                .collect(),
        ));
        self
    }

    /// Derives feature ids from the named field instead of the record's own
    /// primary key.
    #[must_use]
    pub fn primary_key_field(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(PrimaryKey::Field(name.into()));
        self
    }

    /// Derives feature ids with a caller-supplied resolver.
    #[must_use]
    pub fn primary_key_with<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Record<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.primary_key = Some(PrimaryKey::Resolver(Box::new(resolver)));
        self
    }

    /// Prefers natural keys over primary keys when resolving related
    /// records.
    #[must_use]
    pub fn use_natural_keys(mut self, enabled: bool) -> Self {
        self.use_natural_keys = enabled;
        self
    }

    /// Includes or omits the CRS block. Enabled by default.
    #[must_use]
    pub fn crs(mut self, enabled: bool) -> Self {
        self.crs = enabled;
        self
    }

    /// Spatial reference id used to build the CRS link. Defaults to 4326.
    #[must_use]
    pub fn srid(mut self, srid: impl Into<String>) -> Self {
        self.srid = srid.into();
        self
    }

    /// Precomputed bounding-box tuples.
    #[must_use]
    pub fn bbox(mut self, bbox: Vec<Vec<f64>>) -> Self {
        self.bbox = Some(bbox);
        self
    }
}
