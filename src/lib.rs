//! # geojson-features
//!
//! A library for serializing heterogeneous data records into `GeoJSON`
//! feature collections.
//!
//! This crate takes the rows a spatial query hands back, model-like
//! objects or plain field/value mappings, and assembles them into one
//! RFC 7946-compatible `FeatureCollection` document with optional legacy
//! `crs` and `bbox` blocks, ready for a web-mapping tile service to
//! deliver.
//!
//! ## Features
//!
//! - One designated geometry field per record, accepted as structured
//!   [`geo::Geometry`], WKT, WKB or `GeoJSON` geometry text
//! - Property selection and renaming, identifier resolution and
//!   natural-key handling for related records
//! - Encoding through a geometry-aware serde encoder, to a string or to
//!   any [`std::io::Write`] sink
//!
//! ## Main Components
//!
//! - [`record::Record`] - Uniform adapter over the two record shapes
//! - [`config::SerializerConfig`] - Immutable per-call options
//! - [`collector::to_feature_collection`] - Assembles the document
//! - [`to_string`] / [`to_writer`] - Assemble and encode in one call
//! - [`error::Error`] - Custom error types for the library
//!
//! ## Example
//!
//! ```rust
//! use geojson_features::{GeomValue, Record, SerializerConfig, ValueRecord};
//!
//! let city = ValueRecord::new()
//!     .field("id", 1_i64)
//!     .field("name", "Berlin")
//!     .field("boundary", GeomValue::Wkt("POINT (13.4 52.5)".into()))
//!     .primary_key("id");
//!
//! let config = SerializerConfig::new()
//!     .geometry_field("boundary")
//!     .properties(["name"]);
//!
//! let geojson = geojson_features::to_string([Record::Values(&city)], &config).unwrap();
//!
//! assert!(geojson.starts_with(r#"{"type":"FeatureCollection""#));
//! assert!(geojson.contains(r#""coordinates":[13.4,52.5]"#));
//! assert!(geojson.contains(r#""properties":{"name":"Berlin"}"#));
//! ```
//!
//! ## Modules
//!
//! - [`collector`] - Feature collection assembly
//! - [`config`] - Serialization options
//! - [`error`] - Error types and handling
//! - [`record`] - The record adapter
//! - [`ser`] - The geometry-aware encoder

pub mod collector;
pub mod config;
pub mod error;
#[allow(clippy::module_name_repetitions)]
pub mod record;
pub mod ser;

pub use collector::{to_feature_collection, to_string, to_writer, Crs, Feature, FeatureCollection};
pub use config::{PrimaryKey, Properties, SerializerConfig};
pub use error::{Error, Result};
pub use record::{
    FeatureRecord, FieldDef, FieldKind, FieldValue, GeomValue, Record, RelatedRecord, Scalar,
    ValueRecord,
};
