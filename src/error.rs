use geozero::error::GeozeroError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A field name requested for properties or geometry is not part of the
    /// record schema.
    #[error("`{field}` is not a field on the serialized records.")]
    UnknownField { field: String },

    /// The designated geometry field held a value that could not be parsed
    /// into a geometry. The whole serialization is aborted.
    #[error("could not parse geometry from field `{field}`: {value}")]
    GeometryParse {
        field: String,
        value: String,
        #[source]
        source: GeozeroError,
    },

    #[error("JSON encoding failed.")]
    Json(#[from] serde_json::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
