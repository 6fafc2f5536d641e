//! Error types for encoding records.

use thiserror::Error;

/// Errors raised while turning one raw record into an encoded key/value pair.
///
/// Every variant is scoped to a single record: the publish pipeline logs it
/// and moves on to the next record.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Record is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error(transparent)]
    Schema(#[from] SchemaLoadError),

    #[error("XML rendering error: {0}")]
    Xml(String),

    #[error("Protobuf parse error: {0}")]
    ProtobufParse(String),

    #[error("Protobuf encoding error: {0}")]
    ProtobufEncode(String),

    #[error("Protobuf decoding error: {0}")]
    ProtobufDecode(String),
}

/// Errors raised while loading a schema document.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    #[error("Schema resource '{path}' could not be read: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema resource '{path}' is invalid: {message}")]
    Invalid { path: String, message: String },
}

/// Result type alias for encoding operations.
pub type Result<T> = std::result::Result<T, EncodeError>;
