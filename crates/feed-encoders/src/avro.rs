//! JSON to Avro value conversion.

use apache_avro::types::Value as AvroValue;
use apache_avro::Schema;
use feed_types::{EncodeError, Result, SchemaLoadError};

/// Parse an Avro schema document, naming the resource on failure.
pub fn parse_schema(path: &str, text: &str) -> Result<Schema> {
    Schema::parse_str(text).map_err(|e| {
        EncodeError::Schema(SchemaLoadError::Invalid {
            path: path.to_string(),
            message: e.to_string(),
        })
    })
}

/// Resolve a JSON tree against `schema`.
///
/// Objects resolve to records field by field: members the schema does not
/// name are dropped, and absent fields take their declared default.
pub fn json_to_avro(json: serde_json::Value, schema: &Schema) -> Result<AvroValue> {
    AvroValue::from(json)
        .resolve(schema)
        .map_err(|e| EncodeError::Conversion(e.to_string()))
}
