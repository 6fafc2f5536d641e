//! The record encoders, one per [`FormatTag`].
//!
//! An encoder turns one raw JSON record into a key/value pair of
//! [`Payload`](feed_types::Payload)s. It never talks to Kafka or to the schema
//! registry: envelope formats produce structured payloads, and the serializer
//! downstream registers schemas and writes the wire bytes.

mod envelope;
mod malformed;
mod plain;

pub use envelope::{AvroEncoder, InvalidJsonEncoder, JsonSchemaEncoder, ProtobufEncoder};
pub use malformed::MalformedEncoder;
pub use plain::{JsonEncoder, TextEncoder, XmlEncoder};

use feed_types::{EncodeError, EncodedRecord, FormatTag, Result};
use serde_json::Value;

/// Encodes raw records for one format.
pub trait Encoder: Send + Sync {
    /// The format this encoder implements.
    fn format(&self) -> FormatTag;

    /// Encode one raw record into a key/value pair.
    fn encode(&self, record: &str) -> Result<EncodedRecord>;
}

pub(crate) fn parse_record(record: &str) -> Result<Value> {
    Ok(serde_json::from_str(record)?)
}

/// Read the string at `properties.<name>`.
pub(crate) fn property<'a>(json: &'a Value, name: &str) -> Result<&'a str> {
    json.get("properties")
        .and_then(|properties| properties.get(name))
        .and_then(Value::as_str)
        .ok_or_else(|| EncodeError::MissingField(format!("properties.{name}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    /// A geocoder feature as returned by the address API.
    pub fn rivoli() -> Value {
        json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [2.356, 48.856]},
            "properties": {
                "label": "10 Rue de Rivoli 75004 Paris",
                "score": 0.97,
                "housenumber": "10",
                "id": "75104_8158_00010",
                "name": "10 Rue de Rivoli",
                "postcode": "75004",
                "citycode": "75104",
                "x": 652989.72,
                "y": 6862006.15,
                "city": "Paris",
                "district": "Paris 4e Arrondissement",
                "context": "75, Paris, Île-de-France",
                "type": "housenumber",
                "importance": 0.68,
                "street": "Rue de Rivoli"
            }
        })
    }

    pub fn rivoli_text() -> String {
        rivoli().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_lookup() {
        let json = json!({"properties": {"label": "Paris", "score": 1.0}});
        assert_eq!(property(&json, "label").unwrap(), "Paris");
        assert!(matches!(
            property(&json, "score"),
            Err(EncodeError::MissingField(f)) if f == "properties.score"
        ));
        assert!(property(&json!({}), "label").is_err());
    }

    #[test]
    fn test_parse_record_rejects_garbage() {
        assert!(matches!(
            parse_record("{not json"),
            Err(EncodeError::Parse(_))
        ));
    }
}
