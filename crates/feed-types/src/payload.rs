//! Encoded key/value payloads.

use crate::proto::ProtoMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One side (key or value) of an encoded record.
///
/// The variant decides which serializer can accept it: `Text` goes to the
/// string serializer, `Bytes` to the byte-array serializer, and the three
/// structured variants to their schema-registry serializers.
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
    JsonSchema(JsonSchemaEnvelope),
    Avro(AvroRecord),
    Protobuf(ProtobufRecord),
}

impl Payload {
    /// Short name of the variant, used in logs and mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Bytes(_) => "bytes",
            Payload::JsonSchema(_) => "json-schema",
            Payload::Avro(_) => "avro",
            Payload::Protobuf(_) => "protobuf",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_json_schema(&self) -> Option<&JsonSchemaEnvelope> {
        match self {
            Payload::JsonSchema(envelope) => Some(envelope),
            _ => None,
        }
    }

    pub fn as_avro(&self) -> Option<&AvroRecord> {
        match self {
            Payload::Avro(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_protobuf(&self) -> Option<&ProtobufRecord> {
        match self {
            Payload::Protobuf(record) => Some(record),
            _ => None,
        }
    }
}

/// A JSON payload coupled with the JSON-Schema it claims to follow.
///
/// The serializer registers `schema` and writes `payload` as JSON text.
/// Nothing here checks that the payload actually validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaEnvelope {
    pub schema: serde_json::Value,
    pub payload: serde_json::Value,
}

impl JsonSchemaEnvelope {
    pub fn new(schema: serde_json::Value, payload: serde_json::Value) -> Self {
        Self { schema, payload }
    }
}

/// An Avro value resolved against its schema, ready for binary encoding.
#[derive(Debug, Clone)]
pub struct AvroRecord {
    /// Schema document as loaded, registered verbatim.
    pub schema_text: Arc<str>,
    pub schema: apache_avro::Schema,
    pub value: apache_avro::types::Value,
}

/// A dynamic protobuf message plus the `.proto` text it was built from.
#[derive(Debug, Clone)]
pub struct ProtobufRecord {
    /// `.proto` document as loaded, registered verbatim.
    pub schema_text: Arc<str>,
    /// Message indexes of `message` within the schema (first message is `[0]`).
    pub message_indexes: Vec<i32>,
    pub message: ProtoMessage,
}

/// Encoder output: a key and a value, each independently serialized.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    pub key: Payload,
    pub value: Payload,
}

impl EncodedRecord {
    pub fn new(key: Payload, value: Payload) -> Self {
        Self { key, value }
    }
}
