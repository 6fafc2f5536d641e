//! Encoders whose payloads are framed with a registered schema id.

use super::{parse_record, Encoder};
use crate::avro::{json_to_avro, parse_schema};
use crate::proto::{json_to_message, ProtoParser};
use crate::random::RandomSource;
use crate::resources::{SchemaLoader, SchemaResource};
use feed_types::{
    AvroRecord, EncodeError, EncodedRecord, FormatTag, JsonSchemaEnvelope, Payload, ProtoSchema,
    ProtobufRecord, Result,
};
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

/// Value written into `updatedAt` by [`InvalidJsonEncoder`]; the value schema
/// declares the field as an integer.
pub const INVALID_UPDATED_AT: &str = "2007";

fn cached<T: Clone>(cell: &OnceLock<T>, init: impl FnOnce() -> Result<T>) -> Result<T> {
    if let Some(loaded) = cell.get() {
        return Ok(loaded.clone());
    }
    let loaded = init()?;
    Ok(cell.get_or_init(|| loaded).clone())
}

/// Wraps the record with the JSON-Schema documents it is meant to follow.
pub struct JsonSchemaEncoder {
    loader: Arc<SchemaLoader>,
    random: Arc<dyn RandomSource>,
}

impl JsonSchemaEncoder {
    pub fn new(loader: Arc<SchemaLoader>, random: Arc<dyn RandomSource>) -> Self {
        Self { loader, random }
    }

    fn wrap(&self, value: Value) -> Result<EncodedRecord> {
        let key_schema = self.loader.load_json(SchemaResource::JsonSchemaKey)?;
        let value_schema = self.loader.load_json(SchemaResource::JsonSchemaValue)?;

        Ok(EncodedRecord::new(
            Payload::JsonSchema(JsonSchemaEnvelope::new(
                key_schema,
                Value::String(self.random.generate_key()),
            )),
            Payload::JsonSchema(JsonSchemaEnvelope::new(value_schema, value)),
        ))
    }
}

impl Encoder for JsonSchemaEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::JsonSchema
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let json = parse_record(record)?;
        self.wrap(json)
    }
}

/// Like [`JsonSchemaEncoder`], but the value breaks its schema on purpose:
/// `updatedAt` is forced to a string.
pub struct InvalidJsonEncoder {
    inner: JsonSchemaEncoder,
}

impl InvalidJsonEncoder {
    pub fn new(loader: Arc<SchemaLoader>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            inner: JsonSchemaEncoder::new(loader, random),
        }
    }
}

impl Encoder for InvalidJsonEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::InvalidJson
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let mut json = parse_record(record)?;
        let object = json.as_object_mut().ok_or_else(|| {
            EncodeError::Conversion("Cannot set updatedAt on a non-object record".to_string())
        })?;
        object.insert(
            "updatedAt".to_string(),
            Value::String(INVALID_UPDATED_AT.to_string()),
        );
        self.inner.wrap(json)
    }
}

#[derive(Clone)]
struct LoadedAvro {
    text: Arc<str>,
    schema: apache_avro::Schema,
}

/// Resolves the record against the Avro value schema. The key is a small
/// record holding the generated id and a random boolean.
pub struct AvroEncoder {
    loader: Arc<SchemaLoader>,
    random: Arc<dyn RandomSource>,
    key_schema: OnceLock<Arc<LoadedAvro>>,
    value_schema: OnceLock<Arc<LoadedAvro>>,
}

impl AvroEncoder {
    pub fn new(loader: Arc<SchemaLoader>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            loader,
            random,
            key_schema: OnceLock::new(),
            value_schema: OnceLock::new(),
        }
    }

    fn schema(
        &self,
        resource: SchemaResource,
        cell: &OnceLock<Arc<LoadedAvro>>,
    ) -> Result<Arc<LoadedAvro>> {
        cached(cell, || {
            let text = self.loader.load(resource)?;
            let schema = parse_schema(resource.path(), &text)?;
            Ok(Arc::new(LoadedAvro { text, schema }))
        })
    }

    fn record(loaded: &LoadedAvro, json: Value) -> Result<AvroRecord> {
        Ok(AvroRecord {
            schema_text: Arc::clone(&loaded.text),
            schema: loaded.schema.clone(),
            value: json_to_avro(json, &loaded.schema)?,
        })
    }
}

impl Encoder for AvroEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::Avro
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let key_schema = self.schema(SchemaResource::AvroKey, &self.key_schema)?;
        let value_schema = self.schema(SchemaResource::AvroValue, &self.value_schema)?;

        let json = parse_record(record)?;
        let key_json = json!({
            "id": self.random.generate_key(),
            "sunny": self.random.coin_flip(),
        });

        Ok(EncodedRecord::new(
            Payload::Avro(Self::record(&key_schema, key_json)?),
            Payload::Avro(Self::record(&value_schema, json)?),
        ))
    }
}

#[derive(Clone)]
struct LoadedProto {
    text: Arc<str>,
    schema: ProtoSchema,
}

/// Converts the record into the first message type of the value `.proto`.
pub struct ProtobufEncoder {
    loader: Arc<SchemaLoader>,
    random: Arc<dyn RandomSource>,
    key_schema: OnceLock<Arc<LoadedProto>>,
    value_schema: OnceLock<Arc<LoadedProto>>,
}

impl ProtobufEncoder {
    pub fn new(loader: Arc<SchemaLoader>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            loader,
            random,
            key_schema: OnceLock::new(),
            value_schema: OnceLock::new(),
        }
    }

    fn schema(
        &self,
        resource: SchemaResource,
        cell: &OnceLock<Arc<LoadedProto>>,
    ) -> Result<Arc<LoadedProto>> {
        cached(cell, || {
            let text = self.loader.load(resource)?;
            let schema = ProtoParser::parse_str(&text)?;
            tracing::debug!(
                "Parsed {} with messages {:?}",
                resource.path(),
                schema.message_order
            );
            Ok(Arc::new(LoadedProto { text, schema }))
        })
    }

    fn record(loaded: &LoadedProto, json: &Value) -> Result<ProtobufRecord> {
        let descriptor = loaded.schema.first_message().ok_or_else(|| {
            EncodeError::ProtobufParse("Schema declares no message type".to_string())
        })?;
        Ok(ProtobufRecord {
            schema_text: Arc::clone(&loaded.text),
            message_indexes: vec![0],
            message: json_to_message(&loaded.schema, descriptor, json)?,
        })
    }
}

impl Encoder for ProtobufEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::Protobuf
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let key_schema = self.schema(SchemaResource::ProtobufKey, &self.key_schema)?;
        let value_schema = self.schema(SchemaResource::ProtobufValue, &self.value_schema)?;

        let json = parse_record(record)?;
        let key_json = json!({ "id": self.random.generate_key() });

        Ok(EncodedRecord::new(
            Payload::Protobuf(Self::record(&key_schema, &key_json)?),
            Payload::Protobuf(Self::record(&value_schema, &json)?),
        ))
    }
}
