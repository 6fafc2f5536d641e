//! Payload to wire bytes.
//!
//! Plain serializers write text or bytes as they are. Registry serializers
//! register the payload's schema under the TopicNameStrategy subject
//! (`<topic>-key` or `<topic>-value`) and frame the binary body with the
//! returned id.

use crate::error::{Error, Result};
use crate::registry::{SchemaRegistry, SchemaType};
use feed_encoders::{encode_message, encode_message_indexes};
use feed_types::{write_envelope, Payload, SerializerKind};
use std::sync::Arc;

/// Which side of the record is being serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPart {
    Key,
    Value,
}

impl RecordPart {
    pub fn suffix(&self) -> &'static str {
        match self {
            RecordPart::Key => "key",
            RecordPart::Value => "value",
        }
    }
}

/// Registry subject for one side of a topic's records.
pub fn subject_name(topic: &str, part: RecordPart) -> String {
    format!("{topic}-{}", part.suffix())
}

#[derive(Clone)]
pub struct RecordSerializer {
    registry: Arc<dyn SchemaRegistry>,
}

impl RecordSerializer {
    pub fn new(registry: Arc<dyn SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Serialize one payload with the serializer `kind`.
    ///
    /// Fails when the payload variant is not the one `kind` writes, when the
    /// registry refuses the schema, or when the body cannot be encoded.
    pub async fn serialize(
        &self,
        kind: SerializerKind,
        topic: &str,
        part: RecordPart,
        payload: &Payload,
    ) -> Result<Vec<u8>> {
        match (kind, payload) {
            (SerializerKind::String, Payload::Text(text)) => Ok(text.as_bytes().to_vec()),
            (SerializerKind::ByteArray, Payload::Bytes(bytes)) => Ok(bytes.clone()),
            (SerializerKind::JsonSchema, Payload::JsonSchema(envelope)) => {
                let schema = serde_json::to_string(&envelope.schema)
                    .map_err(|e| Error::Serialize(e.to_string()))?;
                let body = serde_json::to_vec(&envelope.payload)
                    .map_err(|e| Error::Serialize(e.to_string()))?;
                let id = self.register(topic, part, SchemaType::Json, &schema).await?;
                Ok(write_envelope(id, &body))
            }
            (SerializerKind::Avro, Payload::Avro(record)) => {
                let body = apache_avro::to_avro_datum(&record.schema, record.value.clone())
                    .map_err(|e| Error::Serialize(format!("Avro encoding failed: {e}")))?;
                let id = self
                    .register(topic, part, SchemaType::Avro, &record.schema_text)
                    .await?;
                Ok(write_envelope(id, &body))
            }
            (SerializerKind::Protobuf, Payload::Protobuf(record)) => {
                let mut body = encode_message_indexes(&record.message_indexes)?;
                body.extend_from_slice(&encode_message(&record.message)?);
                let id = self
                    .register(topic, part, SchemaType::Protobuf, &record.schema_text)
                    .await?;
                Ok(write_envelope(id, &body))
            }
            (kind, payload) => Err(Error::Serialize(format!(
                "The {kind} serializer cannot write a {} {} payload",
                payload.kind_name(),
                part.suffix()
            ))),
        }
    }

    async fn register(
        &self,
        topic: &str,
        part: RecordPart,
        schema_type: SchemaType,
        schema: &str,
    ) -> Result<u32> {
        self.registry
            .register(&subject_name(topic, part), schema_type, schema)
            .await
    }
}
