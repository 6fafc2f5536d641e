//! Reads proto3 wire format back into a dynamic [`ProtoMessage`], accepting
//! both packed and unpacked encodings of repeated numeric fields.

use feed_types::{
    EncodeError, ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage, ProtoMessageDescriptor,
    ProtoSchema, ProtoType, Result,
};
use protobuf::CodedInputStream;

const WIRE_TYPE_LENGTH_DELIMITED: u32 = 2;

/// Decodes messages of a parsed schema.
pub struct ProtoDecoder {
    schema: ProtoSchema,
}

impl ProtoDecoder {
    pub fn new(schema: ProtoSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &ProtoSchema {
        &self.schema
    }

    /// Decode `data` as a `message_type` message, named as
    /// [`ProtoSchema::message`] accepts.
    pub fn decode(&self, message_type: &str, data: &[u8]) -> Result<ProtoMessage> {
        let descriptor = self.schema.message(message_type).ok_or_else(|| {
            EncodeError::ProtobufDecode(format!("Message type not found: {message_type}"))
        })?;
        let mut stream = CodedInputStream::from_bytes(data);
        self.decode_message(descriptor, &mut stream)
    }

    fn decode_message(
        &self,
        descriptor: &ProtoMessageDescriptor,
        stream: &mut CodedInputStream,
    ) -> Result<ProtoMessage> {
        let mut message = ProtoMessage::new(descriptor.clone());

        loop {
            if stream.eof().map_err(decode_err)? {
                break;
            }

            let tag = stream.read_raw_varint32().map_err(decode_err)?;
            if tag == 0 {
                break;
            }

            let field_number = (tag >> 3) as i32;
            let wire_type = tag & 0x7;

            let field_desc = descriptor.field_by_number(field_number).ok_or_else(|| {
                EncodeError::ProtobufDecode(format!(
                    "{} has no field number {field_number}",
                    descriptor.name
                ))
            })?;

            if !field_desc.is_repeated {
                let value = self.decode_field_value(field_desc, stream)?;
                message.fields.insert(field_desc.name.clone(), value);
                continue;
            }

            let mut decoded = Vec::new();
            if field_desc.field_type.is_packable() && wire_type == WIRE_TYPE_LENGTH_DELIMITED {
                let len = stream.read_raw_varint64().map_err(decode_err)?;
                let old_limit = stream.push_limit(len).map_err(decode_err)?;
                while !stream.eof().map_err(decode_err)? {
                    decoded.push(self.decode_field_value(field_desc, stream)?);
                }
                stream.pop_limit(old_limit);
            } else {
                decoded.push(self.decode_field_value(field_desc, stream)?);
            }

            let existing = message
                .fields
                .entry(field_desc.name.clone())
                .or_insert_with(|| ProtoFieldValue::Repeated(Vec::new()));
            if let ProtoFieldValue::Repeated(values) = existing {
                values.extend(decoded);
            }
        }

        Ok(message)
    }

    fn decode_field_value(
        &self,
        field_desc: &ProtoFieldDescriptor,
        stream: &mut CodedInputStream,
    ) -> Result<ProtoFieldValue> {
        let value = match &field_desc.field_type {
            ProtoType::Double => ProtoFieldValue::Double(stream.read_double().map_err(decode_err)?),
            ProtoType::Float => ProtoFieldValue::Float(stream.read_float().map_err(decode_err)?),
            ProtoType::Int32 => ProtoFieldValue::Int32(stream.read_int32().map_err(decode_err)?),
            ProtoType::Sint32 => ProtoFieldValue::Int32(stream.read_sint32().map_err(decode_err)?),
            ProtoType::Sfixed32 => {
                ProtoFieldValue::Int32(stream.read_sfixed32().map_err(decode_err)?)
            }
            ProtoType::Int64 => ProtoFieldValue::Int64(stream.read_int64().map_err(decode_err)?),
            ProtoType::Sint64 => ProtoFieldValue::Int64(stream.read_sint64().map_err(decode_err)?),
            ProtoType::Sfixed64 => {
                ProtoFieldValue::Int64(stream.read_sfixed64().map_err(decode_err)?)
            }
            ProtoType::Uint32 => ProtoFieldValue::Uint32(stream.read_uint32().map_err(decode_err)?),
            ProtoType::Fixed32 => {
                ProtoFieldValue::Uint32(stream.read_fixed32().map_err(decode_err)?)
            }
            ProtoType::Uint64 => ProtoFieldValue::Uint64(stream.read_uint64().map_err(decode_err)?),
            ProtoType::Fixed64 => {
                ProtoFieldValue::Uint64(stream.read_fixed64().map_err(decode_err)?)
            }
            ProtoType::Bool => ProtoFieldValue::Bool(stream.read_bool().map_err(decode_err)?),
            ProtoType::String => ProtoFieldValue::String(stream.read_string().map_err(decode_err)?),
            ProtoType::Bytes => {
                ProtoFieldValue::Bytes(stream.read_bytes().map_err(decode_err)?.to_vec())
            }
            ProtoType::Enum(_) => ProtoFieldValue::Enum(stream.read_int32().map_err(decode_err)?),
            ProtoType::Message(type_name) => {
                let len = stream.read_raw_varint64().map_err(decode_err)?;
                let old_limit = stream.push_limit(len).map_err(decode_err)?;

                let nested_descriptor = self.schema.resolve_message(type_name).ok_or_else(|| {
                    EncodeError::ProtobufDecode(format!("Message type not found: {type_name}"))
                })?;
                let nested_message = self.decode_message(nested_descriptor, stream)?;

                stream.pop_limit(old_limit);
                ProtoFieldValue::Message(Box::new(nested_message))
            }
            ProtoType::Repeated(_) => {
                return Err(EncodeError::ProtobufDecode(format!(
                    "Unsupported field type: {}",
                    field_desc.field_type
                )))
            }
        };
        Ok(value)
    }
}

fn decode_err(e: protobuf::Error) -> EncodeError {
    EncodeError::ProtobufDecode(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{encode_message, json_to_message, ProtoParser};
    use serde_json::json;

    const PROTO: &str = r#"
        syntax = "proto3";

        message Address {
            string type = 1;
            Geometry geometry = 2;
            repeated sint64 deltas = 3;
            repeated string tags = 4;
        }

        message Geometry {
            string type = 1;
            repeated double coordinates = 2;
        }
    "#;

    #[test]
    fn test_decode_encoded_address() {
        let schema = ProtoParser::parse_str(PROTO).expect("proto");
        let descriptor = schema.message("Address").unwrap();
        let msg = json_to_message(
            &schema,
            descriptor,
            &json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [2.35, 48.85]},
                "deltas": [-3, 5],
                "tags": ["a", "b"]
            }),
        )
        .unwrap();
        let bytes = encode_message(&msg).unwrap();

        let decoder = ProtoDecoder::new(schema);
        let decoded = decoder.decode("Address", &bytes).expect("decode");
        assert_eq!(decoded.fields, msg.fields);
    }

    #[test]
    fn test_decode_unpacked_repeated() {
        let schema = ProtoParser::parse_str(PROTO).expect("proto");
        let decoder = ProtoDecoder::new(schema);
        // coordinates written one element at a time (wire type 1)
        let mut bytes = Vec::new();
        for v in [1.5f64, 2.5] {
            bytes.push(0x11);
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let decoded = decoder.decode("Geometry", &bytes).expect("decode");
        assert_eq!(
            decoded.get("coordinates"),
            Some(&ProtoFieldValue::Repeated(vec![
                ProtoFieldValue::Double(1.5),
                ProtoFieldValue::Double(2.5)
            ]))
        );
    }

    #[test]
    fn test_unknown_field_number() {
        let schema = ProtoParser::parse_str(PROTO).expect("proto");
        let decoder = ProtoDecoder::new(schema);
        let err = decoder.decode("Geometry", &[0x48, 0x01]).unwrap_err();
        assert!(matches!(err, EncodeError::ProtobufDecode(_)));
    }

    #[test]
    fn test_unknown_message_type() {
        let schema = ProtoParser::parse_str(PROTO).expect("proto");
        let decoder = ProtoDecoder::new(schema);
        assert!(decoder.decode("Nope", &[]).is_err());
    }
}
