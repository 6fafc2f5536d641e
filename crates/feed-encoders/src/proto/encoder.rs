//! Dynamic message to proto3 wire format.
//!
//! Fields are written in field-number order. Singular scalars holding their
//! default value are omitted, repeated numeric fields are packed, and nested
//! messages are length-delimited.

use feed_types::{EncodeError, ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage, ProtoType, Result};
use protobuf::CodedOutputStream;

/// Encode a message to protobuf binary format.
pub fn encode_message(message: &ProtoMessage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut stream = CodedOutputStream::vec(&mut buffer);

        for field in message.descriptor.fields_by_number() {
            if let Some(value) = message.fields.get(&field.name) {
                encode_field(&mut stream, field, value)?;
            }
        }

        stream
            .flush()
            .map_err(|e| EncodeError::ProtobufEncode(e.to_string()))?;
    }

    Ok(buffer)
}

/// Confluent message-index prefix: zigzag varint count then indexes, with
/// the first message shortened to a single zero byte.
pub fn encode_message_indexes(indexes: &[i32]) -> Result<Vec<u8>> {
    if indexes == [0] {
        return Ok(vec![0]);
    }

    let mut buffer = Vec::new();
    {
        let mut stream = CodedOutputStream::vec(&mut buffer);
        let count = i32::try_from(indexes.len())
            .map_err(|_| EncodeError::ProtobufEncode("Too many message indexes".to_string()))?;
        stream
            .write_sint32_no_tag(count)
            .map_err(|e| EncodeError::ProtobufEncode(e.to_string()))?;
        for index in indexes {
            stream
                .write_sint32_no_tag(*index)
                .map_err(|e| EncodeError::ProtobufEncode(e.to_string()))?;
        }
        stream
            .flush()
            .map_err(|e| EncodeError::ProtobufEncode(e.to_string()))?;
    }
    Ok(buffer)
}

fn encode_field(
    stream: &mut CodedOutputStream,
    field: &ProtoFieldDescriptor,
    value: &ProtoFieldValue,
) -> Result<()> {
    let field_number = field.number as u32;

    match value {
        ProtoFieldValue::Repeated(values) if values.is_empty() => Ok(()),
        ProtoFieldValue::Repeated(values) if field.field_type.is_packable() => {
            let mut packed = Vec::new();
            {
                let mut packed_stream = CodedOutputStream::vec(&mut packed);
                for v in values {
                    encode_packed_element(&mut packed_stream, field, v)?;
                }
                packed_stream
                    .flush()
                    .map_err(|e| EncodeError::ProtobufEncode(e.to_string()))?;
            }
            stream
                .write_bytes(field_number, &packed)
                .map_err(|e| EncodeError::ProtobufEncode(e.to_string()))
        }
        ProtoFieldValue::Repeated(values) => {
            for v in values {
                encode_single(stream, field, v)?;
            }
            Ok(())
        }
        v if !field.is_optional && is_default(v) => Ok(()),
        v => encode_single(stream, field, v),
    }
}

fn is_default(value: &ProtoFieldValue) -> bool {
    match value {
        ProtoFieldValue::Double(v) => *v == 0.0 && v.is_sign_positive(),
        ProtoFieldValue::Float(v) => *v == 0.0 && v.is_sign_positive(),
        ProtoFieldValue::Int32(v) | ProtoFieldValue::Enum(v) => *v == 0,
        ProtoFieldValue::Int64(v) => *v == 0,
        ProtoFieldValue::Uint32(v) => *v == 0,
        ProtoFieldValue::Uint64(v) => *v == 0,
        ProtoFieldValue::Bool(v) => !*v,
        ProtoFieldValue::String(v) => v.is_empty(),
        ProtoFieldValue::Bytes(v) => v.is_empty(),
        ProtoFieldValue::Message(_) | ProtoFieldValue::Repeated(_) => false,
    }
}

fn encode_single(
    stream: &mut CodedOutputStream,
    field: &ProtoFieldDescriptor,
    value: &ProtoFieldValue,
) -> Result<()> {
    let n = field.number as u32;

    let written = match (&field.field_type, value) {
        (ProtoType::Message(_), ProtoFieldValue::Message(nested)) => {
            let bytes = encode_message(nested)?;
            stream.write_bytes(n, &bytes)
        }
        (ProtoType::Double, ProtoFieldValue::Double(v)) => stream.write_double(n, *v),
        (ProtoType::Float, ProtoFieldValue::Float(v)) => stream.write_float(n, *v),
        (ProtoType::Int32, ProtoFieldValue::Int32(v)) => stream.write_int32(n, *v),
        (ProtoType::Sint32, ProtoFieldValue::Int32(v)) => stream.write_sint32(n, *v),
        (ProtoType::Sfixed32, ProtoFieldValue::Int32(v)) => stream.write_sfixed32(n, *v),
        (ProtoType::Int64, ProtoFieldValue::Int64(v)) => stream.write_int64(n, *v),
        (ProtoType::Sint64, ProtoFieldValue::Int64(v)) => stream.write_sint64(n, *v),
        (ProtoType::Sfixed64, ProtoFieldValue::Int64(v)) => stream.write_sfixed64(n, *v),
        (ProtoType::Uint32, ProtoFieldValue::Uint32(v)) => stream.write_uint32(n, *v),
        (ProtoType::Fixed32, ProtoFieldValue::Uint32(v)) => stream.write_fixed32(n, *v),
        (ProtoType::Uint64, ProtoFieldValue::Uint64(v)) => stream.write_uint64(n, *v),
        (ProtoType::Fixed64, ProtoFieldValue::Uint64(v)) => stream.write_fixed64(n, *v),
        (ProtoType::Bool, ProtoFieldValue::Bool(v)) => stream.write_bool(n, *v),
        (ProtoType::String, ProtoFieldValue::String(v)) => stream.write_string(n, v),
        (ProtoType::Bytes, ProtoFieldValue::Bytes(v)) => stream.write_bytes(n, v),
        (ProtoType::Enum(_), ProtoFieldValue::Enum(v)) => stream.write_enum(n, *v),
        (field_type, v) => return Err(type_mismatch(field, field_type, v)),
    };

    written.map_err(|e| EncodeError::ProtobufEncode(e.to_string()))
}

fn encode_packed_element(
    stream: &mut CodedOutputStream,
    field: &ProtoFieldDescriptor,
    value: &ProtoFieldValue,
) -> Result<()> {
    let written = match (&field.field_type, value) {
        (ProtoType::Double, ProtoFieldValue::Double(v)) => stream.write_double_no_tag(*v),
        (ProtoType::Float, ProtoFieldValue::Float(v)) => stream.write_float_no_tag(*v),
        (ProtoType::Int32, ProtoFieldValue::Int32(v)) => stream.write_int32_no_tag(*v),
        (ProtoType::Sint32, ProtoFieldValue::Int32(v)) => stream.write_sint32_no_tag(*v),
        (ProtoType::Sfixed32, ProtoFieldValue::Int32(v)) => stream.write_sfixed32_no_tag(*v),
        (ProtoType::Int64, ProtoFieldValue::Int64(v)) => stream.write_int64_no_tag(*v),
        (ProtoType::Sint64, ProtoFieldValue::Int64(v)) => stream.write_sint64_no_tag(*v),
        (ProtoType::Sfixed64, ProtoFieldValue::Int64(v)) => stream.write_sfixed64_no_tag(*v),
        (ProtoType::Uint32, ProtoFieldValue::Uint32(v)) => stream.write_uint32_no_tag(*v),
        (ProtoType::Fixed32, ProtoFieldValue::Uint32(v)) => stream.write_fixed32_no_tag(*v),
        (ProtoType::Uint64, ProtoFieldValue::Uint64(v)) => stream.write_uint64_no_tag(*v),
        (ProtoType::Fixed64, ProtoFieldValue::Uint64(v)) => stream.write_fixed64_no_tag(*v),
        (ProtoType::Bool, ProtoFieldValue::Bool(v)) => stream.write_bool_no_tag(*v),
        (ProtoType::Enum(_), ProtoFieldValue::Enum(v)) => stream.write_enum_no_tag(*v),
        (field_type, v) => return Err(type_mismatch(field, field_type, v)),
    };

    written.map_err(|e| EncodeError::ProtobufEncode(e.to_string()))
}

fn type_mismatch(
    field: &ProtoFieldDescriptor,
    field_type: &ProtoType,
    value: &ProtoFieldValue,
) -> EncodeError {
    EncodeError::ProtobufEncode(format!(
        "Field {} of type {field_type} cannot hold a {} value",
        field.name,
        value.kind_name()
    ))
}
