//! JSON to dynamic protobuf message conversion.
//!
//! Follows the canonical proto3 JSON mapping: members match either the
//! declared field name or its lowerCamelCase JSON name, `null` leaves a field
//! unset, 64-bit integers may arrive as strings, bytes are base64 and enums
//! accept their symbol or their number. Unknown members are rejected.

use base64::Engine;
use feed_types::{
    EncodeError, ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage, ProtoMessageDescriptor,
    ProtoSchema, ProtoType, Result,
};
use serde_json::Value;

/// Build a message of type `descriptor` from a JSON object.
pub fn json_to_message(
    schema: &ProtoSchema,
    descriptor: &ProtoMessageDescriptor,
    json: &Value,
) -> Result<ProtoMessage> {
    let object = json.as_object().ok_or_else(|| {
        EncodeError::Conversion(format!(
            "Expected a JSON object for message {}, got {}",
            descriptor.name,
            json_kind(json)
        ))
    })?;

    let mut message = ProtoMessage::new(descriptor.clone());
    for (member, value) in object {
        let field = descriptor.find_json_field(member).ok_or_else(|| {
            EncodeError::Conversion(format!(
                "Cannot find field: {member} in message {}",
                descriptor.name
            ))
        })?;

        if value.is_null() {
            continue;
        }

        let converted = if field.is_repeated {
            let items = value.as_array().ok_or_else(|| {
                EncodeError::Conversion(format!(
                    "Expected an array for repeated field {}, got {}",
                    field.name,
                    json_kind(value)
                ))
            })?;
            let values = items
                .iter()
                .map(|item| convert_value(schema, field, item))
                .collect::<Result<Vec<_>>>()?;
            ProtoFieldValue::Repeated(values)
        } else {
            convert_value(schema, field, value)?
        };

        message.fields.insert(field.name.clone(), converted);
    }

    Ok(message)
}

fn convert_value(
    schema: &ProtoSchema,
    field: &ProtoFieldDescriptor,
    value: &Value,
) -> Result<ProtoFieldValue> {
    let mismatch = || {
        EncodeError::Conversion(format!(
            "Invalid value for field {} of type {}: {}",
            field.name, field.field_type, value
        ))
    };

    Ok(match &field.field_type {
        ProtoType::Double => ProtoFieldValue::Double(parse_float(value).ok_or_else(mismatch)?),
        ProtoType::Float => {
            ProtoFieldValue::Float(parse_float(value).ok_or_else(mismatch)? as f32)
        }
        ProtoType::Int32 | ProtoType::Sint32 | ProtoType::Sfixed32 => {
            let v = parse_i64(value).ok_or_else(mismatch)?;
            ProtoFieldValue::Int32(i32::try_from(v).map_err(|_| mismatch())?)
        }
        ProtoType::Int64 | ProtoType::Sint64 | ProtoType::Sfixed64 => {
            ProtoFieldValue::Int64(parse_i64(value).ok_or_else(mismatch)?)
        }
        ProtoType::Uint32 | ProtoType::Fixed32 => {
            let v = parse_u64(value).ok_or_else(mismatch)?;
            ProtoFieldValue::Uint32(u32::try_from(v).map_err(|_| mismatch())?)
        }
        ProtoType::Uint64 | ProtoType::Fixed64 => {
            ProtoFieldValue::Uint64(parse_u64(value).ok_or_else(mismatch)?)
        }
        ProtoType::Bool => ProtoFieldValue::Bool(value.as_bool().ok_or_else(mismatch)?),
        ProtoType::String => {
            ProtoFieldValue::String(value.as_str().ok_or_else(mismatch)?.to_string())
        }
        ProtoType::Bytes => {
            let text = value.as_str().ok_or_else(mismatch)?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(text)
                .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(text))
                .map_err(|_| mismatch())?;
            ProtoFieldValue::Bytes(bytes)
        }
        ProtoType::Enum(type_name) => match value {
            Value::String(symbol) => {
                let enum_desc = schema.resolve_enum(type_name).ok_or_else(|| {
                    EncodeError::Conversion(format!("Unknown enum type: {type_name}"))
                })?;
                let number = enum_desc.values.get(symbol).ok_or_else(mismatch)?;
                ProtoFieldValue::Enum(*number)
            }
            _ => {
                let v = parse_i64(value).ok_or_else(mismatch)?;
                ProtoFieldValue::Enum(i32::try_from(v).map_err(|_| mismatch())?)
            }
        },
        ProtoType::Message(type_name) => {
            let nested = schema.resolve_message(type_name).ok_or_else(|| {
                EncodeError::Conversion(format!("Unknown message type: {type_name}"))
            })?;
            ProtoFieldValue::Message(Box::new(json_to_message(schema, nested, value)?))
        }
        ProtoType::Repeated(_) => return Err(mismatch()),
    })
}

fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

fn parse_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| integral(n.as_f64()?)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| integral(n.as_f64()?).and_then(|v| u64::try_from(v).ok())),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// Accepts 3.0 but not 3.5
fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ProtoParser;
    use serde_json::json;

    const PROTO: &str = r#"
        syntax = "proto3";

        message Place {
            string label = 1;
            double score = 2;
            int64 population = 3;
            repeated double coordinates = 4;
            Kind kind = 5;
            Tag tag = 6;
            bytes blob = 7;
            string old_city = 8;
            uint32 rank = 9;

            enum Kind {
                UNKNOWN = 0;
                STREET = 1;
                MUNICIPALITY = 2;
            }
        }

        message Tag {
            string name = 1;
        }
    "#;

    fn place() -> (ProtoSchema, ProtoMessageDescriptor) {
        let schema = ProtoParser::parse_str(PROTO).expect("proto");
        let descriptor = schema.message("Place").unwrap().clone();
        (schema, descriptor)
    }

    #[test]
    fn test_converts_scalars_and_nested() {
        let (schema, descriptor) = place();
        let msg = json_to_message(
            &schema,
            &descriptor,
            &json!({
                "label": "10 Rue de Rivoli 75004 Paris",
                "score": 0.97,
                "population": "2165423",
                "coordinates": [2.35, 48.85],
                "kind": "STREET",
                "tag": {"name": "paris"},
                "blob": "AQID",
                "rank": 3
            }),
        )
        .expect("convert");

        assert_eq!(
            msg.get("label"),
            Some(&ProtoFieldValue::String("10 Rue de Rivoli 75004 Paris".into()))
        );
        assert_eq!(msg.get("score"), Some(&ProtoFieldValue::Double(0.97)));
        assert_eq!(msg.get("population"), Some(&ProtoFieldValue::Int64(2165423)));
        assert_eq!(
            msg.get("coordinates"),
            Some(&ProtoFieldValue::Repeated(vec![
                ProtoFieldValue::Double(2.35),
                ProtoFieldValue::Double(48.85)
            ]))
        );
        assert_eq!(msg.get("kind"), Some(&ProtoFieldValue::Enum(1)));
        assert_eq!(msg.get("blob"), Some(&ProtoFieldValue::Bytes(vec![1, 2, 3])));
        assert_eq!(msg.get("rank"), Some(&ProtoFieldValue::Uint32(3)));
        match msg.get("tag") {
            Some(ProtoFieldValue::Message(tag)) => {
                assert_eq!(tag.get("name"), Some(&ProtoFieldValue::String("paris".into())));
            }
            other => panic!("Expected nested message, got {other:?}"),
        }
    }

    #[test]
    fn test_json_name_and_null() {
        let (schema, descriptor) = place();
        let msg = json_to_message(
            &schema,
            &descriptor,
            &json!({"oldCity": "Paris 4e", "label": null}),
        )
        .expect("convert");
        assert_eq!(msg.get("old_city"), Some(&ProtoFieldValue::String("Paris 4e".into())));
        assert!(msg.get("label").is_none());
    }

    #[test]
    fn test_unknown_member_is_rejected() {
        let (schema, descriptor) = place();
        let err = json_to_message(&schema, &descriptor, &json!({"updatedAt": "2007"}))
            .unwrap_err();
        assert!(matches!(err, EncodeError::Conversion(_)));
        assert!(err.to_string().contains("updatedAt"));
    }

    #[test]
    fn test_type_mismatches_are_rejected() {
        let (schema, descriptor) = place();
        for bad in [
            json!({"label": 12}),
            json!({"score": "high"}),
            json!({"coordinates": 2.35}),
            json!({"kind": "AVENUE"}),
            json!({"rank": -1}),
            json!({"population": 1.5}),
        ] {
            let result = json_to_message(&schema, &descriptor, &bad);
            assert!(
                matches!(result, Err(EncodeError::Conversion(_))),
                "{bad} should not convert"
            );
        }
    }

    #[test]
    fn test_non_object_is_rejected() {
        let (schema, descriptor) = place();
        let err = json_to_message(&schema, &descriptor, &json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_nested_type_shadows_top_level_name() {
        let schema = ProtoParser::parse_str(
            r#"
            syntax = "proto3";

            message Address {
                message Properties { string label = 1; }
                Properties properties = 1;
                Meta meta = 2;
            }
            message Properties { int32 count = 1; }
            message Meta { Properties props = 1; }
        "#,
        )
        .unwrap();
        let address = schema.first_message().unwrap();

        let msg = json_to_message(
            &schema,
            address,
            &json!({"properties": {"label": "x"}, "meta": {"props": {"count": 3}}}),
        )
        .unwrap();

        match msg.get("properties") {
            Some(ProtoFieldValue::Message(props)) => {
                assert_eq!(props.message_type, "Address.Properties");
                assert_eq!(props.get("label"), Some(&ProtoFieldValue::String("x".into())));
            }
            other => panic!("Expected nested message, got {other:?}"),
        }
        match msg.get("meta") {
            Some(ProtoFieldValue::Message(meta)) => match meta.get("props") {
                Some(ProtoFieldValue::Message(props)) => {
                    assert_eq!(props.message_type, "Properties");
                    assert_eq!(props.get("count"), Some(&ProtoFieldValue::Int32(3)));
                }
                other => panic!("Expected Properties, got {other:?}"),
            },
            other => panic!("Expected Meta, got {other:?}"),
        }
    }
}
