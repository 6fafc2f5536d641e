use feed_types::{
    EncodeError, ProtoEnumDescriptor, ProtoFieldDescriptor, ProtoMessageDescriptor, ProtoSchema,
    ProtoType, Result,
};
use protobuf::descriptor::field_descriptor_proto::Label;
use protobuf::descriptor::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto};
use protobuf_parse::Parser;
use std::collections::HashMap;
use std::path::Path;

/// Parses `.proto` documents at runtime, without code generation.
pub struct ProtoParser;

impl ProtoParser {
    /// Parse a `.proto` file. Imports resolve against the file's directory.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ProtoSchema> {
        let path = path.as_ref();

        let mut parser = Parser::new();
        parser.pure();
        parser.input(path);
        if let Some(dir) = path.parent() {
            parser.include(dir);
        }

        let parsed = parser
            .parse_and_typecheck()
            .map_err(|e| EncodeError::ProtobufParse(e.to_string()))?;

        let mut schema = ProtoSchema::default();

        for file_descriptor in parsed.file_descriptors {
            let prefix = file_descriptor.package.clone().unwrap_or_default();
            let proto3 = file_descriptor.syntax() == "proto3";

            for enum_type in &file_descriptor.enum_type {
                Self::collect_enum(&mut schema, &prefix, enum_type);
            }

            for message in &file_descriptor.message_type {
                if let Some(name) = &message.name {
                    schema.message_order.push(qualify(&prefix, name));
                }
                Self::collect_message(&mut schema, &prefix, message, proto3)?;
            }
        }

        Ok(schema)
    }

    /// Parse `.proto` text held in memory.
    pub fn parse_str(content: &str) -> Result<ProtoSchema> {
        use std::io::Write;

        // The parser only reads from disk
        let mut temp_file = tempfile::Builder::new()
            .suffix(".proto")
            .tempfile()
            .map_err(|e| EncodeError::ProtobufParse(format!("Failed to create temp file: {e}")))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| EncodeError::ProtobufParse(format!("Failed to write temp file: {e}")))?;

        Self::parse_file(temp_file.path())
    }

    fn collect_message(
        schema: &mut ProtoSchema,
        prefix: &str,
        message: &DescriptorProto,
        proto3: bool,
    ) -> Result<()> {
        let simple_name = message.name.clone().unwrap_or_default();
        let full_name = qualify(prefix, &simple_name);

        let mut fields = HashMap::new();
        let mut field_order = Vec::new();

        for field in &message.field {
            let field_name = field.name.clone().unwrap_or_default();
            if field_name.is_empty() {
                continue;
            }
            field_order.push(field_name.clone());

            let json_name = field
                .json_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| to_json_name(&field_name));

            let descriptor = ProtoFieldDescriptor {
                name: field_name.clone(),
                json_name,
                number: field.number.unwrap_or(0),
                field_type: Self::parse_field_type(field)?,
                is_repeated: field.label() == Label::LABEL_REPEATED,
                is_optional: if proto3 {
                    field.proto3_optional()
                } else {
                    field.label() == Label::LABEL_OPTIONAL
                },
            };

            fields.insert(field_name, descriptor);
        }

        for enum_type in &message.enum_type {
            Self::collect_enum(schema, &full_name, enum_type);
        }
        for nested in &message.nested_type {
            Self::collect_message(schema, &full_name, nested, proto3)?;
        }

        schema.messages.insert(
            full_name.clone(),
            ProtoMessageDescriptor {
                name: full_name,
                fields,
                field_order,
            },
        );
        Ok(())
    }

    fn collect_enum(schema: &mut ProtoSchema, prefix: &str, enum_type: &EnumDescriptorProto) {
        let simple_name = enum_type.name.clone().unwrap_or_default();
        let values = enum_type
            .value
            .iter()
            .filter_map(|v| Some((v.name.clone()?, v.number.unwrap_or(0))))
            .collect();

        let name = qualify(prefix, &simple_name);
        schema
            .enums
            .insert(name.clone(), ProtoEnumDescriptor { name, values });
    }

    fn parse_field_type(field: &FieldDescriptorProto) -> Result<ProtoType> {
        use protobuf::descriptor::field_descriptor_proto::Type;

        let referenced = || field.type_name.clone().unwrap_or_default();
        let field_type = match field.type_() {
            Type::TYPE_STRING => ProtoType::String,
            Type::TYPE_BYTES => ProtoType::Bytes,
            Type::TYPE_BOOL => ProtoType::Bool,
            Type::TYPE_DOUBLE => ProtoType::Double,
            Type::TYPE_FLOAT => ProtoType::Float,
            Type::TYPE_INT32 => ProtoType::Int32,
            Type::TYPE_INT64 => ProtoType::Int64,
            Type::TYPE_UINT32 => ProtoType::Uint32,
            Type::TYPE_UINT64 => ProtoType::Uint64,
            Type::TYPE_SINT32 => ProtoType::Sint32,
            Type::TYPE_SINT64 => ProtoType::Sint64,
            Type::TYPE_FIXED32 => ProtoType::Fixed32,
            Type::TYPE_FIXED64 => ProtoType::Fixed64,
            Type::TYPE_SFIXED32 => ProtoType::Sfixed32,
            Type::TYPE_SFIXED64 => ProtoType::Sfixed64,
            Type::TYPE_MESSAGE => ProtoType::Message(referenced()),
            Type::TYPE_ENUM => ProtoType::Enum(referenced()),
            Type::TYPE_GROUP => {
                return Err(EncodeError::ProtobufParse(format!(
                    "Field {} is a proto2 group, groups are not supported",
                    field.name()
                )))
            }
        };
        Ok(field_type)
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// lowerCamelCase JSON name of a field, as protoc derives it.
pub fn to_json_name(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    let mut capitalize_next = false;
    for c in field_name.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
