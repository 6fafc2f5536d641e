//! Runtime protobuf types.
//!
//! `.proto` documents are parsed at runtime (see `feed_encoders::proto`), so
//! messages are represented dynamically: a descriptor tree plus a map of field
//! values. The encoder writes these to proto3 wire format and the decoder
//! reads them back.

use std::collections::HashMap;

/// A field value in a dynamic protobuf message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoFieldValue {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Enum value number.
    Enum(i32),
    Message(Box<ProtoMessage>),
    Repeated(Vec<ProtoFieldValue>),
}

impl ProtoFieldValue {
    /// Short name of the value's variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ProtoFieldValue::Double(_) => "double",
            ProtoFieldValue::Float(_) => "float",
            ProtoFieldValue::Int32(_) => "int32",
            ProtoFieldValue::Int64(_) => "int64",
            ProtoFieldValue::Uint32(_) => "uint32",
            ProtoFieldValue::Uint64(_) => "uint64",
            ProtoFieldValue::Bool(_) => "bool",
            ProtoFieldValue::String(_) => "string",
            ProtoFieldValue::Bytes(_) => "bytes",
            ProtoFieldValue::Enum(_) => "enum",
            ProtoFieldValue::Message(_) => "message",
            ProtoFieldValue::Repeated(_) => "list",
        }
    }
}

/// A dynamic protobuf message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessage {
    pub message_type: String,
    /// Set fields, keyed by declared name. Absent fields encode as defaults.
    pub fields: HashMap<String, ProtoFieldValue>,
    pub descriptor: ProtoMessageDescriptor,
}

impl ProtoMessage {
    pub fn new(descriptor: ProtoMessageDescriptor) -> Self {
        Self {
            message_type: descriptor.name.clone(),
            fields: HashMap::new(),
            descriptor,
        }
    }

    pub fn get(&self, field: &str) -> Option<&ProtoFieldValue> {
        self.fields.get(field)
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    /// Referenced message, as written in the document (`.pkg.Outer.Inner`)
    Message(String),
    Enum(String),
    Repeated(Box<ProtoType>),
}

/// Renders the type the way a `.proto` document spells it.
impl std::fmt::Display for ProtoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = match self {
            ProtoType::Message(name) | ProtoType::Enum(name) => {
                return f.write_str(name.trim_start_matches('.'))
            }
            ProtoType::Repeated(inner) => return write!(f, "repeated {inner}"),
            ProtoType::Double => "double",
            ProtoType::Float => "float",
            ProtoType::Int32 => "int32",
            ProtoType::Int64 => "int64",
            ProtoType::Uint32 => "uint32",
            ProtoType::Uint64 => "uint64",
            ProtoType::Sint32 => "sint32",
            ProtoType::Sint64 => "sint64",
            ProtoType::Fixed32 => "fixed32",
            ProtoType::Fixed64 => "fixed64",
            ProtoType::Sfixed32 => "sfixed32",
            ProtoType::Sfixed64 => "sfixed64",
            ProtoType::Bool => "bool",
            ProtoType::String => "string",
            ProtoType::Bytes => "bytes",
        };
        f.write_str(keyword)
    }
}

impl ProtoType {
    /// Scalar numeric and bool types, the ones proto3 packs when repeated.
    pub fn is_packable(&self) -> bool {
        !matches!(
            self,
            ProtoType::String | ProtoType::Bytes | ProtoType::Message(_) | ProtoType::Repeated(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoFieldDescriptor {
    pub name: String,
    /// Member name in the JSON mapping: the `json_name` option, else the
    /// lowerCamelCase form of `name`
    pub json_name: String,
    pub number: i32,
    pub field_type: ProtoType,
    pub is_repeated: bool,
    /// Explicit presence (`optional`): a set default value is still written
    pub is_optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessageDescriptor {
    /// Qualified name: package, then enclosing messages
    pub name: String,
    pub fields: HashMap<String, ProtoFieldDescriptor>,
    /// Declared names in document order
    pub field_order: Vec<String>,
}

impl ProtoMessageDescriptor {
    pub fn field(&self, name: &str) -> Option<&ProtoFieldDescriptor> {
        self.fields.get(name)
    }

    /// Find a field by its declared name or its JSON name.
    pub fn find_json_field(&self, member: &str) -> Option<&ProtoFieldDescriptor> {
        self.fields
            .get(member)
            .or_else(|| self.fields.values().find(|f| f.json_name == member))
    }

    pub fn field_by_number(&self, number: i32) -> Option<&ProtoFieldDescriptor> {
        self.fields.values().find(|f| f.number == number)
    }

    /// Field descriptors sorted by field number, the order used on the wire.
    pub fn fields_by_number(&self) -> Vec<&ProtoFieldDescriptor> {
        let mut fields: Vec<_> = self.fields.values().collect();
        fields.sort_by_key(|f| f.number);
        fields
    }
}

/// Describes a protobuf enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoEnumDescriptor {
    pub name: String,
    /// Symbol name to number
    pub values: HashMap<String, i32>,
}

/// A parsed `.proto` document containing message and enum types.
///
/// Types are keyed by qualified name without the leading dot
/// (`pkg.Outer.Inner`), so nested and top-level types may share a short name.
#[derive(Debug, Clone, Default)]
pub struct ProtoSchema {
    pub messages: HashMap<String, ProtoMessageDescriptor>,
    /// Qualified names of top-level messages in declaration order
    pub message_order: Vec<String>,
    pub enums: HashMap<String, ProtoEnumDescriptor>,
}

impl ProtoSchema {
    /// Look a message up by qualified name, or by short name when exactly one
    /// message carries it.
    pub fn message(&self, name: &str) -> Option<&ProtoMessageDescriptor> {
        let name = name.trim_start_matches('.');
        if let Some(descriptor) = self.messages.get(name) {
            return Some(descriptor);
        }

        let mut candidates = self
            .messages
            .iter()
            .filter(|(qualified, _)| short_name(qualified) == name);
        match (candidates.next(), candidates.next()) {
            (Some((_, descriptor)), None) => Some(descriptor),
            _ => None,
        }
    }

    /// Resolve a field type reference such as `.pkg.Outer.Inner`.
    pub fn resolve_message(&self, type_name: &str) -> Option<&ProtoMessageDescriptor> {
        self.messages.get(type_name.trim_start_matches('.'))
    }

    pub fn resolve_enum(&self, type_name: &str) -> Option<&ProtoEnumDescriptor> {
        self.enums.get(type_name.trim_start_matches('.'))
    }

    /// The first top-level message, the default type of a registered schema.
    pub fn first_message(&self) -> Option<&ProtoMessageDescriptor> {
        self.message_order
            .first()
            .and_then(|name| self.messages.get(name))
    }
}

fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
