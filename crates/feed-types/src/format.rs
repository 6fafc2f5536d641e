//! Format selector and serializer pairing.

use std::fmt;
use std::str::FromStr;

/// Wire format requested for a batch of records.
///
/// Selects both the encoder and the key/value serializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Json,
    Avro,
    JsonSchema,
    Protobuf,
    Text,
    Xml,
    Malformed,
    InvalidJson,
}

impl FormatTag {
    pub const ALL: [FormatTag; 8] = [
        FormatTag::Json,
        FormatTag::Avro,
        FormatTag::JsonSchema,
        FormatTag::Protobuf,
        FormatTag::Text,
        FormatTag::Xml,
        FormatTag::Malformed,
        FormatTag::InvalidJson,
    ];

    /// Canonical kebab-case name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Json => "json",
            FormatTag::Avro => "avro",
            FormatTag::JsonSchema => "json-schema",
            FormatTag::Protobuf => "protobuf",
            FormatTag::Text => "text",
            FormatTag::Xml => "xml",
            FormatTag::Malformed => "malformed",
            FormatTag::InvalidJson => "invalid-json",
        }
    }

    /// Parse a format name.
    ///
    /// Matching is case-insensitive and ignores `-` and `_`, so `json-schema`,
    /// `jsonSchema` and `JSON_SCHEMA` all select [`FormatTag::JsonSchema`].
    pub fn parse(input: &str) -> Option<FormatTag> {
        let normalized: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "json" => Some(FormatTag::Json),
            "avro" => Some(FormatTag::Avro),
            "jsonschema" => Some(FormatTag::JsonSchema),
            "protobuf" => Some(FormatTag::Protobuf),
            "text" => Some(FormatTag::Text),
            "xml" => Some(FormatTag::Xml),
            "malformed" => Some(FormatTag::Malformed),
            "invalidjson" => Some(FormatTag::InvalidJson),
            _ => None,
        }
    }

    /// Serializers used for keys and values of this format.
    pub fn serializers(&self) -> SerializerConfig {
        let kind = match self {
            FormatTag::Json | FormatTag::Text | FormatTag::Xml => SerializerKind::String,
            FormatTag::Malformed => SerializerKind::ByteArray,
            FormatTag::Avro => SerializerKind::Avro,
            FormatTag::JsonSchema | FormatTag::InvalidJson => SerializerKind::JsonSchema,
            FormatTag::Protobuf => SerializerKind::Protobuf,
        };
        SerializerConfig {
            key: kind,
            value: kind,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatTag::parse(s).ok_or_else(|| {
            let known: Vec<&str> = FormatTag::ALL.iter().map(FormatTag::as_str).collect();
            format!("unknown format '{s}', known formats are {known:?}")
        })
    }
}

/// How one side (key or value) of a record is turned into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializerKind {
    /// UTF-8 text, no framing.
    String,
    /// Raw bytes, passed through untouched.
    ByteArray,
    /// Avro binary datum inside a schema-registry envelope.
    Avro,
    /// JSON text inside a schema-registry envelope.
    JsonSchema,
    /// Protobuf binary (with message indexes) inside a schema-registry envelope.
    Protobuf,
}

impl SerializerKind {
    pub fn name(&self) -> &'static str {
        match self {
            SerializerKind::String => "string",
            SerializerKind::ByteArray => "byte-array",
            SerializerKind::Avro => "avro",
            SerializerKind::JsonSchema => "json-schema",
            SerializerKind::Protobuf => "protobuf",
        }
    }

    /// Whether this serializer registers a schema and frames the payload.
    pub fn uses_registry(&self) -> bool {
        matches!(
            self,
            SerializerKind::Avro | SerializerKind::JsonSchema | SerializerKind::Protobuf
        )
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key and value serializer pairing for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerConfig {
    pub key: SerializerKind,
    pub value: SerializerKind,
}
