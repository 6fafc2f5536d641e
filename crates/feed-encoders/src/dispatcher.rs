//! Format tag to encoder resolution.

use crate::encoders::{
    AvroEncoder, Encoder, InvalidJsonEncoder, JsonEncoder, JsonSchemaEncoder, MalformedEncoder,
    ProtobufEncoder, TextEncoder, XmlEncoder,
};
use crate::random::{RandomSource, ThreadRandom};
use crate::resources::SchemaLoader;
use feed_types::{FormatTag, SerializerConfig};
use std::sync::Arc;

/// An encoder together with the serializers its payloads need.
pub struct EncoderRoute {
    pub encoder: Box<dyn Encoder>,
    pub serializers: SerializerConfig,
}

impl EncoderRoute {
    pub fn format(&self) -> FormatTag {
        self.encoder.format()
    }
}

impl std::fmt::Debug for EncoderRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderRoute")
            .field("format", &self.format())
            .field("serializers", &self.serializers)
            .finish()
    }
}

/// Builds encoders sharing one schema loader and one source of randomness.
#[derive(Clone)]
pub struct Dispatcher {
    loader: Arc<SchemaLoader>,
    random: Arc<dyn RandomSource>,
}

impl Dispatcher {
    pub fn new(loader: Arc<SchemaLoader>, random: Arc<dyn RandomSource>) -> Self {
        Self { loader, random }
    }

    /// Resolve a format tag. Every tag has an encoder.
    pub fn resolve(&self, tag: FormatTag) -> EncoderRoute {
        let loader = Arc::clone(&self.loader);
        let random = Arc::clone(&self.random);

        let encoder: Box<dyn Encoder> = match tag {
            FormatTag::Json => Box::new(JsonEncoder::new(random)),
            FormatTag::Text => Box::new(TextEncoder::new(random)),
            FormatTag::Xml => Box::new(XmlEncoder::new(random)),
            FormatTag::Malformed => Box::new(MalformedEncoder::new(random)),
            FormatTag::JsonSchema => Box::new(JsonSchemaEncoder::new(loader, random)),
            FormatTag::InvalidJson => Box::new(InvalidJsonEncoder::new(loader, random)),
            FormatTag::Avro => Box::new(AvroEncoder::new(loader, random)),
            FormatTag::Protobuf => {
                tracing::warn!("Protobuf format is experimental");
                Box::new(ProtobufEncoder::new(loader, random))
            }
        };

        EncoderRoute {
            encoder,
            serializers: tag.serializers(),
        }
    }

    /// Resolve a format name, falling back to `text` for names no format
    /// answers to.
    pub fn resolve_str(&self, name: &str) -> EncoderRoute {
        let tag = FormatTag::parse(name).unwrap_or_else(|| {
            tracing::warn!("Unknown format '{name}', falling back to {}", FormatTag::Text);
            FormatTag::Text
        });
        self.resolve(tag)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(SchemaLoader::embedded()), Arc::new(ThreadRandom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;
    use feed_types::{Payload, SerializerKind};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Arc::new(SchemaLoader::embedded()),
            Arc::new(SeededRandom::new(9)),
        )
    }

    #[test]
    fn test_every_tag_resolves_to_its_encoder() {
        let dispatcher = dispatcher();
        for tag in FormatTag::ALL {
            let route = dispatcher.resolve(tag);
            assert_eq!(route.format(), tag);
            assert_eq!(route.serializers, tag.serializers());
        }
    }

    #[test]
    fn test_serializer_pairs() {
        let dispatcher = dispatcher();
        let cases = [
            ("json", SerializerKind::String),
            ("text", SerializerKind::String),
            ("xml", SerializerKind::String),
            ("malformed", SerializerKind::ByteArray),
            ("avro", SerializerKind::Avro),
            ("json-schema", SerializerKind::JsonSchema),
            ("invalid-json", SerializerKind::JsonSchema),
            ("protobuf", SerializerKind::Protobuf),
        ];
        for (name, kind) in cases {
            let route = dispatcher.resolve_str(name);
            assert_eq!(route.serializers.key, kind, "{name}");
            assert_eq!(route.serializers.value, kind, "{name}");
        }
    }

    #[test]
    fn test_unknown_name_falls_back_to_text() {
        let route = dispatcher().resolve_str("bogus-value");
        assert_eq!(route.format(), FormatTag::Text);

        let record = route
            .encoder
            .encode(r#"{"properties":{"label":"10 Rue de Rivoli","context":"Paris"}}"#)
            .unwrap();
        assert_eq!(record.value.as_text(), Some("10 Rue de Rivoli"));
        assert!(matches!(record.key, Payload::Text(_)));
    }

    #[test]
    fn test_spellings() {
        let dispatcher = dispatcher();
        for name in ["jsonSchema", "JSON_SCHEMA", "Json-Schema"] {
            assert_eq!(dispatcher.resolve_str(name).format(), FormatTag::JsonSchema);
        }
    }
}
