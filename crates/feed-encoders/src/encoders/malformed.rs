use super::{parse_record, property, Encoder};
use crate::random::RandomSource;
use feed_types::{EncodedRecord, FormatTag, Payload, Result};
use std::sync::Arc;

/// Produces bytes that look like a schema-registry envelope but are not.
///
/// Each side starts with four zero bytes and one byte in `1..=126` standing in
/// for a schema id, followed by plain text. Consumers expecting a real
/// envelope will fail to look the id up or to decode the body.
pub struct MalformedEncoder {
    random: Arc<dyn RandomSource>,
}

impl MalformedEncoder {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    fn fake_envelope(&self, text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(5 + text.len());
        bytes.extend_from_slice(&[0, 0, 0, 0, self.random.schema_id_byte()]);
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }
}

impl Encoder for MalformedEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::Malformed
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let json = parse_record(record)?;
        let context = property(&json, "context")?;

        let key = format!("{} key", self.random.generate_key());
        Ok(EncodedRecord::new(
            Payload::Bytes(self.fake_envelope(&key)),
            Payload::Bytes(self.fake_envelope(context)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{SeededRandom, ThreadRandom, MAX_FAKE_SCHEMA_ID, MIN_FAKE_SCHEMA_ID};
    use feed_types::EncodeError;

    #[test]
    fn test_value_layout() {
        let encoder = MalformedEncoder::new(Arc::new(SeededRandom::new(11)));
        let record = encoder
            .encode(r#"{"properties":{"label":"x","context":"Paris"}}"#)
            .unwrap();

        let value = record.value.as_bytes().unwrap();
        assert_eq!(value.len(), 10);
        assert_eq!(&value[..4], &[0, 0, 0, 0]);
        assert!((MIN_FAKE_SCHEMA_ID..=MAX_FAKE_SCHEMA_ID).contains(&value[4]));
        assert_eq!(&value[5..], b"Paris");
    }

    #[test]
    fn test_key_layout() {
        let encoder = MalformedEncoder::new(Arc::new(ThreadRandom));
        let record = encoder
            .encode(r#"{"properties":{"context":"Lyon"}}"#)
            .unwrap();

        let key = record.key.as_bytes().unwrap();
        assert_eq!(&key[..4], &[0, 0, 0, 0]);
        assert!((MIN_FAKE_SCHEMA_ID..=MAX_FAKE_SCHEMA_ID).contains(&key[4]));
        let text = std::str::from_utf8(&key[5..]).unwrap();
        assert!(text.ends_with(" key"));
        assert!(uuid::Uuid::parse_str(text.trim_end_matches(" key")).is_ok());
    }

    #[test]
    fn test_key_and_value_bytes_are_separate_draws() {
        let encoder = MalformedEncoder::new(Arc::new(SeededRandom::new(42)));
        let twin = SeededRandom::new(42);
        let record = r#"{"properties":{"context":"Paris"}}"#;

        let mut differing = 0;
        for _ in 0..50 {
            let encoded = encoder.encode(record).unwrap();
            let key = encoded.key.as_bytes().unwrap();
            let value = encoded.value.as_bytes().unwrap();

            // Same sequence as the encoder: key text, key byte, value byte
            let expected_key = format!("{} key", twin.generate_key());
            assert_eq!(key[4], twin.schema_id_byte());
            assert_eq!(value[4], twin.schema_id_byte());
            assert_eq!(&key[5..], expected_key.as_bytes());

            if key[4] != value[4] {
                differing += 1;
            }
        }
        assert!(differing > 0);
    }

    #[test]
    fn test_utf8_context() {
        let encoder = MalformedEncoder::new(Arc::new(ThreadRandom));
        let record = encoder
            .encode(r#"{"properties":{"context":"75, Paris, Île-de-France"}}"#)
            .unwrap();
        assert_eq!(
            &record.value.as_bytes().unwrap()[5..],
            "75, Paris, Île-de-France".as_bytes()
        );
    }

    #[test]
    fn test_missing_context() {
        let encoder = MalformedEncoder::new(Arc::new(ThreadRandom));
        assert!(matches!(
            encoder.encode(r#"{"properties":{"label":"x"}}"#),
            Err(EncodeError::MissingField(_))
        ));
        assert!(matches!(encoder.encode("]["), Err(EncodeError::Parse(_))));
    }
}
