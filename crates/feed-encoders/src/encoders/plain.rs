use super::{parse_record, property, Encoder};
use crate::random::RandomSource;
use crate::xml::to_xml;
use feed_types::{EncodedRecord, FormatTag, Payload, Result};
use std::sync::Arc;

/// Forwards the raw record untouched. Invalid JSON is sent as-is.
pub struct JsonEncoder {
    random: Arc<dyn RandomSource>,
}

impl JsonEncoder {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl Encoder for JsonEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::Json
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        Ok(EncodedRecord::new(
            Payload::Text(self.random.generate_key()),
            Payload::Text(record.to_string()),
        ))
    }
}

/// Sends only the human-readable label of the address.
pub struct TextEncoder {
    random: Arc<dyn RandomSource>,
}

impl TextEncoder {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl Encoder for TextEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::Text
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let json = parse_record(record)?;
        let label = property(&json, "label")?;
        Ok(EncodedRecord::new(
            Payload::Text(self.random.generate_key()),
            Payload::Text(label.to_string()),
        ))
    }
}

pub struct XmlEncoder {
    random: Arc<dyn RandomSource>,
}

impl XmlEncoder {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl Encoder for XmlEncoder {
    fn format(&self) -> FormatTag {
        FormatTag::Xml
    }

    fn encode(&self, record: &str) -> Result<EncodedRecord> {
        let json = parse_record(record)?;
        let xml = to_xml(&json)?;
        Ok(EncodedRecord::new(
            Payload::Text(self.random.generate_key()),
            Payload::Text(xml),
        ))
    }
}
