//! Consume loop: prints every record of a topic.

use crate::config::ClientProperties;
use crate::error::{Error, Result};
use feed_types::peek_envelope;
use rdkafka::consumer::{Consumer as RdkafkaConsumer, StreamConsumer};
use rdkafka::message::Message as RdkafkaMessage;
use std::io::Write;

/// One line of consumer output. Keys and values are shown as UTF-8, with
/// invalid sequences replaced.
pub fn render_record(topic: &str, offset: i64, key: Option<&[u8]>, value: Option<&[u8]>) -> String {
    format!(
        "topic = {topic}, offset = {offset}, key = {}, value = {}",
        render_bytes(key),
        render_bytes(value)
    )
}

fn render_bytes(bytes: Option<&[u8]>) -> String {
    match bytes {
        Some(b) => String::from_utf8_lossy(b).into_owned(),
        None => "null".to_string(),
    }
}

/// Subscribe to `topic` and write one line per record to `sink`, forever.
///
/// Receive errors are logged and the loop keeps going; only setup failures
/// and a broken sink end it.
pub async fn consume<W: Write + Send>(
    properties: &ClientProperties,
    topic: &str,
    sink: &mut W,
) -> Result<()> {
    let consumer: StreamConsumer = properties
        .consumer_config()
        .create()
        .map_err(|e| Error::Consumer(format!("Failed to create consumer: {e}")))?;

    consumer
        .subscribe(&[topic])
        .map_err(|e| Error::Consumer(format!("Failed to subscribe to topic: {e}")))?;

    tracing::info!("Consuming topic '{topic}'");

    loop {
        let msg = match consumer.recv().await {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!("Error receiving message: {e}");
                continue;
            }
        };

        if let Some((schema_id, body)) = msg.payload().and_then(peek_envelope) {
            tracing::debug!(
                "Value at offset {} is framed with schema id {schema_id} ({} bytes)",
                msg.offset(),
                body.len()
            );
        }

        let line = render_record(msg.topic(), msg.offset(), msg.key(), msg.payload());
        writeln!(sink, "{line}")?;
        sink.flush()?;
    }
}
