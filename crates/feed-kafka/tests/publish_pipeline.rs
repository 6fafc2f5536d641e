//! Publish pipeline tests against a recording transport and the in-memory
//! registry.

use async_trait::async_trait;
use feed_encoders::{Dispatcher, SchemaLoader, SeededRandom};
use feed_kafka::{
    DeliveryMetadata, Error, InMemoryRegistry, PendingDelivery, Publisher, RecordSerializer,
    Result, Transport,
};
use feed_types::{peek_envelope, FormatTag};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct SentRecord {
    topic: String,
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Accepts every record and acknowledges it on partition 0, except the
/// dispatch numbers listed in `refuse` (queue full) and `reject` (broker
/// error after dispatch).
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<SentRecord>>,
    refuse: HashSet<usize>,
    reject: HashSet<usize>,
    dispatches: Mutex<usize>,
    flushed: AtomicBool,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn dispatch(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<PendingDelivery> {
        let mut dispatches = self.dispatches.lock().unwrap();
        let n = *dispatches;
        *dispatches += 1;

        if self.refuse.contains(&n) {
            return Err(Error::Delivery("Queue full".to_string()));
        }

        let mut sent = self.sent.lock().unwrap();
        let offset = sent.len() as i64;
        sent.push(SentRecord {
            topic: topic.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        });

        let reject = self.reject.contains(&n);
        Ok(async move {
            if reject {
                Err(Error::Delivery("Message timed out".to_string()))
            } else {
                Ok(DeliveryMetadata {
                    partition: 0,
                    offset,
                })
            }
        }
        .boxed())
    }

    async fn flush(&self, _timeout: Duration) -> Result<()> {
        self.flushed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn setup(transport: Arc<RecordingTransport>) -> (Publisher, Dispatcher, Arc<InMemoryRegistry>) {
    let registry = Arc::new(InMemoryRegistry::new());
    let publisher = Publisher::new(transport, RecordSerializer::new(registry.clone()));
    let dispatcher = Dispatcher::new(
        Arc::new(SchemaLoader::embedded()),
        Arc::new(SeededRandom::new(2024)),
    );
    (publisher, dispatcher, registry)
}

fn address(label: &str, context: &str) -> String {
    serde_json::json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [2.35, 48.85]},
        "properties": {
            "label": label,
            "score": 0.9,
            "id": "75104_8158",
            "name": label,
            "x": 652000.0,
            "y": 6862000.0,
            "context": context,
            "type": "street"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_text_records_are_delivered_in_order() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, _) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::Text);

    let records = vec![
        address("10 Rue de Rivoli", "75, Paris, Île-de-France"),
        address("Place Bellecour", "69, Rhône, Auvergne-Rhône-Alpes"),
    ];
    let report = publisher.publish(&route, records, "addresses").await;

    assert_eq!(report.attempted, 2);
    assert!(report.all_delivered());
    assert!(transport.flushed.load(Ordering::SeqCst));

    let sent = transport.sent();
    assert_eq!(sent[0].topic, "addresses");
    assert_eq!(sent[0].value, b"10 Rue de Rivoli");
    assert_eq!(sent[1].value, b"Place Bellecour");
    assert_eq!(report.delivered[1].offset, 1);
}

#[tokio::test]
async fn test_bad_records_are_skipped() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, _) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::Text);

    let records = vec![
        "not json".to_string(),
        address("Rue de la Paix", "75, Paris, Île-de-France"),
        r#"{"properties": {}}"#.to_string(),
    ];
    let report = publisher.publish(&route, records, "addresses").await;

    assert!(report.is_consistent());
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.delivered[0].index, 1);
    let skipped: Vec<usize> = report.skipped.iter().map(|s| s.index).collect();
    assert_eq!(skipped, vec![0, 2]);
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_dispatch_and_delivery_failures_are_reported() {
    let transport = Arc::new(RecordingTransport {
        refuse: HashSet::from([0]),
        reject: HashSet::from([2]),
        ..Default::default()
    });
    let (publisher, dispatcher, _) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::Json);

    let records: Vec<String> = (0..4).map(|i| format!("{{\"n\": {i}}}")).collect();
    let report = publisher.publish(&route, records, "raw").await;

    assert!(report.is_consistent());
    assert_eq!(report.delivered.len(), 2);
    let mut failed: Vec<usize> = report.failed.iter().map(|f| f.index).collect();
    failed.sort();
    assert_eq!(failed, vec![0, 2]);
}

#[tokio::test]
async fn test_malformed_records() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, _) = setup(transport.clone());
    let route = dispatcher.resolve_str("malformed");

    let report = publisher
        .publish(&route, vec![address("x", "Paris")], "broken")
        .await;
    assert!(report.all_delivered());

    let sent = transport.sent();
    assert_eq!(&sent[0].value[..4], &[0, 0, 0, 0]);
    assert!((1..=126).contains(&sent[0].value[4]));
    assert_eq!(&sent[0].value[5..], b"Paris");
    assert!(sent[0].key.ends_with(b" key"));
}

#[tokio::test]
async fn test_avro_records_use_registered_ids() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, registry) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::Avro);

    let records = vec![
        address("10 Rue de Rivoli", "75, Paris, Île-de-France"),
        address("Place Bellecour", "69, Rhône, Auvergne-Rhône-Alpes"),
        r#"{"type": "Feature"}"#.to_string(),
    ];
    let report = publisher.publish(&route, records, "addresses-avro").await;

    assert_eq!(report.delivered.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 2);

    let key_ids = registry.versions("addresses-avro-key");
    let value_ids = registry.versions("addresses-avro-value");
    assert_eq!(key_ids.len(), 1);
    assert_eq!(value_ids.len(), 1);

    for record in transport.sent() {
        let (key_id, _) = peek_envelope(&record.key).expect("key envelope");
        let (value_id, _) = peek_envelope(&record.value).expect("value envelope");
        assert_eq!(key_id, key_ids[0]);
        assert_eq!(value_id, value_ids[0]);
    }
}

#[tokio::test]
async fn test_invalid_json_records() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, registry) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::InvalidJson);

    let report = publisher
        .publish(&route, vec![address("x", "Paris"), "[]".to_string()], "json")
        .await;
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.skipped.len(), 1);

    let sent = transport.sent();
    let (_, body) = peek_envelope(&sent[0].value).unwrap();
    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    assert_eq!(value["updatedAt"], "2007");
    assert_eq!(registry.subjects(), vec!["json-key", "json-value"]);
}

#[tokio::test]
async fn test_protobuf_records() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, _) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::Protobuf);

    let report = publisher
        .publish(&route, vec![address("x", "Paris")], "proto")
        .await;
    assert!(report.all_delivered());

    let sent = transport.sent();
    assert_eq!(sent[0].value[0], 0);
    assert_eq!(sent[0].value[5], 0);
    assert_eq!(sent[0].key[5], 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let transport = Arc::new(RecordingTransport::default());
    let (publisher, dispatcher, _) = setup(transport.clone());
    let route = dispatcher.resolve(FormatTag::Xml);

    let report = publisher.publish(&route, Vec::<String>::new(), "empty").await;
    assert_eq!(report.attempted, 0);
    assert!(report.is_consistent());
    assert!(transport.flushed.load(Ordering::SeqCst));
}
