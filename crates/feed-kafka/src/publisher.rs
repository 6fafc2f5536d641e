//! Publish pipeline.
//!
//! Streams raw records through an encoder and the serializers into a
//! transport. One bad record never stops the batch: encoding and
//! serialization failures are skipped, delivery failures are reported.

use crate::serializer::{RecordPart, RecordSerializer};
use crate::transport::{PendingDelivery, Transport};
use feed_encoders::EncoderRoute;
use feed_types::{EncodedRecord, SerializerConfig};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// A record that never reached the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// A record the broker acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub index: usize,
    pub partition: i32,
    pub offset: i64,
}

/// A record the transport refused or the broker rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelivery {
    pub index: usize,
    pub error: String,
}

/// Outcome of one publish call. Every attempted record ends up in exactly one
/// of `skipped`, `delivered` or `failed`.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub attempted: usize,
    pub skipped: Vec<SkippedRecord>,
    pub delivered: Vec<Delivery>,
    pub failed: Vec<FailedDelivery>,
    pub duration: Duration,
}

impl PublishReport {
    pub fn is_consistent(&self) -> bool {
        self.attempted == self.skipped.len() + self.delivered.len() + self.failed.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.delivered.len() == self.attempted
    }
}

pub struct Publisher {
    transport: Arc<dyn Transport>,
    serializer: RecordSerializer,
    flush_timeout: Duration,
}

impl Publisher {
    pub fn new(transport: Arc<dyn Transport>, serializer: RecordSerializer) -> Self {
        Self {
            transport,
            serializer,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Encode, serialize and send every record, then flush and wait for all
    /// delivery reports.
    pub async fn publish<I>(&self, route: &EncoderRoute, records: I, topic: &str) -> PublishReport
    where
        I: IntoIterator<Item = String>,
    {
        let start_time = Instant::now();
        let mut report = PublishReport::default();
        let mut pending: Vec<(usize, PendingDelivery)> = Vec::new();

        info!(
            "Publishing {} records to topic '{topic}' (key: {}, value: {})",
            route.format(),
            route.serializers.key,
            route.serializers.value
        );

        for (index, record) in records.into_iter().enumerate() {
            report.attempted += 1;

            let encoded = match route.encoder.encode(&record) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!("Skipping record {index}: {e}");
                    report.skipped.push(SkippedRecord {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let (key, value) = match self.serialize(route.serializers, topic, &encoded).await {
                Ok(bytes) => bytes,
                Err(reason) => {
                    warn!("Skipping record {index}: {reason}");
                    report.skipped.push(SkippedRecord { index, reason });
                    continue;
                }
            };

            match self.transport.dispatch(topic, &key, &value) {
                Ok(delivery) => {
                    debug!("Dispatched record {index} ({} bytes)", value.len());
                    pending.push((index, delivery));
                }
                Err(e) => {
                    error!("Failed to dispatch record {index}: {e}");
                    report.failed.push(FailedDelivery {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Err(e) = self.transport.flush(self.flush_timeout).await {
            warn!("Flush did not complete: {e}");
        }

        let (indexes, deliveries): (Vec<usize>, Vec<PendingDelivery>) = pending.into_iter().unzip();
        for (index, outcome) in indexes.into_iter().zip(join_all(deliveries).await) {
            match outcome {
                Ok(metadata) => {
                    info!(
                        "Record {index} delivered to partition {} at offset {}",
                        metadata.partition, metadata.offset
                    );
                    report.delivered.push(Delivery {
                        index,
                        partition: metadata.partition,
                        offset: metadata.offset,
                    });
                }
                Err(e) => {
                    error!("Record {index} was not delivered: {e}");
                    report.failed.push(FailedDelivery {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.duration = start_time.elapsed();
        info!(
            "Publish complete: {} attempted, {} delivered, {} skipped, {} failed in {:?}",
            report.attempted,
            report.delivered.len(),
            report.skipped.len(),
            report.failed.len(),
            report.duration
        );
        report
    }

    async fn serialize(
        &self,
        serializers: SerializerConfig,
        topic: &str,
        record: &EncodedRecord,
    ) -> std::result::Result<(Vec<u8>, Vec<u8>), String> {
        let key = self
            .serializer
            .serialize(serializers.key, topic, RecordPart::Key, &record.key)
            .await
            .map_err(|e| format!("key serialization failed: {e}"))?;
        let value = self
            .serializer
            .serialize(serializers.value, topic, RecordPart::Value, &record.value)
            .await
            .map_err(|e| format!("value serialization failed: {e}"))?;
        Ok((key, value))
    }
}
