//! Broker transport.
//!
//! Sending is split in two steps: [`Transport::dispatch`] hands a record to the
//! client and returns at once with a future for its delivery report;
//! [`Transport::flush`] waits for everything queued to leave the client.

use crate::config::ClientProperties;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;

/// Where the broker stored a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryMetadata {
    pub partition: i32,
    pub offset: i64,
}

/// Resolves once the broker acknowledged (or rejected) one record.
pub type PendingDelivery = BoxFuture<'static, Result<DeliveryMetadata>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Queue one record. An error means the record was never queued.
    fn dispatch(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<PendingDelivery>;

    /// Wait until queued records are sent or `timeout` expires.
    async fn flush(&self, timeout: Duration) -> Result<()>;
}

/// Transport backed by an rdkafka [`FutureProducer`].
pub struct KafkaTransport {
    producer: FutureProducer,
}

impl KafkaTransport {
    pub fn new(properties: &ClientProperties) -> Result<Self> {
        let producer: FutureProducer = properties.producer_config().create()?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    fn dispatch(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<PendingDelivery> {
        let record = FutureRecord::to(topic).key(key).payload(value);
        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| Error::Kafka(e))?;

        Ok(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => Ok(DeliveryMetadata { partition, offset }),
                Ok(Err((e, _))) => Err(Error::Kafka(e)),
                Err(_) => Err(Error::Delivery(
                    "Producer dropped before the delivery report arrived".to_string(),
                )),
            }
        }
        .boxed())
    }

    async fn flush(&self, timeout: Duration) -> Result<()> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| Error::Delivery(format!("Flush task failed: {e}")))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_from_default_properties() {
        // Creating a producer does not contact the broker
        let transport = KafkaTransport::new(&ClientProperties::new());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_invalid_property_is_rejected() {
        let mut properties = ClientProperties::new();
        properties.set("not.a.real.property", "1");
        assert!(matches!(
            KafkaTransport::new(&properties),
            Err(Error::Kafka(_))
        ));
    }
}
