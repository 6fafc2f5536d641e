//! Kafka plumbing for address-feed.
//!
//! - [`serializer`] - turns encoder payloads into wire bytes, registering
//!   schemas with a [`registry`] for the envelope formats
//! - [`transport`] - dispatch/flush over an rdkafka producer
//! - [`publisher`] - the publish pipeline and its report
//! - [`consumer`] - the consume loop
//! - [`config`] - client defaults and `.properties` overrides

pub mod config;
pub mod consumer;
pub mod error;
pub mod publisher;
pub mod registry;
pub mod serializer;
pub mod transport;

pub use config::ClientProperties;
pub use consumer::{consume, render_record};
pub use error::{Error, Result};
pub use publisher::{Delivery, FailedDelivery, PublishReport, Publisher, SkippedRecord};
pub use registry::{HttpRegistry, InMemoryRegistry, SchemaRegistry, SchemaType};
pub use serializer::{subject_name, RecordPart, RecordSerializer};
pub use transport::{DeliveryMetadata, KafkaTransport, PendingDelivery, Transport};
