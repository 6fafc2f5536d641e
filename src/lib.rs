//! address-feed
//!
//! Fetches French address records from a public search API and publishes
//! them to a Kafka topic in one of several wire formats, or reads a topic back.
//!
//! # CLI Usage
//!
//! ```bash
//! # Produce Avro records matching "rivoli" through a local schema registry
//! address-feed produce --type avro --topic addresses "rivoli"
//!
//! # Produce without a registry, ids are assigned in memory
//! address-feed produce --type protobuf --in-memory-registry
//!
//! # Print every record of a topic
//! address-feed consume --topic addresses
//! ```

use anyhow::Context;
use clap::Parser;
use feed_kafka::{ClientProperties, HttpRegistry, InMemoryRegistry, SchemaRegistry};
use std::path::PathBuf;
use std::sync::Arc;

pub mod consume;
pub mod fetch;
pub mod produce;

pub const DEFAULT_TOPIC: &str = "public-french-addresses";
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8081";

#[derive(Parser, Clone, Debug, Default)]
pub struct KafkaOpts {
    /// Kafka bootstrap servers, overrides `bootstrap.servers` from the properties file
    #[arg(long, env = "KAFKA_BROKERS")]
    pub brokers: Option<String>,

    /// Properties file for creating the Kafka client
    #[arg(long, value_name = "PATH")]
    pub properties: Option<PathBuf>,
}

impl KafkaOpts {
    pub fn client_properties(&self) -> anyhow::Result<ClientProperties> {
        let mut properties = match &self.properties {
            Some(path) => ClientProperties::from_file(path)
                .with_context(|| format!("Failed to load client properties from {path:?}"))?,
            None => ClientProperties::new(),
        };
        if let Some(brokers) = &self.brokers {
            properties.set("bootstrap.servers", brokers.as_str());
        }
        Ok(properties)
    }
}

#[derive(Parser, Clone, Debug, Default)]
pub struct RegistryOpts {
    /// Schema registry URL, overrides `schema.registry.url` from the properties file
    #[arg(long, env = "SCHEMA_REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// Assign schema ids locally instead of calling a schema registry
    #[arg(long)]
    pub in_memory_registry: bool,
}

impl RegistryOpts {
    /// Pick the registry: in-memory if asked for, else the command-line URL,
    /// the properties file URL, then the default local registry.
    pub fn registry(&self, properties: &ClientProperties) -> anyhow::Result<Arc<dyn SchemaRegistry>> {
        if self.in_memory_registry {
            tracing::info!("Using the in-memory schema registry");
            return Ok(Arc::new(InMemoryRegistry::new()));
        }

        let url = self
            .registry_url
            .as_deref()
            .or_else(|| properties.registry_url())
            .unwrap_or(DEFAULT_REGISTRY_URL);
        let registry = HttpRegistry::new(url).context("Failed to create schema registry client")?;
        tracing::info!("Using the schema registry at {}", registry.base_url());
        Ok(Arc::new(registry))
    }
}
