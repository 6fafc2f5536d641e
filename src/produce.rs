//! `produce` command: fetch addresses and publish them in the chosen format.

use crate::fetch::{fetch_addresses, DEFAULT_ADDRESS_API_URL};
use crate::{KafkaOpts, RegistryOpts, DEFAULT_TOPIC};
use anyhow::Context;
use clap::Parser;
use feed_encoders::{Dispatcher, RandomSource, SchemaLoader, SeededRandom, ThreadRandom};
use feed_kafka::{KafkaTransport, PublishReport, Publisher, RecordSerializer};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Clone, Debug)]
pub struct ProduceArgs {
    /// The topic to produce records to
    #[arg(long, default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// avro, json, json-schema, protobuf, text, xml, malformed or invalid-json.
    /// Unknown values fall back to text.
    #[arg(long = "type", default_value = "json")]
    pub format: String,

    /// Your query passed to the address search API
    #[arg(default_value = "kafka")]
    pub query: String,

    /// Address search URL template, `%s` is replaced by the query
    #[arg(long, default_value = DEFAULT_ADDRESS_API_URL, env = "ADDRESS_API_URL")]
    pub api_url: String,

    /// Directory holding avro/, json-schema/ and protobuf/ schema documents
    /// to use instead of the built-in ones
    #[arg(long, value_name = "DIR")]
    pub schemas_dir: Option<PathBuf>,

    /// Seed for generated keys and random bytes
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub kafka: KafkaOpts,

    #[command(flatten)]
    pub registry: RegistryOpts,
}

impl ProduceArgs {
    fn dispatcher(&self) -> Dispatcher {
        let loader = match &self.schemas_dir {
            Some(dir) => SchemaLoader::from_dir(dir),
            None => SchemaLoader::embedded(),
        };
        let random: Arc<dyn RandomSource> = match self.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Dispatcher::new(Arc::new(loader), random)
    }
}

pub async fn run_produce(args: ProduceArgs) -> anyhow::Result<PublishReport> {
    let properties = args.kafka.client_properties()?;
    let registry = args.registry.registry(&properties)?;

    tracing::info!("The API is '{}'", args.api_url);
    let records = fetch_addresses(&args.api_url, &args.query)
        .await
        .context("Failed to fetch address records")?;

    let route = args.dispatcher().resolve_str(&args.format);
    tracing::info!(
        "About to produce {} records to topic '{}', serialization type is '{}'",
        records.len(),
        args.topic,
        route.format()
    );

    let transport = KafkaTransport::new(&properties).context("Failed to create Kafka producer")?;
    let publisher = Publisher::new(Arc::new(transport), RecordSerializer::new(registry));
    let report = publisher.publish(&route, records, &args.topic).await;

    if !report.failed.is_empty() {
        tracing::warn!(
            "{} of {} records were not delivered",
            report.failed.len(),
            report.attempted
        );
    }
    Ok(report)
}
