//! `consume` command: print every record of a topic to stdout.

use crate::{KafkaOpts, DEFAULT_TOPIC};
use anyhow::Context;
use clap::Parser;

#[derive(Parser, Clone, Debug)]
pub struct ConsumeArgs {
    /// The topic to consume records from
    #[arg(long, default_value = DEFAULT_TOPIC)]
    pub topic: String,

    #[command(flatten)]
    pub kafka: KafkaOpts,
}

pub async fn run_consume(args: ConsumeArgs) -> anyhow::Result<()> {
    let properties = args.kafka.client_properties()?;
    let mut stdout = std::io::stdout();
    feed_kafka::consume(&properties, &args.topic, &mut stdout)
        .await
        .with_context(|| format!("Failed to consume topic '{}'", args.topic))
}
