use feed_types::EncodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Schema registry error: {0}")]
    Registry(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
