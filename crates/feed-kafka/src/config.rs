//! Kafka client configuration.
//!
//! Clients start from built-in defaults. An optional `.properties` file (the
//! format Kafka's own tooling uses) overrides them key by key and is passed
//! through to librdkafka, except for keys that only mean something to the JVM
//! serializers and `schema.registry.url`, which the registry client consumes.

use crate::error::{Error, Result};
use rdkafka::config::ClientConfig;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_BROKERS: &str = "localhost:9092";
pub const DEFAULT_GROUP_ID: &str = "address-feed-consumer";
pub const SCHEMA_REGISTRY_URL_KEY: &str = "schema.registry.url";

const PRODUCER_DEFAULTS: &[(&str, &str)] = &[
    ("bootstrap.servers", DEFAULT_BROKERS),
    ("message.timeout.ms", "5000"),
];

const CONSUMER_DEFAULTS: &[(&str, &str)] = &[
    ("bootstrap.servers", DEFAULT_BROKERS),
    ("group.id", DEFAULT_GROUP_ID),
    ("auto.offset.reset", "earliest"),
    ("session.timeout.ms", "6000"),
    ("heartbeat.interval.ms", "3000"),
    ("auto.commit.interval.ms", "200"),
    ("enable.auto.commit", "true"),
    ("enable.partition.eof", "false"),
];

/// Keys understood by the Java client only; librdkafka rejects them.
const JVM_ONLY_KEYS: &[&str] = &[
    "key.serializer",
    "value.serializer",
    "key.deserializer",
    "value.deserializer",
];

/// Client properties layered over the producer and consumer defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientProperties {
    entries: BTreeMap<String, String>,
    registry_url: Option<String>,
}

impl ClientProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `.properties` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read properties file '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!("Loaded client properties from {}", path.display());
        Ok(Self::parse(&text))
    }

    /// Parse `.properties` text: `key=value` or `key: value` per line, `#`
    /// and `!` start comments, a trailing `\` continues the value.
    pub fn parse(text: &str) -> Self {
        let mut properties = Self::new();
        let mut pending = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            let is_comment = line.starts_with('#') || line.starts_with('!');
            if pending.is_empty() && (line.is_empty() || is_comment) {
                continue;
            }

            if let Some(continued) = line.strip_suffix('\\') {
                pending.push_str(continued);
                continue;
            }
            pending.push_str(line);

            let logical = std::mem::take(&mut pending);
            if let Some((key, value)) = split_entry(&logical) {
                properties.set(key, value);
            }
        }

        if let Some((key, value)) = split_entry(&pending) {
            properties.set(key, value);
        }

        properties
    }

    /// Set a property. `schema.registry.url` is kept apart from the Kafka
    /// entries and JVM-only keys are dropped.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if key == SCHEMA_REGISTRY_URL_KEY {
            self.registry_url = Some(value);
        } else if JVM_ONLY_KEYS.contains(&key.as_str()) {
            tracing::warn!("Ignoring client property '{key}', it only applies to Java clients");
        } else {
            self.entries.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn registry_url(&self) -> Option<&str> {
        self.registry_url.as_deref()
    }

    pub fn producer_config(&self) -> ClientConfig {
        self.layered(PRODUCER_DEFAULTS)
    }

    pub fn consumer_config(&self) -> ClientConfig {
        self.layered(CONSUMER_DEFAULTS)
    }

    fn layered(&self, defaults: &[(&str, &str)]) -> ClientConfig {
        let mut config = ClientConfig::new();
        for (key, value) in defaults {
            config.set(*key, *value);
        }
        for (key, value) in &self.entries {
            config.set(key, value);
        }
        config
    }
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace.
/// Whitespace around the separator is skipped; a backslash escapes the next
/// key character.
fn split_entry(line: &str) -> Option<(String, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut key = String::new();
    let mut chars = line.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    key.push(escaped);
                }
            }
            '=' | ':' => return Some((key, line[pos + 1..].trim_start())),
            c if c.is_whitespace() => {
                let rest = line[pos..].trim_start();
                let value = rest.strip_prefix(['=', ':']).unwrap_or(rest);
                return Some((key, value.trim_start()));
            }
            c => key.push(c),
        }
    }
    Some((key, ""))
}
