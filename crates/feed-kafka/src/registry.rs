//! Schema registry clients.
//!
//! Schemas are registered under a subject and the registry answers with a
//! numeric id, which goes into the wire envelope. [`HttpRegistry`] talks to a
//! Confluent-compatible REST API; [`InMemoryRegistry`] assigns ids locally for
//! offline runs and tests.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Schema language, as named by the registry API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Avro,
    Json,
    Protobuf,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Register `schema` under `subject` and return its id. Registering the
    /// same schema again returns the same id.
    async fn register(&self, subject: &str, schema_type: SchemaType, schema: &str) -> Result<u32>;
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    schema: &'a str,
    #[serde(rename = "schemaType")]
    schema_type: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    id: u32,
}

/// Client for a Confluent-compatible schema registry.
pub struct HttpRegistry {
    base_url: String,
    client: reqwest::Client,
    ids: Mutex<HashMap<(String, String), u32>>,
}

impl HttpRegistry {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Registry(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            ids: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ids(&self) -> MutexGuard<'_, HashMap<(String, String), u32>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SchemaRegistry for HttpRegistry {
    async fn register(&self, subject: &str, schema_type: SchemaType, schema: &str) -> Result<u32> {
        let cache_key = (subject.to_string(), schema.to_string());
        let cached = self.ids().get(&cache_key).copied();
        if let Some(id) = cached {
            return Ok(id);
        }

        let url = format!("{}/subjects/{subject}/versions", self.base_url);
        let body = serde_json::to_vec(&RegisterRequest {
            schema,
            schema_type: schema_type.as_str(),
        })
        .map_err(|e| Error::Serialize(e.to_string()))?;

        tracing::debug!("Registering {schema_type} schema under subject '{subject}'");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, REGISTRY_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, REGISTRY_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Registry(format!("Failed to reach schema registry at '{url}': {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Registry(format!(
                "Registering subject '{subject}' returned status {status}: {text}"
            )));
        }

        let registered: RegisterResponse = response.json().await.map_err(|e| {
            Error::Registry(format!("Invalid response registering subject '{subject}': {e}"))
        })?;

        tracing::info!("Schema for subject '{subject}' has id {}", registered.id);
        self.ids().insert(cache_key, registered.id);
        Ok(registered.id)
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    ids: HashMap<String, u32>,
    subjects: HashMap<String, Vec<u32>>,
}

/// Registry kept in process memory. Ids start at 1 and identical schema text
/// always maps to the same id, whatever the subject.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<InMemoryState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids registered under `subject`, oldest first.
    pub fn versions(&self, subject: &str) -> Vec<u32> {
        self.state().subjects.get(subject).cloned().unwrap_or_default()
    }

    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.state().subjects.keys().cloned().collect();
        subjects.sort();
        subjects
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SchemaRegistry for InMemoryRegistry {
    async fn register(&self, subject: &str, schema_type: SchemaType, schema: &str) -> Result<u32> {
        let mut state = self.state();

        let next_id = state.ids.len() as u32 + 1;
        let id = *state.ids.entry(schema.to_string()).or_insert(next_id);

        let versions = state.subjects.entry(subject.to_string()).or_default();
        if !versions.contains(&id) {
            tracing::debug!("Registered {schema_type} schema {id} under subject '{subject}'");
            versions.push(id);
        }
        Ok(id)
    }
}
