//! Schema document loading.
//!
//! Schema documents are opaque text identified by a fixed logical path. By
//! default they are compiled into the binary; a directory override lets a
//! deployment ship its own documents under the same relative paths.

use feed_types::SchemaLoadError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// The six schema documents the envelope encoders rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaResource {
    AvroKey,
    AvroValue,
    JsonSchemaKey,
    JsonSchemaValue,
    ProtobufKey,
    ProtobufValue,
}

impl SchemaResource {
    pub const ALL: [SchemaResource; 6] = [
        SchemaResource::AvroKey,
        SchemaResource::AvroValue,
        SchemaResource::JsonSchemaKey,
        SchemaResource::JsonSchemaValue,
        SchemaResource::ProtobufKey,
        SchemaResource::ProtobufValue,
    ];

    /// Logical path, relative to the resource root.
    pub fn path(&self) -> &'static str {
        match self {
            SchemaResource::AvroKey => "avro/key-schema.json",
            SchemaResource::AvroValue => "avro/value-schema.json",
            SchemaResource::JsonSchemaKey => "json-schema/key-schema.json",
            SchemaResource::JsonSchemaValue => "json-schema/value-schema.json",
            SchemaResource::ProtobufKey => "protobuf/key-schema.proto",
            SchemaResource::ProtobufValue => "protobuf/value-schema.proto",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            SchemaResource::AvroKey => include_str!("../resources/avro/key-schema.json"),
            SchemaResource::AvroValue => include_str!("../resources/avro/value-schema.json"),
            SchemaResource::JsonSchemaKey => {
                include_str!("../resources/json-schema/key-schema.json")
            }
            SchemaResource::JsonSchemaValue => {
                include_str!("../resources/json-schema/value-schema.json")
            }
            SchemaResource::ProtobufKey => include_str!("../resources/protobuf/key-schema.proto"),
            SchemaResource::ProtobufValue => {
                include_str!("../resources/protobuf/value-schema.proto")
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    Embedded,
    Directory(PathBuf),
}

/// Loads schema documents and keeps them for the rest of the process.
#[derive(Debug)]
pub struct SchemaLoader {
    source: Source,
    cache: Mutex<HashMap<SchemaResource, Arc<str>>>,
}

impl SchemaLoader {
    /// Serve the documents compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            source: Source::Embedded,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Read documents from `dir`, e.g. `dir/avro/key-schema.json`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Directory(dir.into()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load a document as text.
    pub fn load(&self, resource: SchemaResource) -> Result<Arc<str>, SchemaLoadError> {
        if let Some(cached) = self.cache().get(&resource) {
            return Ok(Arc::clone(cached));
        }

        let text: Arc<str> = match &self.source {
            Source::Embedded => Arc::from(resource.embedded()),
            Source::Directory(dir) => {
                let path = dir.join(resource.path());
                let content =
                    std::fs::read_to_string(&path).map_err(|source| SchemaLoadError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                Arc::from(content)
            }
        };

        tracing::debug!("Loaded schema resource '{}'", resource.path());
        self.cache().insert(resource, Arc::clone(&text));
        Ok(text)
    }

    /// Load a JSON document (Avro or JSON-Schema) as a parsed tree.
    pub fn load_json(&self, resource: SchemaResource) -> Result<serde_json::Value, SchemaLoadError> {
        let text = self.load(resource)?;
        serde_json::from_str(&text).map_err(|e| SchemaLoadError::Invalid {
            path: resource.path().to_string(),
            message: e.to_string(),
        })
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<SchemaResource, Arc<str>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::embedded()
    }
}
