//! Shared types for address-feed.
//!
//! This crate holds the data model that the encoders and the Kafka plumbing
//! agree on: the format selector, the encoded key/value payloads, the
//! schema-registry wire envelope and the dynamic protobuf message types.
//!
//! # Architecture
//!
//! ```text
//! RawRecord (JSON text) --Encoder--> EncodedRecord { key: Payload, value: Payload }
//!                                          |
//!                         RecordSerializer (feed-kafka) --> envelope bytes --> broker
//! ```
//!
//! # Modules
//!
//! - [`format`] - `FormatTag` and the serializer pairing it selects
//! - [`payload`] - `Payload` variants produced by encoders
//! - [`envelope`] - magic byte + schema id framing
//! - [`proto`] - runtime protobuf descriptors and dynamic messages
//! - [`error`] - Error types for encoding and schema loading

pub mod envelope;
pub mod error;
pub mod format;
pub mod payload;
pub mod proto;

pub use envelope::{peek_envelope, write_envelope, ENVELOPE_HEADER_LEN, MAGIC_BYTE};
pub use error::{EncodeError, Result, SchemaLoadError};
pub use format::{FormatTag, SerializerConfig, SerializerKind};
pub use payload::{AvroRecord, EncodedRecord, JsonSchemaEnvelope, Payload, ProtobufRecord};
pub use proto::{
    ProtoEnumDescriptor, ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage,
    ProtoMessageDescriptor, ProtoSchema, ProtoType,
};
