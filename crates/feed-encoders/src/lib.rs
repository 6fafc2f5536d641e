//! Record encoders for address-feed.
//!
//! Each supported format has an [`Encoder`] turning one raw JSON address
//! record into a key/value pair of payloads. The [`Dispatcher`] maps a
//! [`FormatTag`](feed_types::FormatTag) to its encoder and to the serializers
//! the payloads need downstream.
//!
//! Schema documents come from a [`SchemaLoader`]; keys and random bytes come
//! from a [`RandomSource`] so tests can make them deterministic.

pub mod avro;
pub mod dispatcher;
pub mod encoders;
pub mod proto;
pub mod random;
pub mod resources;
pub mod xml;

pub use dispatcher::{Dispatcher, EncoderRoute};
pub use encoders::{
    AvroEncoder, Encoder, InvalidJsonEncoder, JsonEncoder, JsonSchemaEncoder, MalformedEncoder,
    ProtobufEncoder, TextEncoder, XmlEncoder,
};
pub use proto::{encode_message, encode_message_indexes, ProtoDecoder, ProtoParser};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use resources::{SchemaLoader, SchemaResource};
