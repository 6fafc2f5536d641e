//! Runtime protobuf support: `.proto` parsing, JSON conversion and the wire
//! codec for dynamic messages.

pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod parser;

pub use convert::json_to_message;
pub use decoder::ProtoDecoder;
pub use encoder::{encode_message, encode_message_indexes};
pub use parser::ProtoParser;
