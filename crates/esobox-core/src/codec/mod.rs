//! Session token protocol.
//!
//! - `base62`: URL-safe text rendering of byte buffers
//! - `wire`: checksummed field serializer
//! - `version`: protocol version triple
//! - `session_codec`: the record layout and validation pipeline

pub mod base62;
pub mod session_codec;
pub mod version;
pub mod wire;

pub use base62::{Base62, BaseNCodec, BaseNError};
pub use session_codec::{DEFAULT_MAGIC, SessionCodec};
pub use version::ProtocolVersion;
pub use wire::{WireReader, WireWriter};
