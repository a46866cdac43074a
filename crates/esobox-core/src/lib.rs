//! Core domain of Esobox.
//!
//! A session (language, adapters, source encoding and six text fields) can be
//! packed into a checksummed URL-safe token and restored from one. Operations
//! that mutate a session are serialized through a per-session [`RunLock`].
//!
//! # Module Structure
//!
//! - `session`: The in-memory session and its wire record
//! - `codec`: Token protocol (base-62, wire serializer, versions, codec)
//! - `run_lock`: Single-slot gate for exclusive operations
//! - `language`, `encoding`, `interpreter`, `fault`, `resolver`:
//!   interfaces to the collaborators the core relies on

pub mod codec;
pub mod encoding;
pub mod error;
pub mod fault;
pub mod interpreter;
pub mod language;
pub mod resolver;
pub mod run_lock;
pub mod session;

// Re-export common types
pub use codec::{ProtocolVersion, SessionCodec};
pub use error::{CoreError, DecodeError, Result};
pub use run_lock::{ExclusiveOp, InputSurfaces, RunLock};
pub use session::{Field, Session, SessionRecord, SharedSession};
