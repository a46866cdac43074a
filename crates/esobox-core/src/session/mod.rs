//! Session domain module.
//!
//! # Module Structure
//!
//! - `field`: The closed set of section identifiers (`Field`)
//! - `model`: Wire content (`SessionRecord`) and interactive state (`Session`)
//! - `timestamp`: Creation time as carried on the wire (`Timestamp`)

mod field;
mod model;
mod timestamp;

// Re-export public API
pub use field::{Expansion, Field};
pub use model::{InputStates, RunState, Section, Session, SessionRecord};
pub use timestamp::Timestamp;

/// A session shared between the controller and the exclusive operations it
/// spawns.
pub type SharedSession = std::sync::Arc<tokio::sync::RwLock<Session>>;
