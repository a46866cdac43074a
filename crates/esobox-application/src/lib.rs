//! Application layer of Esobox.
//!
//! # Module Structure
//!
//! - `session_controller`: Operations on a live session (run, hello world,
//!   export, language switch)
//! - `export`: Shareable link rendering
//! - `bootstrap`: Building a controller from configuration and launch
//!   parameters

pub mod bootstrap;
pub mod export;
pub mod session_controller;

pub use bootstrap::{Bootstrapped, LaunchParams, Runtime, bootstrap};
pub use export::{Export, ExportFormat, ExportSettings};
pub use session_controller::{
    ControllerServices, ControllerSettings, INTERNAL_ERROR_BANNER, RunOutcome, SessionController,
};
