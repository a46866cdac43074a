//! Interpreter collaborator interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// I/O adapter applied by the interpreter to input or output.
///
/// "No adapter" is modelled as `Option::<Adapter>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adapter {
    /// Padding: text is mapped to bytes and padded as needed
    Text,
    /// Bijection between byte arrays and text
    ByteArray,
}

impl Adapter {
    /// Wire name of the adapter
    pub fn as_str(&self) -> &'static str {
        match self {
            Adapter::Text => "text",
            Adapter::ByteArray => "byte-array",
        }
    }

    /// Maps a wire name to an optional adapter. The empty string means none.
    pub fn from_wire(name: &str) -> Result<Option<Adapter>, UnknownAdapter> {
        if name.is_empty() {
            return Ok(None);
        }
        name.parse().map(Some)
    }

    /// Renders an optional adapter as its wire name.
    pub fn to_wire(adapter: Option<Adapter>) -> &'static str {
        adapter.map(|a| a.as_str()).unwrap_or("")
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an adapter name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown adapter {0:?}")]
pub struct UnknownAdapter(pub String);

impl FromStr for Adapter {
    type Err = UnknownAdapter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Adapter::Text),
            "byte-array" => Ok(Adapter::ByteArray),
            other => Err(UnknownAdapter(other.to_string())),
        }
    }
}

/// Adapter selection passed alongside a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub input_adapter: Option<Adapter>,
    pub output_adapter: Option<Adapter>,
}

/// Faults raised by an interpreter.
#[derive(Debug, Error)]
pub enum InterpreterError {
    /// A recognized domain error in the user's program (syntax error,
    /// runtime error, bad input). Shown to the user, not a bug.
    #[error("{0}")]
    Program(String),

    /// An internal invariant of the interpreter failed.
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InterpreterError {
    /// Creates a Program error
    pub fn program(message: impl Into<String>) -> Self {
        Self::Program(message.into())
    }

    /// Only recognized, non-assertion domain errors are user faults.
    pub fn is_user_fault(&self) -> bool {
        matches!(self, Self::Program(_))
    }

    /// Full description of the fault, including the cause chain.
    pub fn detail(&self) -> String {
        match self {
            Self::Program(message) => message.clone(),
            Self::Assertion(message) => format!("AssertionError: {}", message),
            Self::Other(err) => format!("{:?}", err),
        }
    }
}

/// External interpreter service.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Runs a complete program against the given input.
    async fn run(
        &self,
        language: &str,
        program: &str,
        input: &str,
        options: RunOptions,
    ) -> Result<String, InterpreterError>;

    /// Fetches the hello-world sample for a language, if one exists.
    async fn hello_world_program(&self, language: &str)
    -> Result<Option<String>, InterpreterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_wire_names() {
        assert_eq!(Adapter::from_wire("").unwrap(), None);
        assert_eq!(Adapter::from_wire("text").unwrap(), Some(Adapter::Text));
        assert_eq!(
            Adapter::from_wire("byte-array").unwrap(),
            Some(Adapter::ByteArray)
        );
        assert!(Adapter::from_wire("hex").is_err());
        assert_eq!(Adapter::to_wire(None), "");
        assert_eq!(Adapter::to_wire(Some(Adapter::ByteArray)), "byte-array");
    }

    #[test]
    fn test_fault_classification() {
        assert!(InterpreterError::program("Unmatched [").is_user_fault());
        assert!(!InterpreterError::Assertion("stack".into()).is_user_fault());
        assert!(!InterpreterError::Other(anyhow::anyhow!("spawn failed")).is_user_fault());
    }

    #[test]
    fn test_detail_includes_cause_chain() {
        let err = anyhow::anyhow!("root cause").context("while running");
        let detail = InterpreterError::Other(err).detail();
        assert!(detail.contains("while running"));
        assert!(detail.contains("root cause"));
    }
}
