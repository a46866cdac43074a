//! Error types for the Esobox core.

use thiserror::Error;

/// Reasons a session token is rejected while decoding.
///
/// Every variant is user-correctable: startup logic shows the message as a
/// one-line banner and falls back to a blank session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The token contains characters outside the URL-safe alphabet, or its
    /// base-62 structure is malformed.
    #[error("Invalid URL")]
    InvalidToken,

    /// The trailing integrity checksum does not match the buffer.
    #[error("Invalid URL checksum")]
    ChecksumMismatch,

    /// The record was produced for a different protocol namespace.
    #[error("Incorrect UID")]
    WrongNamespace,

    /// The version triple is not one this build can read.
    #[error("Unsupported version {0}")]
    UnsupportedVersion(String),

    /// The record names a language that is not in the catalog.
    #[error("Unknown language {0:?}")]
    UnknownLanguage(String),

    /// The checksum matched but the fields themselves are unreadable.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A legacy record's code reference could not be resolved.
    #[error("Cannot load code: {0}")]
    LegacyCodeResolution(String),
}

impl DecodeError {
    /// Creates a MalformedRecord error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord(message.into())
    }

    /// Check if this error was raised before any byte-level parsing
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken)
    }
}

/// A shared error type for the Esobox core and the layers above it.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A session token could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Unexpected failure, including failed internal invariants.
    ///
    /// `detail` carries the full fault description written to the Debug field.
    #[error("Internal error: {message}")]
    InternalFault { message: String, detail: String },

    /// A caller broke a programming contract (unknown field name, switching
    /// to a language outside the catalog, ...). Never caused by user input.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl CoreError {
    /// Creates a ContractViolation error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InternalFault whose detail is the message itself
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::InternalFault {
            detail: message.clone(),
            message,
        }
    }

    /// Check if this is an internal fault
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalFault { .. })
    }

    /// Check if this is a contract violation
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation(_))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_messages() {
        assert_eq!(DecodeError::InvalidToken.to_string(), "Invalid URL");
        assert_eq!(
            DecodeError::ChecksumMismatch.to_string(),
            "Invalid URL checksum"
        );
        assert_eq!(
            DecodeError::UnsupportedVersion("9.9.9".into()).to_string(),
            "Unsupported version 9.9.9"
        );
        assert_eq!(
            DecodeError::UnknownLanguage("Befunge".into()).to_string(),
            "Unknown language \"Befunge\""
        );
    }

    #[test]
    fn test_decode_error_converts_into_core_error() {
        let err: CoreError = DecodeError::WrongNamespace.into();
        assert!(matches!(err, CoreError::Decode(DecodeError::WrongNamespace)));
        assert_eq!(err.to_string(), "Incorrect UID");
    }

    #[test]
    fn test_internal_helper_copies_detail() {
        match CoreError::internal("boom") {
            CoreError::InternalFault { message, detail } => {
                assert_eq!(message, "boom");
                assert_eq!(detail, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
