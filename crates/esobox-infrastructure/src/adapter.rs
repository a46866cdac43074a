//! Byte-level I/O adapters for subprocess interpreters.
//!
//! - no adapter / `text`: input is passed as UTF-8, output is read as UTF-8
//!   (invalid sequences replaced)
//! - `byte-array`: input is a list of decimal byte values separated by
//!   whitespace or commas; output bytes are rendered the same way

use esobox_core::interpreter::{Adapter, InterpreterError};

/// Converts the Input field into the bytes fed to the interpreter.
pub fn encode_input(adapter: Option<Adapter>, input: &str) -> Result<Vec<u8>, InterpreterError> {
    match adapter {
        None | Some(Adapter::Text) => Ok(input.as_bytes().to_vec()),
        Some(Adapter::ByteArray) => input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<u8>().map_err(|_| {
                    InterpreterError::program(format!(
                        "Input adapter byte-array: {:?} is not a byte value (0-255)",
                        token
                    ))
                })
            })
            .collect(),
    }
}

/// Converts the interpreter's output bytes into the Output field.
pub fn decode_output(adapter: Option<Adapter>, output: &[u8]) -> String {
    match adapter {
        None | Some(Adapter::Text) => String::from_utf8_lossy(output).into_owned(),
        Some(Adapter::ByteArray) => output
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(" "),
    }
}
