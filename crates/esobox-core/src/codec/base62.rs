//! URL-safe base-62 text codec.
//!
//! Bytes are processed in groups of eight. Each group is read as a
//! big-endian `u64` and written as exactly eleven base-62 digits. A final
//! group shorter than eight bytes is written the same way (right-aligned)
//! and followed by one `=` for every missing byte, so the decoder knows how
//! many bytes the group carries.

use thiserror::Error;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const GROUP_BYTES: usize = 8;
const GROUP_DIGITS: usize = 11;

/// Structural pad character.
pub const PAD: char = '=';

/// Errors raised while decoding base-N text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseNError {
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("invalid length {0}")]
    InvalidLength(usize),
    #[error("invalid padding ({0} pad characters)")]
    InvalidPadding(usize),
    #[error("digit group out of range")]
    GroupOverflow,
}

/// Byte/text codec used to render session buffers.
pub trait BaseNCodec: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> String;
    fn decode(&self, text: &str) -> Result<Vec<u8>, BaseNError>;
}

/// The base-62 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base62;

fn digit_value(c: u8) -> Option<u64> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u64),
        b'A'..=b'Z' => Some((c - b'A') as u64 + 10),
        b'a'..=b'z' => Some((c - b'a') as u64 + 36),
        _ => None,
    }
}

fn push_group(out: &mut String, mut value: u64) {
    let mut digits = [ALPHABET[0]; GROUP_DIGITS];
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(value % 62) as usize];
        value /= 62;
    }
    out.extend(digits.iter().map(|&d| d as char));
}

fn read_group(digits: &[u8]) -> Result<u64, BaseNError> {
    let mut value: u128 = 0;
    for &c in digits {
        let digit = digit_value(c).ok_or(BaseNError::InvalidCharacter(c as char))?;
        value = value * 62 + digit as u128;
    }
    u64::try_from(value).map_err(|_| BaseNError::GroupOverflow)
}

impl BaseNCodec for Base62 {
    fn encode(&self, bytes: &[u8]) -> String {
        let groups = bytes.len().div_ceil(GROUP_BYTES);
        let mut out = String::with_capacity(groups * GROUP_DIGITS + GROUP_BYTES);

        for chunk in bytes.chunks(GROUP_BYTES) {
            let value = chunk.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
            push_group(&mut out, value);
            for _ in chunk.len()..GROUP_BYTES {
                out.push(PAD);
            }
        }

        out
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, BaseNError> {
        let digits = text.trim_end_matches(PAD);
        let pads = text.len() - digits.len();

        if pads >= GROUP_BYTES || (pads > 0 && digits.is_empty()) {
            return Err(BaseNError::InvalidPadding(pads));
        }
        if digits.len() % GROUP_DIGITS != 0 {
            return Err(BaseNError::InvalidLength(digits.len()));
        }

        let groups = digits.len() / GROUP_DIGITS;
        let mut out = Vec::with_capacity(groups * GROUP_BYTES);

        for (index, group) in digits.as_bytes().chunks(GROUP_DIGITS).enumerate() {
            let value = read_group(group)?;
            let is_last = index + 1 == groups;

            if is_last && pads > 0 {
                let kept = GROUP_BYTES - pads;
                if value >> (8 * kept) != 0 {
                    return Err(BaseNError::GroupOverflow);
                }
                out.extend_from_slice(&value.to_be_bytes()[pads..]);
            } else {
                out.extend_from_slice(&value.to_be_bytes());
            }
        }

        Ok(out)
    }
}
