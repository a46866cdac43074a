//! Checksummed binary record serializer.
//!
//! Layout primitives, all big-endian:
//! - unsigned integer: `u32`
//! - double: IEEE-754 `f64`
//! - string: `u32` byte length followed by UTF-8 bytes
//!
//! A finished buffer ends with a CRC-32 of every preceding byte.

use crate::error::DecodeError;

const CHECKSUM_LEN: usize = 4;

/// Appends fields to a buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_uint(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_double(&mut self, value: f64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_str(&mut self, value: &str) -> &mut Self {
        // Strings longer than 4 GiB cannot come out of a text field.
        let len = u32::try_from(value.len()).unwrap_or(u32::MAX);
        self.write_uint(len);
        self.buf
            .extend_from_slice(&value.as_bytes()[..len as usize]);
        self
    }

    /// Appends the checksum and returns the buffer.
    pub fn finish(self) -> Vec<u8> {
        let mut buf = self.buf;
        let checksum = crc32fast::hash(&buf);
        buf.extend_from_slice(&checksum.to_be_bytes());
        buf
    }
}

/// Reads fields from a buffer whose checksum has been verified.
#[derive(Debug)]
pub struct WireReader<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Verifies the trailing checksum and positions the reader at the first
    /// field. Nothing is interpreted if the checksum does not match.
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        if buf.len() < CHECKSUM_LEN {
            return Err(DecodeError::ChecksumMismatch);
        }
        let (payload, stored) = buf.split_at(buf.len() - CHECKSUM_LEN);
        let stored = u32::from_be_bytes([stored[0], stored[1], stored[2], stored[3]]);
        if crc32fast::hash(payload) != stored {
            return Err(DecodeError::ChecksumMismatch);
        }
        Ok(Self { payload, pos: 0 })
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.payload.len())
            .ok_or_else(|| DecodeError::malformed(format!("truncated {}", what)))?;
        let bytes = &self.payload[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_uint(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4, "integer")?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.take(8, "double")?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(raw))
    }

    pub fn read_str(&mut self) -> Result<String, DecodeError> {
        let len = self.read_uint()? as usize;
        let bytes = self.take(len, "string")?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DecodeError::malformed("string is not valid UTF-8"))
    }

    /// Fails if unread bytes remain before the checksum.
    pub fn finish(self) -> Result<(), DecodeError> {
        let rest = self.payload.len() - self.pos;
        if rest != 0 {
            return Err(DecodeError::malformed(format!(
                "{} trailing bytes after the last field",
                rest
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut writer = WireWriter::new();
        writer
            .write_str("esolangs")
            .write_uint(1)
            .write_double(1.5)
            .write_str("λ");
        writer.finish()
    }

    #[test]
    fn test_fields_read_back_in_order() {
        let buf = sample();
        let mut reader = WireReader::new(&buf).unwrap();
        assert_eq!(reader.read_str().unwrap(), "esolangs");
        assert_eq!(reader.read_uint().unwrap(), 1);
        assert_eq!(reader.read_double().unwrap(), 1.5);
        assert_eq!(reader.read_str().unwrap(), "λ");
        reader.finish().unwrap();
    }

    #[test]
    fn test_any_flipped_byte_fails_checksum() {
        let buf = sample();
        for i in 0..buf.len() {
            let mut corrupted = buf.clone();
            corrupted[i] ^= 0x20;
            assert_eq!(
                WireReader::new(&corrupted).unwrap_err(),
                DecodeError::ChecksumMismatch,
                "byte {} flipped",
                i
            );
        }
    }

    #[test]
    fn test_truncated_buffer_fails_checksum() {
        let buf = sample();
        assert_eq!(
            WireReader::new(&buf[..buf.len() - 1]).unwrap_err(),
            DecodeError::ChecksumMismatch
        );
        assert_eq!(
            WireReader::new(&buf[..2]).unwrap_err(),
            DecodeError::ChecksumMismatch
        );
    }

    #[test]
    fn test_checksum_valid_but_short_record() {
        let mut writer = WireWriter::new();
        writer.write_uint(100);
        let buf = writer.finish();
        let mut reader = WireReader::new(&buf).unwrap();
        assert!(matches!(
            reader.read_str().unwrap_err(),
            DecodeError::MalformedRecord(_)
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut writer = WireWriter::new();
        writer.write_uint(1).write_uint(2);
        let buf = writer.finish();
        let mut reader = WireReader::new(&buf).unwrap();
        reader.read_uint().unwrap();
        assert!(reader.finish().is_err());
    }
}
