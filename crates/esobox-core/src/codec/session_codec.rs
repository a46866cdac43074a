//! Session token encoder and validating decoder.

use super::base62::{Base62, BaseNCodec};
use super::version::ProtocolVersion;
use super::wire::{WireReader, WireWriter};
use crate::error::DecodeError;
use crate::interpreter::Adapter;
use crate::language::LanguageCatalog;
use crate::resolver::CodeResolver;
use crate::session::{SessionRecord, Timestamp};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Default protocol namespace.
pub const DEFAULT_MAGIC: &str = "esolangs";

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // The pattern is a literal; failing to compile it is a build defect.
    Regex::new(r"^[a-zA-Z0-9]*=*$").unwrap_or_else(|e| panic!("token pattern: {e}"))
});

/// Packs session records into URL-safe tokens and unpacks them again.
///
/// Wire order: magic, version triple, timestamp, language, source encoding,
/// input adapter, output adapter, header, code, footer, input, output,
/// debug, checksum.
#[derive(Clone)]
pub struct SessionCodec {
    magic: String,
    supported_versions: Vec<ProtocolVersion>,
    text: Arc<dyn BaseNCodec>,
}

impl SessionCodec {
    /// Creates a codec using the base-62 text rendering.
    pub fn new(magic: impl Into<String>, supported_versions: Vec<ProtocolVersion>) -> Self {
        Self::with_text_codec(magic, supported_versions, Arc::new(Base62))
    }

    pub fn with_text_codec(
        magic: impl Into<String>,
        supported_versions: Vec<ProtocolVersion>,
        text: Arc<dyn BaseNCodec>,
    ) -> Self {
        Self {
            magic: magic.into(),
            supported_versions,
            text,
        }
    }

    pub fn magic(&self) -> &str {
        &self.magic
    }

    pub fn supported_versions(&self) -> &[ProtocolVersion] {
        &self.supported_versions
    }

    /// Serializes a record. Never fails.
    pub fn encode(&self, record: &SessionRecord, version: ProtocolVersion) -> String {
        let mut writer = WireWriter::new();

        writer
            .write_str(&self.magic)
            .write_uint(version.major)
            .write_uint(version.minor)
            .write_uint(version.patch)
            .write_double(record.created_at.millis())
            .write_str(&record.language)
            .write_str(&record.source_encoding)
            .write_str(Adapter::to_wire(record.input_adapter))
            .write_str(Adapter::to_wire(record.output_adapter))
            .write_str(&record.header)
            .write_str(&record.code)
            .write_str(&record.footer)
            .write_str(&record.input)
            .write_str(&record.output)
            .write_str(&record.debug);

        self.text.encode(&writer.finish())
    }

    /// Validates an untrusted token and reconstructs the record.
    ///
    /// Stages short-circuit in order: charset, base-N structure, checksum,
    /// magic, version, language, field layout. Legacy `1.0.1` records
    /// additionally resolve their Code field through `resolver`.
    pub async fn decode(
        &self,
        token: &str,
        catalog: &dyn LanguageCatalog,
        resolver: &dyn CodeResolver,
    ) -> Result<SessionRecord, DecodeError> {
        if !TOKEN_PATTERN.is_match(token) {
            return Err(DecodeError::InvalidToken);
        }

        let buf = self.text.decode(token).map_err(|e| {
            tracing::debug!("[SessionCodec] Base-N decode failed: {}", e);
            DecodeError::InvalidToken
        })?;

        let mut reader = WireReader::new(&buf)?;

        if reader.read_str()? != self.magic {
            return Err(DecodeError::WrongNamespace);
        }

        let version = ProtocolVersion::new(
            reader.read_uint()?,
            reader.read_uint()?,
            reader.read_uint()?,
        );
        if !self.supported_versions.contains(&version) {
            return Err(DecodeError::UnsupportedVersion(version.to_string()));
        }

        let created_at = Timestamp(reader.read_double()?);

        let language = reader.read_str()?;
        if catalog.get_usable(&language).is_none() {
            return Err(DecodeError::UnknownLanguage(language));
        }

        let source_encoding = reader.read_str()?;
        let input_adapter = read_adapter(&mut reader)?;
        let output_adapter = read_adapter(&mut reader)?;

        let header = reader.read_str()?;
        let mut code = reader.read_str()?;
        let footer = reader.read_str()?;
        let input = reader.read_str()?;
        let output = reader.read_str()?;
        let debug = reader.read_str()?;
        reader.finish()?;

        if version.is_legacy_code_reference() {
            tracing::info!("[SessionCodec] Resolving legacy code reference {:?}", code);
            code = resolver
                .resolve(&code)
                .await
                .map_err(|e| DecodeError::LegacyCodeResolution(format!("{:#}", e)))?;
        }

        tracing::debug!(
            "[SessionCodec] Decoded {} session (version {})",
            language,
            version
        );

        Ok(SessionRecord {
            created_at,
            language,
            source_encoding,
            input_adapter,
            output_adapter,
            header,
            code,
            footer,
            input,
            output,
            debug,
        })
    }
}

fn read_adapter(reader: &mut WireReader<'_>) -> Result<Option<Adapter>, DecodeError> {
    let name = reader.read_str()?;
    Ok(Adapter::from_wire(&name).unwrap_or_else(|e| {
        tracing::warn!("[SessionCodec] Ignoring {}, using no adapter", e);
        None
    }))
}

impl Default for SessionCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAGIC, ProtocolVersion::supported())
    }
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("magic", &self.magic)
            .field("supported_versions", &self.supported_versions)
            .finish()
    }
}
