use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Version triple written at the head of every session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ProtocolVersion {
    /// The current format.
    pub const V1_0_0: ProtocolVersion = ProtocolVersion::new(1, 0, 0);
    /// Legacy format whose Code field holds a reference to the code.
    pub const V1_0_1: ProtocolVersion = ProtocolVersion::new(1, 0, 1);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Versions this build reads by default.
    pub fn supported() -> Vec<ProtocolVersion> {
        vec![Self::V1_0_0, Self::V1_0_1]
    }

    /// Whether records of this version store a code reference instead of code.
    pub fn is_legacy_code_reference(&self) -> bool {
        *self == Self::V1_0_1
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ProtocolVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = semver::Version::parse(s.trim())
            .map_err(|e| CoreError::config(format!("invalid version {:?}: {}", s, e)))?;
        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(CoreError::config(format!(
                "version {:?} must be a plain major.minor.patch triple",
                s
            )));
        }
        let component = |value: u64| {
            u32::try_from(value)
                .map_err(|_| CoreError::config(format!("version component too large in {:?}", s)))
        };
        Ok(Self::new(
            component(parsed.major)?,
            component(parsed.minor)?,
            component(parsed.patch)?,
        ))
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
