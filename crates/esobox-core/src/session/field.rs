//! Session field identifiers.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// The fixed set of text sections a session exposes.
///
/// Field identity is checked at compile time everywhere except where a name
/// arrives as text ([`Field::from_name`]).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Field {
    Header,
    Code,
    Footer,
    Input,
    Output,
    Debug,
    Export,
}

/// Initial expansion state of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Always,
    Never,
    /// Expanded only if the section starts out with text in it
    WhenNonEmpty,
}

impl Field {
    /// All fields in display order.
    pub fn all() -> impl Iterator<Item = Field> {
        Field::iter()
    }

    /// Resolves a field name arriving as text.
    ///
    /// An unknown name is a caller bug and is reported as a contract violation.
    pub fn from_name(name: &str) -> Result<Field> {
        Field::from_str(name)
            .map_err(|_| CoreError::contract(format!("unknown field name {:?}", name)))
    }

    /// Whether the section accepts user edits when no operation is running.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Field::Header | Field::Code | Field::Footer | Field::Input
        )
    }

    pub fn default_expansion(&self) -> Expansion {
        match self {
            Field::Header | Field::Footer => Expansion::WhenNonEmpty,
            Field::Code | Field::Input | Field::Output | Field::Debug => Expansion::Always,
            Field::Export => Expansion::Never,
        }
    }

    /// Only the Code section tracks its encoded byte length.
    pub fn has_byte_counter(&self) -> bool {
        matches!(self, Field::Code)
    }
}
