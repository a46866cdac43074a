//! Session domain model.
//!
//! `SessionRecord` is the pure data that travels in a token. `Session` wraps
//! it with the interactive state: per-section editability, expansion and
//! message banners, the run state, and the Code byte counter.

use super::field::{Expansion, Field};
use super::timestamp::Timestamp;
use crate::encoding::{EncodingRegistry, SourceEncoding};
use crate::error::Result;
use crate::interpreter::{Adapter, RunOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Serializable content of a session, in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub created_at: Timestamp,
    pub language: String,
    pub source_encoding: String,
    pub input_adapter: Option<Adapter>,
    pub output_adapter: Option<Adapter>,
    pub header: String,
    pub code: String,
    pub footer: String,
    pub input: String,
    pub output: String,
    pub debug: String,
}

impl SessionRecord {
    /// An empty record in the given language, with both adapters set to
    /// `text` and UTF-8 source encoding.
    pub fn blank(language: impl Into<String>) -> Self {
        Self {
            created_at: Timestamp::now(),
            language: language.into(),
            source_encoding: crate::encoding::Utf8::NAME.to_string(),
            input_adapter: Some(Adapter::Text),
            output_adapter: Some(Adapter::Text),
            header: String::new(),
            code: String::new(),
            footer: String::new(),
            input: String::new(),
            output: String::new(),
            debug: String::new(),
        }
    }

    /// Text of a serialized field. Export is not part of a record.
    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Header => &self.header,
            Field::Code => &self.code,
            Field::Footer => &self.footer,
            Field::Input => &self.input,
            Field::Output => &self.output,
            Field::Debug => &self.debug,
            Field::Export => "",
        }
    }

    /// Header, code and footer concatenated in that order.
    pub fn full_program(&self) -> String {
        [self.header.as_str(), self.code.as_str(), self.footer.as_str()].concat()
    }
}

/// Execution state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Per-section interactive state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub text: String,
    /// Whether the input surface currently accepts edits
    pub enabled: bool,
    pub expanded: bool,
    /// Banner shown above the section; empty when hidden
    pub message: String,
}

impl Section {
    fn new(field: Field, text: String) -> Self {
        let expanded = match field.default_expansion() {
            Expansion::Always => true,
            Expansion::Never => false,
            Expansion::WhenNonEmpty => !text.is_empty(),
        };
        Self {
            text,
            enabled: field.is_editable(),
            expanded,
            message: String::new(),
        }
    }
}

/// Snapshot of which input surfaces were enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputStates(BTreeMap<Field, bool>);

impl InputStates {
    pub fn iter(&self) -> impl Iterator<Item = (Field, bool)> + '_ {
        self.0.iter().map(|(field, enabled)| (*field, *enabled))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Field, bool)> for InputStates {
    fn from_iter<I: IntoIterator<Item = (Field, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The in-memory session.
///
/// Single logical owner: the session controller. Mutated only through the
/// setters below.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    language: String,
    source_encoding: String,
    encoding: Option<Arc<dyn SourceEncoding>>,
    input_adapter: Option<Adapter>,
    output_adapter: Option<Adapter>,
    created_at: Timestamp,
    run_state: RunState,
    sections: BTreeMap<Field, Section>,
    /// Last byte count computed while the Code text was valid
    bytes_num: usize,
    /// Currently displayed byte count, hidden while the text is invalid
    byte_count: Option<usize>,
}

impl Session {
    /// Builds a session from a record, resolving its source encoding.
    pub fn from_record(record: SessionRecord, encodings: &EncodingRegistry) -> Self {
        let encoding = encodings.get(&record.source_encoding);
        if encoding.is_none() {
            tracing::warn!(
                "[Session] Unknown source encoding {:?}, byte counting disabled",
                record.source_encoding
            );
        }

        let sections = Field::all()
            .map(|field| {
                let text = record.text(field).to_string();
                (field, Section::new(field, text))
            })
            .collect();

        let mut session = Self {
            id: Uuid::new_v4(),
            language: record.language,
            source_encoding: record.source_encoding,
            encoding,
            input_adapter: record.input_adapter,
            output_adapter: record.output_adapter,
            created_at: record.created_at,
            run_state: RunState::Idle,
            sections,
            bytes_num: 0,
            byte_count: None,
        };
        session.update_byte_count();
        session
    }

    /// A blank session in the given language.
    pub fn blank(language: impl Into<String>, encodings: &EncodingRegistry) -> Self {
        Self::from_record(SessionRecord::blank(language), encodings)
    }

    /// Extracts the serializable content.
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            created_at: self.created_at,
            language: self.language.clone(),
            source_encoding: self.source_encoding.clone(),
            input_adapter: self.input_adapter,
            output_adapter: self.output_adapter,
            header: self.get(Field::Header).to_string(),
            code: self.get(Field::Code).to_string(),
            footer: self.get(Field::Footer).to_string(),
            input: self.get(Field::Input).to_string(),
            output: self.get(Field::Output).to_string(),
            debug: self.get(Field::Debug).to_string(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sets the language. Catalog membership is checked by the controller.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn source_encoding(&self) -> &str {
        &self.source_encoding
    }

    /// Switches the source encoding and recounts the Code bytes.
    pub fn set_source_encoding(&mut self, name: &str, encodings: &EncodingRegistry) {
        self.source_encoding = name.to_string();
        self.encoding = encodings.get(name);
        self.update_byte_count();
    }

    pub fn input_adapter(&self) -> Option<Adapter> {
        self.input_adapter
    }

    pub fn set_input_adapter(&mut self, adapter: Option<Adapter>) {
        self.input_adapter = adapter;
    }

    pub fn output_adapter(&self) -> Option<Adapter> {
        self.output_adapter
    }

    pub fn set_output_adapter(&mut self, adapter: Option<Adapter>) {
        self.output_adapter = adapter;
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            input_adapter: self.input_adapter,
            output_adapter: self.output_adapter,
        }
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    // ============================================================================
    // Field accessors
    // ============================================================================

    fn section(&self, field: Field) -> &Section {
        // Every field is inserted at construction.
        &self.sections[&field]
    }

    fn section_mut(&mut self, field: Field) -> &mut Section {
        self.sections
            .entry(field)
            .or_insert_with(|| Section::new(field, String::new()))
    }

    pub fn get(&self, field: Field) -> &str {
        &self.section(field).text
    }

    pub fn set(&mut self, field: Field, text: impl Into<String>) {
        self.section_mut(field).text = text.into();
        if field.has_byte_counter() {
            self.update_byte_count();
        }
    }

    pub fn clear(&mut self, field: Field) {
        self.set(field, String::new());
    }

    /// Sets a field whose identity arrives as text.
    pub fn set_by_name(&mut self, name: &str, text: impl Into<String>) -> Result<()> {
        let field = Field::from_name(name)?;
        self.set(field, text);
        Ok(())
    }

    /// Reads a field whose identity arrives as text.
    pub fn get_by_name(&self, name: &str) -> Result<&str> {
        let field = Field::from_name(name)?;
        Ok(self.get(field))
    }

    /// Header, code and footer concatenated in that order.
    pub fn full_program(&self) -> String {
        [
            self.get(Field::Header),
            self.get(Field::Code),
            self.get(Field::Footer),
        ]
        .concat()
    }

    pub fn is_expanded(&self, field: Field) -> bool {
        self.section(field).expanded
    }

    pub fn expand(&mut self, field: Field) {
        self.section_mut(field).expanded = true;
    }

    pub fn collapse(&mut self, field: Field) {
        self.section_mut(field).expanded = false;
    }

    pub fn toggle(&mut self, field: Field) {
        let section = self.section_mut(field);
        section.expanded = !section.expanded;
    }

    // ============================================================================
    // Message banners
    // ============================================================================

    pub fn message(&self, field: Field) -> &str {
        &self.section(field).message
    }

    pub fn show_message(&mut self, field: Field, message: impl Into<String>) {
        self.section_mut(field).message = message.into();
    }

    pub fn hide_message(&mut self, field: Field) {
        self.section_mut(field).message.clear();
    }

    pub fn hide_all_messages(&mut self) {
        for section in self.sections.values_mut() {
            section.message.clear();
        }
    }

    // ============================================================================
    // Byte counter
    // ============================================================================

    fn update_byte_count(&mut self) {
        let Some(encoding) = self.encoding.clone() else {
            self.byte_count = None;
            return;
        };
        let code = &self.section(Field::Code).text;
        if !encoding.is_valid(code) {
            self.byte_count = None;
            return;
        }
        let count = encoding.byte_len(code);
        self.bytes_num = count;
        self.byte_count = Some(count);
    }

    /// Byte length of the Code text, hidden while the encoding rejects it.
    pub fn code_byte_count(&self) -> Option<usize> {
        self.byte_count
    }

    /// Last byte count computed while the Code text was valid.
    pub fn bytes_num(&self) -> usize {
        self.bytes_num
    }

    /// Counter text, e.g. `2 bytes (UTF-8)`.
    pub fn byte_counter_label(&self) -> Option<String> {
        self.byte_count
            .map(|count| format!("{} bytes ({})", count, self.source_encoding))
    }

    // ============================================================================
    // Run state and input surfaces
    // ============================================================================

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Enters `Running`. Returns `false` without changing anything if the
    /// session is already running.
    pub fn try_begin_run(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.run_state = RunState::Running;
        true
    }

    /// Returns to `Idle`.
    pub fn finish_run(&mut self) {
        self.run_state = RunState::Idle;
    }

    pub fn is_enabled(&self, field: Field) -> bool {
        self.section(field).enabled
    }

    pub fn set_enabled(&mut self, field: Field, enabled: bool) {
        self.section_mut(field).enabled = enabled;
    }

    pub fn input_states(&self) -> InputStates {
        self.sections
            .iter()
            .map(|(field, section)| (*field, section.enabled))
            .collect()
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        for section in self.sections.values_mut() {
            section.enabled = enabled;
        }
    }

    pub fn restore_input_states(&mut self, states: &InputStates) {
        for (field, enabled) in states.iter() {
            self.set_enabled(field, enabled);
        }
    }
}
