//! Source encoding policies.
//!
//! A policy decides whether a text is representable in a given encoding and
//! how many bytes it occupies there. Only the Code field is measured.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Encoding policy used to count the bytes of the Code field.
pub trait SourceEncoding: Send + Sync {
    /// Canonical name, as written into session tokens (e.g. `"UTF-8"`).
    fn name(&self) -> &str;

    /// Returns `false` if the text cannot currently be represented.
    fn is_valid(&self, text: &str) -> bool;

    /// Number of bytes the text occupies under this encoding.
    fn byte_len(&self, text: &str) -> usize;
}

impl fmt::Debug for dyn SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceEncoding").field(&self.name()).finish()
    }
}

/// UTF-8 policy. Every Rust string is valid UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Utf8 {
    pub const NAME: &'static str = "UTF-8";
}

impl SourceEncoding for Utf8 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_valid(&self, _text: &str) -> bool {
        true
    }

    fn byte_len(&self, text: &str) -> usize {
        text.len()
    }
}

/// Name-indexed set of encoding policies.
#[derive(Clone)]
pub struct EncodingRegistry {
    encodings: HashMap<String, Arc<dyn SourceEncoding>>,
}

impl EncodingRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            encodings: HashMap::new(),
        }
    }

    /// Registers a policy under its own name, replacing any previous one.
    pub fn register(&mut self, encoding: Arc<dyn SourceEncoding>) {
        self.encodings.insert(encoding.name().to_string(), encoding);
    }

    /// Looks up a policy by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SourceEncoding>> {
        self.encodings.get(name).cloned()
    }

    /// Names of all registered policies, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.encodings.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EncodingRegistry {
    /// A registry holding the UTF-8 policy.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(Utf8));
        registry
    }
}

impl fmt::Debug for EncodingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingRegistry")
            .field("encodings", &self.names())
            .finish()
    }
}
