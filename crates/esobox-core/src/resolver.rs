//! Code reference resolution for legacy `1.0.1` tokens.
//!
//! Tokens of that version store a reference in the Code field instead of the
//! code itself. Newer versions never do this.

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Resolves a legacy code reference to the code text.
#[async_trait]
pub trait CodeResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<String>;
}

/// Resolver for deployments that do not serve legacy references.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCodeResolver;

#[async_trait]
impl CodeResolver for NoCodeResolver {
    async fn resolve(&self, reference: &str) -> Result<String> {
        bail!("code references are not supported (reference {:?})", reference)
    }
}
