//! Filesystem resolver for legacy code references.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use esobox_core::resolver::CodeResolver;
use std::path::{Component, Path, PathBuf};

/// Resolves references as relative paths below a root directory.
#[derive(Debug, Clone)]
pub struct FileCodeResolver {
    root: PathBuf,
}

impl FileCodeResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference);
        if reference.is_empty()
            || !relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            bail!("reference {:?} is not a plain relative path", reference);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl CodeResolver for FileCodeResolver {
    async fn resolve(&self, reference: &str) -> Result<String> {
        let path = self.path_for(reference)?;
        tracing::debug!("[FileCodeResolver] Reading {:?}", path);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read code reference {:?}", reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolves_relative_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("samples")).unwrap();
        std::fs::write(dir.path().join("samples/cat.bf"), ",[.,]").unwrap();

        let resolver = FileCodeResolver::new(dir.path());
        assert_eq!(resolver.resolve("samples/cat.bf").await.unwrap(), ",[.,]");
    }

    #[tokio::test]
    async fn test_rejects_escaping_references() {
        let dir = TempDir::new().unwrap();
        let resolver = FileCodeResolver::new(dir.path());
        assert!(resolver.resolve("../secret").await.is_err());
        assert!(resolver.resolve("/etc/passwd").await.is_err());
        assert!(resolver.resolve("./x").await.is_err());
        assert!(resolver.resolve("").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FileCodeResolver::new(dir.path())
            .resolve("absent.bf")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absent.bf"));
    }
}
