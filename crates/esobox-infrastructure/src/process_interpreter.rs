//! Interpreter that delegates to external programs.
//!
//! Each catalog entry may carry a `command` argv. The program text is written
//! to a temporary file whose path replaces every `{file}` placeholder, the
//! adapted input is piped to stdin, and stdout becomes the output.

use crate::adapter::{decode_output, encode_input};
use crate::toml_language_catalog::TomlLanguageCatalog;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use esobox_core::interpreter::{Interpreter, InterpreterError, RunOptions};
use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const FILE_PLACEHOLDER: &str = "{file}";

/// Runs programs through the commands configured in a [`TomlLanguageCatalog`].
#[derive(Debug, Clone)]
pub struct ProcessInterpreter {
    catalog: Arc<TomlLanguageCatalog>,
}

impl ProcessInterpreter {
    pub fn new(catalog: Arc<TomlLanguageCatalog>) -> Self {
        Self { catalog }
    }

    fn command_for(&self, language: &str) -> Result<Vec<String>, InterpreterError> {
        let entry = self
            .catalog
            .entry(language)
            .ok_or_else(|| anyhow!("language {:?} is not in the catalog", language))?;
        match &entry.command {
            Some(argv) if argv.first().is_some_and(|program| !program.is_empty()) => {
                Ok(argv.clone())
            }
            _ => Err(anyhow!("no interpreter command configured for {:?}", language).into()),
        }
    }
}

#[async_trait]
impl Interpreter for ProcessInterpreter {
    async fn run(
        &self,
        language: &str,
        program: &str,
        input: &str,
        options: RunOptions,
    ) -> Result<String, InterpreterError> {
        let argv = self.command_for(language)?;
        let stdin_bytes = encode_input(options.input_adapter, input)?;

        let mut source = tempfile::NamedTempFile::new().context("Failed to create program file")?;
        source
            .write_all(program.as_bytes())
            .and_then(|_| source.flush())
            .context("Failed to write program file")?;
        let source_path = source.path().to_string_lossy().into_owned();

        let args: Vec<String> = argv[1..]
            .iter()
            .map(|arg| arg.replace(FILE_PLACEHOLDER, &source_path))
            .collect();

        tracing::debug!(
            "[ProcessInterpreter] Running {} for {} ({} bytes of input)",
            argv[0],
            language,
            stdin_bytes.len()
        );

        let mut child = Command::new(&argv[0])
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start interpreter {:?}", argv[0]))?;

        // Input must be fed while output is drained.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A program that exits without reading its input closes the pipe.
                if let Err(e) = stdin.write_all(&stdin_bytes).await {
                    tracing::debug!("[ProcessInterpreter] Input not fully consumed: {}", e);
                }
                // Dropping stdin here signals EOF.
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.context("Failed to wait for interpreter")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            let message = if stderr.is_empty() {
                format!("Interpreter exited with {}", output.status)
            } else {
                stderr
            };
            return Err(InterpreterError::Program(message));
        }

        Ok(decode_output(options.output_adapter, &output.stdout))
    }

    async fn hello_world_program(
        &self,
        language: &str,
    ) -> Result<Option<String>, InterpreterError> {
        Ok(self
            .catalog
            .entry(language)
            .and_then(|entry| entry.hello_world.clone()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use esobox_core::interpreter::Adapter;

    fn interpreter() -> ProcessInterpreter {
        let catalog = TomlLanguageCatalog::from_toml(
            r#"
            [[language]]
            name = "Text"
            command = ["cat", "{file}"]
            hello_world = "Hello, World!"

            [[language]]
            name = "Echo"
            command = ["cat"]

            [[language]]
            name = "Failing"
            command = ["sh", "-c", "echo 'syntax error at 1:1' >&2; exit 3"]

            [[language]]
            name = "Missing"
            command = ["/nonexistent/esobox-interpreter"]

            [[language]]
            name = "Bare"
            "#,
        )
        .unwrap();
        ProcessInterpreter::new(Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_program_file_substitution() {
        let output = interpreter()
            .run("Text", "Hello, World!", "", RunOptions::default())
            .await
            .unwrap();
        assert_eq!(output, "Hello, World!");
    }

    #[tokio::test]
    async fn test_input_piped_through_adapters() {
        let options = RunOptions {
            input_adapter: Some(Adapter::ByteArray),
            output_adapter: Some(Adapter::ByteArray),
        };
        let output = interpreter()
            .run("Echo", "", "72 105", options)
            .await
            .unwrap();
        assert_eq!(output, "72 105");

        let options = RunOptions {
            input_adapter: Some(Adapter::ByteArray),
            output_adapter: Some(Adapter::Text),
        };
        let output = interpreter()
            .run("Echo", "", "72 105", options)
            .await
            .unwrap();
        assert_eq!(output, "Hi");
    }

    #[tokio::test]
    async fn test_large_input_streamed_through_cat() {
        let input = "esolang\n".repeat(128 * 1024);
        let output = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            interpreter().run("Echo", "", &input, RunOptions::default()),
        )
        .await
        .expect("interpreter deadlocked on a full pipe")
        .unwrap();
        assert_eq!(output.len(), input.len());
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_user_fault() {
        let err = interpreter()
            .run("Failing", "", "", RunOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_user_fault());
        assert_eq!(err.to_string(), "syntax error at 1:1");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_internal() {
        let err = interpreter()
            .run("Missing", "", "", RunOptions::default())
            .await
            .unwrap_err();
        assert!(!err.is_user_fault());
        assert!(err.detail().contains("Failed to start interpreter"));
    }

    #[tokio::test]
    async fn test_missing_command_is_internal() {
        let err = interpreter()
            .run("Bare", "", "", RunOptions::default())
            .await
            .unwrap_err();
        assert!(!err.is_user_fault());

        let err = interpreter()
            .run("Unlisted", "", "", RunOptions::default())
            .await
            .unwrap_err();
        assert!(!err.is_user_fault());
    }

    #[tokio::test]
    async fn test_bad_input_is_user_fault() {
        let options = RunOptions {
            input_adapter: Some(Adapter::ByteArray),
            output_adapter: None,
        };
        let err = interpreter()
            .run("Echo", "", "300", options)
            .await
            .unwrap_err();
        assert!(err.is_user_fault());
    }

    #[tokio::test]
    async fn test_hello_world_program() {
        let interpreter = interpreter();
        assert_eq!(
            interpreter.hello_world_program("Text").await.unwrap().as_deref(),
            Some("Hello, World!")
        );
        assert_eq!(interpreter.hello_world_program("Echo").await.unwrap(), None);
    }
}
