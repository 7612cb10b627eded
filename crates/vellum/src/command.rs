//! Variant generator running a shell command.

use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use vellum_error::{GeneratorError, VellumResult};
use vellum_storage::{FileId, VariantDescription, VariantGenerator};

/// Generates variants by running `sh -c <command>`.
///
/// The command sees the job in its environment:
///
/// | Variable               | Value                                   |
/// |------------------------|-----------------------------------------|
/// | `VELLUM_ID`            | file id                                 |
/// | `VELLUM_SRC`           | path of the original                    |
/// | `VELLUM_DEST`          | path the variant must be written to     |
/// | `VELLUM_VARIANT`       | variant name                            |
/// | `VELLUM_PARAM_<KEY>`   | each scalar variant parameter           |
///
/// Parameter keys are uppercased with non-alphanumeric characters replaced
/// by `_`. A non-zero exit fails the variant with its stderr.
///
/// # Example
///
/// ```rust,no_run
/// use vellum::CommandGenerator;
///
/// let thumbnails = CommandGenerator::new(
///     r#"convert "$VELLUM_SRC" -thumbnail "${VELLUM_PARAM_WIDTH}x" "$VELLUM_DEST""#,
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
    shell: String,
}

impl CommandGenerator {
    /// Run `command` with `sh`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: "sh".to_string(),
        }
    }

    /// Use another POSIX shell.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// The command line.
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Environment variable name for a variant parameter.
fn param_var(key: &str) -> String {
    let key: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("VELLUM_PARAM_{}", key)
}

/// Scalars only; arrays and objects have no sensible shell form.
fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[async_trait::async_trait]
impl VariantGenerator for CommandGenerator {
    #[tracing::instrument(skip(self, src, dest, variant), fields(variant = %variant.name))]
    async fn generate(
        &self,
        id: &FileId,
        src: &Path,
        dest: &Path,
        variant: &VariantDescription,
    ) -> VellumResult<()> {
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(&self.command)
            .env("VELLUM_ID", id.to_string())
            .env("VELLUM_SRC", src)
            .env("VELLUM_DEST", dest)
            .env("VELLUM_VARIANT", &variant.name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &variant.params {
            if let Some(value) = param_value(value) {
                command.env(param_var(key), value);
            }
        }

        let output = command
            .output()
            .await
            .map_err(|e| GeneratorError::new(&variant.name, format!("{}: {}", self.shell, e)))?;

        if !output.status.success() {
            return Err(GeneratorError::new(
                &variant.name,
                format!(
                    "command {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )
            .into());
        }

        tracing::debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "Command finished");
        Ok(())
    }
}
