//! Media type sniffers.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use vellum_error::{IdentifyError, IdentifyErrorKind, VellumResult};

/// Content sniffing backend.
///
/// Implementations return their single best guess for the media type, or
/// `None` when they cannot tell. Only operational failures are errors.
#[async_trait]
pub trait MediaTypeSniffer: Send + Sync {
    /// Guess the media type of an in-memory payload.
    async fn sniff_bytes(&self, bytes: &[u8]) -> VellumResult<Option<String>>;

    /// Guess the media type of a file on disk.
    async fn sniff_path(&self, path: &Path) -> VellumResult<Option<String>>;
}

/// Sniffer backed by libmagic's `file` command.
///
/// Runs `file -b -k -n -r --mime-type` and keeps the first reported type.
/// Byte payloads are piped through stdin; `file` may stop reading once it has
/// seen enough, so a broken pipe while writing is expected.
#[derive(Debug, Clone)]
pub struct FileCommandSniffer {
    program: PathBuf,
}

impl FileCommandSniffer {
    /// Use a specific `file` executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this sniffer runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, target: &OsStr) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["-b", "-k", "-n", "-r", "--mime-type"])
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn(&self, mut command: Command) -> VellumResult<tokio::process::Child> {
        command.spawn().map_err(|e| {
            IdentifyError::new(IdentifyErrorKind::SnifferUnavailable(format!(
                "{}: {}",
                self.program.display(),
                e
            )))
            .into()
        })
    }
}

impl Default for FileCommandSniffer {
    fn default() -> Self {
        Self::new("file")
    }
}

/// First non-empty line of `file` output.
fn parse_output(output: &std::process::Output) -> VellumResult<Option<String>> {
    if !output.status.success() {
        return Err(IdentifyError::new(IdentifyErrorKind::SnifferFailed(format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
        .into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string))
}

#[async_trait]
impl MediaTypeSniffer for FileCommandSniffer {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn sniff_bytes(&self, bytes: &[u8]) -> VellumResult<Option<String>> {
        let mut command = self.command(OsStr::new("-"));
        command.stdin(Stdio::piped());
        let mut child = self.spawn(command)?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            IdentifyError::new(IdentifyErrorKind::SnifferFailed(
                "stdin was not captured".to_string(),
            ))
        })?;

        // stdin is dropped (closed) when the write future completes
        let write = async move {
            match stdin.write_all(bytes).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(|e| {
            IdentifyError::new(IdentifyErrorKind::SnifferFailed(e.to_string()))
        })?;
        written.map_err(|e| {
            IdentifyError::new(IdentifyErrorKind::SnifferFailed(format!(
                "writing payload: {}",
                e
            )))
        })?;

        let media_type = parse_output(&output)?;
        tracing::debug!(media_type = ?media_type, "Sniffed payload");
        Ok(media_type)
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn sniff_path(&self, path: &Path) -> VellumResult<Option<String>> {
        let child = self.spawn(self.command(path.as_os_str()))?;
        let output = child.wait_with_output().await.map_err(|e| {
            IdentifyError::new(IdentifyErrorKind::SnifferFailed(e.to_string()))
        })?;

        let media_type = parse_output(&output)?;
        tracing::debug!(media_type = ?media_type, "Sniffed file");
        Ok(media_type)
    }
}

/// Sniffer that reports the same media type for every payload.
///
/// For callers that already know what they store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedMediaType(Option<String>);

impl FixedMediaType {
    /// Always report `media_type`.
    pub fn new(media_type: impl Into<String>) -> Self {
        Self(Some(media_type.into()))
    }

    /// Always report an undetermined media type.
    pub fn unknown() -> Self {
        Self(None)
    }
}

#[async_trait]
impl MediaTypeSniffer for FixedMediaType {
    async fn sniff_bytes(&self, _bytes: &[u8]) -> VellumResult<Option<String>> {
        Ok(self.0.clone())
    }

    async fn sniff_path(&self, _path: &Path) -> VellumResult<Option<String>> {
        Ok(self.0.clone())
    }
}
