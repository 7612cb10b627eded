//! TOML configuration.

use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};
use vellum_error::{ConfigError, VellumError, VellumResult};
use vellum_identify::{FileCommandSniffer, Identifier, MediaTypeSniffer, MediaTypes};
use vellum_storage::{FileStorage, VariantDescription};

/// Storage section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// `file` executable used to sniff media types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_command: Option<PathBuf>,
}

/// Vellum configuration.
///
/// ```toml
/// [storage]
/// path = "/var/lib/vellum"
///
/// [media_types]
/// "text/plain" = ["txt"]
///
/// [[variants]]
/// name = "thumb"
/// width = 128
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VellumConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Media type to extension entries laid over the system table
    #[serde(default)]
    pub media_types: MediaTypes,

    /// Variants generated for every file, in order
    #[serde(default)]
    pub variants: Vec<VariantDescription>,
}

impl VellumConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> VellumResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration from the usual places.
    ///
    /// Sources in order of precedence (later sources override earlier):
    /// 1. `~/.config/vellum/vellum.toml`
    /// 2. `./vellum.toml`
    ///
    /// Both are optional. With neither present the result is the default
    /// configuration, which has no storage path.
    #[instrument]
    pub fn load() -> VellumResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir");

        let mut builder = Config::builder();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vellum/vellum.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("vellum").required(false));

        builder
            .build()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Replace the storage root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.path = Some(root.into());
        self
    }

    /// Media type sniffer described by the configuration.
    pub fn sniffer(&self) -> Arc<dyn MediaTypeSniffer> {
        match &self.storage.file_command {
            Some(program) => Arc::new(FileCommandSniffer::new(program)),
            None => Arc::new(FileCommandSniffer::default()),
        }
    }

    /// Identifier using the configured sniffer and media types, for
    /// identifying payloads without a storage.
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.sniffer()).with_media_types(&self.media_types)
    }

    /// Build the configured storage.
    ///
    /// # Errors
    ///
    /// `ConfigError` if no storage path is configured.
    pub fn into_storage(self) -> VellumResult<FileStorage> {
        let mut builder = FileStorage::builder().sniffer(self.sniffer());

        if let Some(path) = self.storage.path {
            builder = builder.path(path);
        }

        builder
            .variants(self.variants)
            .media_types(self.media_types)
            .build()
    }
}
