//! Per-call options and results.

use crate::FileId;
use serde::Serialize;
use std::sync::Arc;
use vellum_error::VellumResult;
use vellum_identify::FileMetadata;

/// Hook run on freshly detected metadata before a file is written.
///
/// Lets callers attach their own fields (or correct detected ones). An error
/// aborts the save before anything reaches the disk.
#[async_trait::async_trait]
pub trait BeforeSave: Send + Sync {
    /// Inspect or modify `metadata`.
    async fn before_save(&self, metadata: &mut FileMetadata) -> VellumResult<()>;
}

struct FnHook<F>(F);

#[async_trait::async_trait]
impl<F> BeforeSave for FnHook<F>
where
    F: Fn(&mut FileMetadata) -> VellumResult<()> + Send + Sync,
{
    async fn before_save(&self, metadata: &mut FileMetadata) -> VellumResult<()> {
        (self.0)(metadata)
    }
}

/// Options for [`FileStorage::save_file`](crate::FileStorage::save_file).
///
/// # Examples
///
/// ```
/// use vellum_storage::SaveOptions;
///
/// let options = SaveOptions::new()
///     .with_name("avatar-42")
///     .with_before_save(|metadata| {
///         metadata.insert("owner", 42);
///         Ok(())
///     });
/// assert_eq!(options.name(), Some("avatar-42"));
/// ```
#[derive(Clone, Default)]
pub struct SaveOptions {
    name: Option<String>,
    before_save: Option<Arc<dyn BeforeSave>>,
}

impl SaveOptions {
    /// Options with a generated name and no hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `name` instead of a random UUID.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run a synchronous closure on the metadata before saving.
    pub fn with_before_save<F>(self, hook: F) -> Self
    where
        F: Fn(&mut FileMetadata) -> VellumResult<()> + Send + Sync + 'static,
    {
        self.with_hook(Arc::new(FnHook(hook)))
    }

    /// Run an async hook on the metadata before saving.
    pub fn with_hook(mut self, hook: Arc<dyn BeforeSave>) -> Self {
        self.before_save = Some(hook);
        self
    }

    /// Caller-chosen name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn hook(&self) -> Option<&Arc<dyn BeforeSave>> {
        self.before_save.as_ref()
    }
}

impl std::fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveOptions")
            .field("name", &self.name)
            .field("before_save", &self.before_save.is_some())
            .finish()
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedFile {
    /// Id of the new file
    pub id: FileId,
    /// Metadata as written, including hook changes
    pub metadata: FileMetadata,
}

/// Options for variant (re)generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Remove every existing variant before generating
    pub clean: bool,
}

impl GenerateOptions {
    /// Regenerate on top of existing variants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove existing variants first.
    pub fn clean() -> Self {
        Self { clean: true }
    }
}

/// Alternative tried when a requested variant does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fallback {
    /// The original file
    Original,
    /// Another variant
    Variant(String),
}

impl From<&str> for Fallback {
    fn from(variant: &str) -> Self {
        Fallback::Variant(variant.to_string())
    }
}

impl From<String> for Fallback {
    fn from(variant: String) -> Self {
        Fallback::Variant(variant)
    }
}

/// Ordered list of fallbacks.
///
/// Converts from a single [`Fallback`] as well as from lists of them.
///
/// # Examples
///
/// ```
/// use vellum_storage::{Fallback, FallbackChain};
///
/// let single: FallbackChain = Fallback::Original.into();
/// let chain: FallbackChain = vec![Fallback::from("preview"), Fallback::Original].into();
/// assert_eq!(single.len(), 1);
/// assert_eq!(chain.len(), 2);
/// assert!(FallbackChain::none().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackChain(Vec<Fallback>);

impl FallbackChain {
    /// No fallbacks.
    pub fn none() -> Self {
        Self::default()
    }

    /// Fallbacks in the order they are tried.
    pub fn iter(&self) -> impl Iterator<Item = &Fallback> {
        self.0.iter()
    }

    /// Number of fallbacks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no fallbacks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Fallback> for FallbackChain {
    fn from(fallback: Fallback) -> Self {
        Self(vec![fallback])
    }
}

impl From<Vec<Fallback>> for FallbackChain {
    fn from(fallbacks: Vec<Fallback>) -> Self {
        Self(fallbacks)
    }
}

impl From<&[Fallback]> for FallbackChain {
    fn from(fallbacks: &[Fallback]) -> Self {
        Self(fallbacks.to_vec())
    }
}

impl<const N: usize> From<[Fallback; N]> for FallbackChain {
    fn from(fallbacks: [Fallback; N]) -> Self {
        Self(fallbacks.into())
    }
}
