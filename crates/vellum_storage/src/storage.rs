//! The file storage engine.

use crate::layout::{self, Entry};
use crate::{
    BatchProgress, Fallback, FallbackChain, FileId, GenerateOptions, ProgressEvent, SaveOptions,
    SavedFile, VariantDescription, VariantGenerator, VariantProgress, Variants,
};
use futures::future::join_all;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use vellum_error::{ConfigError, JsonError, StorageError, StorageErrorKind, VellumResult};
use vellum_identify::{
    FileCommandSniffer, FileMetadata, Identifier, MediaTypeSniffer, MediaTypes, Payload,
};

/// Extension given to files whose format could not be detected.
pub const UNDETECTED_FORMAT: &str = "undefined";

/// Sharded file storage with derived variants.
///
/// Every file lives under `root` at a path derived from its [`FileId`], next
/// to a JSON metadata document and any generated variants. Lookups read the
/// filesystem at call time; nothing is cached.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use vellum_identify::{FixedMediaType, Payload};
/// use vellum_storage::{FileStorage, SaveOptions};
///
/// # async fn example() -> vellum_error::VellumResult<()> {
/// let storage = FileStorage::builder()
///     .path("/var/lib/vellum")
///     .sniffer(Arc::new(FixedMediaType::new("text/plain")))
///     .build()?;
///
/// let saved = storage
///     .save_file(Payload::Bytes(b"hello"), SaveOptions::new())
///     .await?;
/// let path = storage.original_path(&saved.id).await;
/// assert!(path.is_some());
/// # Ok(())
/// # }
/// ```
pub struct FileStorage {
    root: PathBuf,
    variants: Variants,
    identifier: Identifier,
    subscribers: parking_lot::Mutex<Vec<mpsc::UnboundedSender<ProgressEvent>>>,
    regenerating: AtomicBool,
}

impl FileStorage {
    /// Start building a storage.
    pub fn builder() -> FileStorageBuilder {
        FileStorageBuilder::default()
    }

    /// Root directory of the storage.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Receive progress events of subsequent regeneration passes.
    ///
    /// Every receiver gets every event published after it subscribed, in
    /// order, however late it drains. Events queue without bound until read;
    /// dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Whether a pass over all files is running on this instance.
    pub fn is_regenerating(&self) -> bool {
        self.regenerating.load(Ordering::Acquire)
    }

    /// Identify a payload with this storage's sniffer and media type table.
    pub async fn identify(&self, payload: Payload<'_>) -> VellumResult<FileMetadata> {
        self.identifier.identify(payload).await
    }

    /// Store a payload and its metadata.
    ///
    /// The id is the caller's name (or a UUID v4) plus the detected format
    /// extension, [`UNDETECTED_FORMAT`] when nothing was detected. The
    /// `before_save` hook runs before anything is written and may abort the
    /// save. Payload and metadata are written concurrently; if either write
    /// fails both paths are removed and the first write error is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidId` if the caller's name is not usable
    /// - `IdentifyError` if the payload cannot be read or sniffed
    /// - `JsonError` if the hook left a detected field with an unusable value
    /// - `DirectoryCreation` / `FileWrite` on I/O failures
    /// - any error returned by the hook
    #[tracing::instrument(skip(self, payload, options), fields(name = options.name()))]
    pub async fn save_file(
        &self,
        payload: Payload<'_>,
        options: SaveOptions,
    ) -> VellumResult<SavedFile> {
        let mut metadata = self.identifier.identify(payload).await?;

        let ext = metadata
            .format
            .clone()
            .unwrap_or_else(|| UNDETECTED_FORMAT.to_string());
        let id = match options.name() {
            Some(name) => FileId::new(name, ext)?,
            None => FileId::generate(ext)?,
        };

        if let Some(hook) = options.hook() {
            hook.before_save(&mut metadata).await?;
            metadata.lift_reserved()?;
        }

        let dir = layout::shard_dir(&self.root, &id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;

        let document = serde_json::to_vec(&metadata)
            .map_err(|e| JsonError::new(format!("Failed to serialize metadata of {}: {}", id, e)))?;

        let original = layout::original_path(&self.root, &id);
        let metadata_path = layout::metadata_path(&self.root, &id);

        // both writes settle before any rollback so no write lands after it
        let (payload_written, metadata_written) = tokio::join!(
            write_payload(payload, &original),
            write_bytes(&metadata_path, &document)
        );
        if let Err(err) = payload_written.and(metadata_written) {
            tracing::warn!(%id, error = %err, "Save failed, rolling back");
            tokio::join!(remove_quietly(&original), remove_quietly(&metadata_path));
            return Err(err);
        }

        tracing::info!(%id, size = metadata.size, format = ?metadata.format, "Saved file");
        Ok(SavedFile { id, metadata })
    }

    /// Remove a file, its metadata and all of its variants.
    ///
    /// Unknown ids are a no-op. Individual removals are best effort.
    ///
    /// # Errors
    ///
    /// `DirectoryRead` if the shard directory exists but cannot be listed.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete_file(&self, id: &FileId) -> VellumResult<()> {
        let doomed = self.entries_of(id, |_| true).await?;
        if doomed.is_empty() {
            tracing::debug!("Nothing to delete");
            return Ok(());
        }

        join_all(doomed.iter().map(|path| remove_quietly(path))).await;
        tracing::info!(removed = doomed.len(), "Deleted file");
        Ok(())
    }

    /// Metadata document of a file, `None` if the file is unknown.
    ///
    /// # Errors
    ///
    /// - `FileRead` if the document exists but cannot be read
    /// - `JsonError` if it does not parse
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn file_metadata(&self, id: &FileId) -> VellumResult<Option<FileMetadata>> {
        let path = layout::metadata_path(&self.root, id);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No metadata");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };

        let metadata = serde_json::from_slice(&contents)
            .map_err(|e| JsonError::new(format!("{}: {}", path.display(), e)))?;
        Ok(Some(metadata))
    }

    /// Path of the original (`variant` = `None`) or of a variant.
    ///
    /// When the requested file does not exist, each fallback is tried in
    /// order. Returns the first path that exists right now, or `None`.
    /// Variant names that cannot be part of a file name never match.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use vellum_storage::{Fallback, FileId, FileStorage};
    /// # async fn example(storage: &FileStorage, id: &FileId) {
    /// // the preview, else the thumbnail, else the original
    /// let path = storage
    ///     .file_path(id, Some("preview"), [Fallback::from("thumb"), Fallback::Original])
    ///     .await;
    /// # }
    /// ```
    #[tracing::instrument(skip(self, fallback), fields(id = %id))]
    pub async fn file_path(
        &self,
        id: &FileId,
        variant: Option<&str>,
        fallback: impl Into<FallbackChain>,
    ) -> Option<PathBuf> {
        let fallback = fallback.into();
        let candidates = std::iter::once(variant).chain(fallback.iter().map(|f| match f {
            Fallback::Original => None,
            Fallback::Variant(name) => Some(name.as_str()),
        }));

        for candidate in candidates {
            if candidate.is_some_and(|name| !layout::is_valid_variant(id, name)) {
                tracing::debug!(variant = ?candidate, "Skipping unusable variant name");
                continue;
            }

            let path = layout::file_path(&self.root, id, candidate);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }

        tracing::debug!("No candidate exists");
        None
    }

    /// Path of the original, `None` if it does not exist.
    pub async fn original_path(&self, id: &FileId) -> Option<PathBuf> {
        self.file_path(id, None, FallbackChain::none()).await
    }

    /// Generate every configured variant of one file.
    ///
    /// Does nothing if the original does not exist. Variants are generated one
    /// at a time in list order, publishing a [`VariantProgress`] before the
    /// first and after each one. A generator failure stops the pass; variants
    /// written before it stay on disk.
    ///
    /// # Errors
    ///
    /// - `InvalidVariant` if a variant name cannot be part of a file name
    /// - `MissingMetadata` if variants are derived and the metadata is gone
    /// - any error returned by the generator
    #[tracing::instrument(skip(self, generator), fields(id = %id))]
    pub async fn generate_file_variants(
        &self,
        id: &FileId,
        generator: &dyn VariantGenerator,
        options: GenerateOptions,
    ) -> VellumResult<()> {
        let Some(src) = self.original_path(id).await else {
            tracing::debug!("Original missing, nothing to generate");
            return Ok(());
        };

        let variants = self.variants_for(id).await?;
        if let Some(bad) = variants.iter().find(|v| !layout::is_valid_variant(id, &v.name)) {
            return Err(StorageError::new(StorageErrorKind::InvalidVariant(format!(
                "'{}' for {}",
                bad.name, id
            )))
            .into());
        }

        if options.clean {
            let stale = self
                .entries_of(id, |entry| matches!(entry, Entry::Variant(_)))
                .await?;
            join_all(stale.iter().map(|path| remove_quietly(path))).await;
            tracing::debug!(removed = stale.len(), "Removed previous variants");
        }

        let total = variants.len();
        let mut ready = Vec::with_capacity(total);
        self.publish(VariantProgress::new(id.clone(), ready.clone(), total));

        for variant in &variants {
            let dest = layout::variant_path(&self.root, id, &variant.name);
            generator.generate(id, &src, &dest, variant).await?;
            tracing::info!(variant = %variant.name, "Generated variant");

            ready.push(variant.name.clone());
            self.publish(VariantProgress::new(id.clone(), ready.clone(), total));
        }

        Ok(())
    }

    /// Regenerate the variants of every stored file.
    ///
    /// Only one pass runs per instance: a call made while another is running
    /// returns `Ok(false)` right away. Files are processed one at a time in id
    /// order, publishing a [`BatchProgress`] before the first and after each.
    ///
    /// # Errors
    ///
    /// The first error of [`generate_file_variants`](Self::generate_file_variants)
    /// or of the directory walk. The pass stops there.
    #[tracing::instrument(skip(self, generator))]
    pub async fn generate_all_files_variants(
        &self,
        generator: &dyn VariantGenerator,
        options: GenerateOptions,
    ) -> VellumResult<bool> {
        let Some(_guard) = RegenerationGuard::acquire(&self.regenerating) else {
            tracing::info!("Regeneration already running, skipping");
            return Ok(false);
        };

        let ids = self.file_ids().await?;
        let total = ids.len();
        self.publish(BatchProgress::new(None, 0, total));

        for (done, id) in ids.into_iter().enumerate() {
            self.generate_file_variants(&id, generator, options).await?;
            self.publish(BatchProgress::new(Some(id), done + 1, total));
        }

        tracing::info!(total, "Regenerated variants of all files");
        Ok(true)
    }

    /// Ids of every stored original, sorted.
    ///
    /// Walks the two shard levels below the root. Metadata documents and
    /// variants have more than one dot and are never mistaken for originals.
    /// A missing root holds no files.
    ///
    /// # Errors
    ///
    /// `DirectoryRead` if a directory cannot be listed.
    #[tracing::instrument(skip(self))]
    pub async fn file_ids(&self) -> VellumResult<Vec<FileId>> {
        let mut ids = Vec::new();

        for first in subdirectories(&self.root).await? {
            for second in subdirectories(&first).await? {
                for (path, name) in list_dir(&second).await? {
                    let Ok(id) = name.parse::<FileId>() else {
                        continue;
                    };
                    if tokio::fs::metadata(&path)
                        .await
                        .map(|m| m.is_file())
                        .unwrap_or(false)
                    {
                        ids.push(id);
                    }
                }
            }
        }

        ids.sort();
        tracing::debug!(count = ids.len(), "Discovered files");
        Ok(ids)
    }

    async fn variants_for(&self, id: &FileId) -> VellumResult<Vec<VariantDescription>> {
        match &self.variants {
            Variants::Static(variants) => Ok(variants.clone()),
            Variants::Derived(derive) => {
                let metadata = self.file_metadata(id).await?.ok_or_else(|| {
                    StorageError::new(StorageErrorKind::MissingMetadata(id.to_string()))
                })?;
                Ok(derive(&metadata))
            }
        }
    }

    /// Paths in the shard directory of `id` that belong to it and pass `keep`.
    async fn entries_of(
        &self,
        id: &FileId,
        keep: impl Fn(Entry<'_>) -> bool,
    ) -> VellumResult<Vec<PathBuf>> {
        let dir = layout::shard_dir(&self.root, id);
        Ok(list_dir(&dir)
            .await?
            .into_iter()
            .filter(|(_, name)| layout::classify(id, name).is_some_and(&keep))
            .map(|(path, _)| path)
            .collect())
    }

    fn publish(&self, event: impl Into<ProgressEvent>) {
        let event = event.into();
        // receivers that went away are forgotten
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("root", &self.root)
            .field("variants", &self.variants)
            .field("regenerating", &self.is_regenerating())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FileStorage`].
#[derive(Default)]
pub struct FileStorageBuilder {
    path: Option<PathBuf>,
    variants: Variants,
    media_types: MediaTypes,
    sniffer: Option<Arc<dyn MediaTypeSniffer>>,
}

impl FileStorageBuilder {
    /// Root directory (required). Created lazily on first save.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Variants to generate.
    pub fn variants(mut self, variants: impl Into<Variants>) -> Self {
        self.variants = variants.into();
        self
    }

    /// Media type to extension entries laid over the system table.
    pub fn media_types(mut self, media_types: MediaTypes) -> Self {
        self.media_types = media_types;
        self
    }

    /// Media type sniffer. Defaults to [`FileCommandSniffer`].
    pub fn sniffer(mut self, sniffer: Arc<dyn MediaTypeSniffer>) -> Self {
        self.sniffer = Some(sniffer);
        self
    }

    /// Build the storage.
    ///
    /// # Errors
    ///
    /// `ConfigError` if no path, or an empty one, was given.
    pub fn build(self) -> VellumResult<FileStorage> {
        let root = self
            .path
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::new("Storage path is required"))?;

        let sniffer = self
            .sniffer
            .unwrap_or_else(|| Arc::new(FileCommandSniffer::default()));
        let identifier = Identifier::new(sniffer).with_media_types(&self.media_types);

        tracing::debug!(root = %root.display(), variants = ?self.variants, "Built file storage");

        Ok(FileStorage {
            root,
            variants: self.variants,
            identifier,
            subscribers: parking_lot::Mutex::new(Vec::new()),
            regenerating: AtomicBool::new(false),
        })
    }
}

/// Holds the bulk regeneration flag until dropped.
struct RegenerationGuard<'a>(&'a AtomicBool);

impl<'a> RegenerationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RegenerationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn write_payload(payload: Payload<'_>, dest: &Path) -> VellumResult<()> {
    match payload {
        Payload::Bytes(bytes) => write_bytes(dest, bytes).await,
        Payload::Path(src) => tokio::fs::copy(src, dest).await.map(|_| ()).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{} -> {}: {}",
                src.display(),
                dest.display(),
                e
            )))
            .into()
        }),
    }
}

async fn write_bytes(dest: &Path, bytes: &[u8]) -> VellumResult<()> {
    tokio::fs::write(dest, bytes).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            dest.display(),
            e
        )))
        .into()
    })
}

/// Remove a file, logging anything but "already gone".
async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

/// Entries of a directory with their UTF-8 names. A missing directory is empty.
async fn list_dir(dir: &Path) -> VellumResult<Vec<(PathBuf, String)>> {
    let read_error = |e: std::io::Error| {
        StorageError::new(StorageErrorKind::DirectoryRead(format!(
            "{}: {}",
            dir.display(),
            e
        )))
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_error(e).into()),
    };

    let mut listed = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        if let Ok(name) = entry.file_name().into_string() {
            listed.push((entry.path(), name));
        }
    }
    Ok(listed)
}

async fn subdirectories(dir: &Path) -> VellumResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for (path, _) in list_dir(dir).await? {
        if tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            dirs.push(path);
        }
    }
    Ok(dirs)
}
