//! Sharded local file storage with derived variants.
//!
//! [`FileStorage`] keeps every file under a root directory, in a two-level
//! shard derived from its [`FileId`], together with a JSON metadata document
//! and any number of named variants (thumbnails, previews, transcodes...)
//! produced by a caller-supplied [`VariantGenerator`].
//!
//! # Layout
//!
//! ```text
//! {root}/{c1}/{c2}/{name}.{ext}            original
//! {root}/{c1}/{c2}/{name}.{ext}.json       metadata
//! {root}/{c1}/{c2}/{name}.{variant}.{ext}  variant
//! ```
//!
//! `c1` is the third-from-last character of the name and `c2` its last two.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use vellum_error::VellumResult;
//! use vellum_identify::{FixedMediaType, Payload};
//! use vellum_storage::{
//!     FallbackChain, FileId, FileStorage, GenerateOptions, SaveOptions, VariantDescription,
//!     VariantGenerator,
//! };
//!
//! struct Truncate;
//!
//! #[async_trait::async_trait]
//! impl VariantGenerator for Truncate {
//!     async fn generate(
//!         &self,
//!         _id: &FileId,
//!         src: &Path,
//!         dest: &Path,
//!         variant: &VariantDescription,
//!     ) -> VellumResult<()> {
//!         let len = variant.param_u64("length").unwrap_or(0) as usize;
//!         let bytes = tokio::fs::read(src).await.unwrap_or_default();
//!         tokio::fs::write(dest, &bytes[..len.min(bytes.len())]).await.ok();
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> VellumResult<()> {
//! let storage = FileStorage::builder()
//!     .path("/var/lib/vellum")
//!     .sniffer(Arc::new(FixedMediaType::new("text/plain")))
//!     .variants(vec![VariantDescription::new("tiny").with_param("length", 10)])
//!     .build()?;
//!
//! let saved = storage
//!     .save_file(Payload::Bytes(b"hello, world"), SaveOptions::new())
//!     .await?;
//! storage
//!     .generate_file_variants(&saved.id, &Truncate, GenerateOptions::new())
//!     .await?;
//!
//! let tiny = storage.file_path(&saved.id, Some("tiny"), FallbackChain::none()).await;
//! assert!(tiny.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod generator;
mod id;
mod layout;
mod options;
mod progress;
mod storage;
mod variant;

pub use generator::VariantGenerator;
pub use id::FileId;
pub use options::{BeforeSave, Fallback, FallbackChain, GenerateOptions, SaveOptions, SavedFile};
pub use progress::{BatchProgress, ProgressEvent, VariantProgress};
pub use storage::{FileStorage, FileStorageBuilder, UNDETECTED_FORMAT};
pub use variant::{VariantDescription, VariantFn, Variants};
