//! Vellum - sharded local file storage with derived variants
//!
//! Vellum stores uploaded files on the local filesystem under paths derived
//! from their ids, keeps a JSON metadata document next to each one, and
//! generates named variants (thumbnails, previews, transcodes) through a
//! pluggable generator.
//!
//! # Features
//!
//! - **Content identification**: media type sniffing via libmagic, mapped to
//!   a format extension that becomes part of the id
//! - **Sharded layout**: two directory levels derived from the id, no index
//! - **Variants**: static or metadata-driven variant lists, fallback chains on
//!   lookup, bulk regeneration with progress events
//! - **Configuration**: TOML files loaded with the `config` crate
//! - **Shell generators**: [`CommandGenerator`] turns any command line into a
//!   variant generator
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vellum::{CommandGenerator, GenerateOptions, Payload, SaveOptions, VellumConfig};
//!
//! # async fn example() -> vellum::VellumResult<()> {
//! let storage = VellumConfig::load()?.with_root("/var/lib/vellum").into_storage()?;
//!
//! let saved = storage
//!     .save_file(Payload::Bytes(b"hello, world"), SaveOptions::new())
//!     .await?;
//!
//! let head = CommandGenerator::new(r#"head -c "$VELLUM_PARAM_LENGTH" "$VELLUM_SRC" > "$VELLUM_DEST""#);
//! storage
//!     .generate_file_variants(&saved.id, &head, GenerateOptions::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `vellum_error` - Error types
//! - `vellum_identify` - Media type and format identification
//! - `vellum_storage` - The storage engine
//!
//! This crate (`vellum`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod observability;

pub use command::CommandGenerator;
pub use self::config::{StorageConfig, VellumConfig};
pub use observability::{LogConfig, init_tracing};

pub use vellum_error::*;
pub use vellum_identify::*;
pub use vellum_storage::*;
