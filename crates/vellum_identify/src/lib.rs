//! Media type and format identification for Vellum.
//!
//! Given a payload (raw bytes or a path on disk), this crate determines its
//! media type, the file format extension that media type maps to, and its size
//! in bytes. Detection is best effort: an unrecognised payload yields a
//! [`FileMetadata`] with `format` and `media_type` set to `None`, never an error.
//!
//! # Features
//!
//! - **Pluggable sniffing**: [`MediaTypeSniffer`] trait, with a libmagic-backed
//!   [`FileCommandSniffer`] and a [`FixedMediaType`] for known payloads
//! - **Extension tables**: the system `/etc/mime.types` table merged with
//!   caller overrides
//! - **No temporary files**: byte payloads are streamed to the sniffer
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vellum_identify::{FixedMediaType, Identifier, MediaTypes, Payload};
//!
//! # async fn example() -> vellum_error::VellumResult<()> {
//! let mut overrides = MediaTypes::new();
//! overrides.insert("text/plain".to_string(), vec!["txt".to_string()]);
//!
//! let identifier = Identifier::new(Arc::new(FixedMediaType::new("text/plain")))
//!     .with_media_types(&overrides);
//!
//! let metadata = identifier.identify(Payload::Bytes(b"hello")).await?;
//! assert_eq!(metadata.format.as_deref(), Some("txt"));
//! assert_eq!(metadata.size, 5);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod identify;
mod media_types;
mod metadata;
mod sniffer;

pub use identify::{Identifier, Payload, identify};
pub use media_types::{MediaTypes, merge_media_types, parse_mime_types, system_media_types};
pub use metadata::{FileMetadata, RESERVED_FIELDS};
pub use sniffer::{FileCommandSniffer, FixedMediaType, MediaTypeSniffer};
