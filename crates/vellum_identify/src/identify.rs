//! Payload identification.

use crate::{FileCommandSniffer, FileMetadata, MediaTypeSniffer, MediaTypes, merge_media_types};
use std::path::Path;
use std::sync::Arc;
use vellum_error::{IdentifyError, IdentifyErrorKind, VellumResult};

/// Something to identify: an in-memory buffer or a file on disk.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// Raw bytes
    Bytes(&'a [u8]),
    /// Path to a readable file
    Path(&'a Path),
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Bytes(bytes)
    }
}

impl<'a> From<&'a Path> for Payload<'a> {
    fn from(path: &'a Path) -> Self {
        Payload::Path(path)
    }
}

/// Identifies payloads with a sniffer and a media type table.
#[derive(Clone)]
pub struct Identifier {
    sniffer: Arc<dyn MediaTypeSniffer>,
    media_types: MediaTypes,
}

impl Identifier {
    /// Create an identifier using the system media type table.
    pub fn new(sniffer: Arc<dyn MediaTypeSniffer>) -> Self {
        Self {
            sniffer,
            media_types: merge_media_types(&MediaTypes::new()),
        }
    }

    /// Lay caller entries over the current table.
    pub fn with_media_types(mut self, overrides: &MediaTypes) -> Self {
        self.media_types.extend(
            overrides
                .iter()
                .map(|(media_type, extensions)| (media_type.clone(), extensions.clone())),
        );
        self
    }

    /// Preferred format extension for a media type.
    pub fn format_for(&self, media_type: &str) -> Option<&str> {
        self.media_types
            .get(media_type)
            .and_then(|extensions| extensions.first())
            .map(String::as_str)
    }

    /// Determine format, media type and size of a payload.
    ///
    /// Sniffing and sizing run concurrently. An unknown media type, or one
    /// without a table entry, leaves `format` unset.
    #[tracing::instrument(skip(self, payload))]
    pub async fn identify(&self, payload: Payload<'_>) -> VellumResult<FileMetadata> {
        let (media_type, size) = match payload {
            Payload::Bytes(bytes) => {
                let media_type = self.sniffer.sniff_bytes(bytes).await?;
                (media_type, bytes.len() as u64)
            }
            Payload::Path(path) => {
                tokio::try_join!(self.sniffer.sniff_path(path), file_size(path))?
            }
        };

        let format = media_type
            .as_deref()
            .and_then(|media_type| self.format_for(media_type))
            .map(str::to_string);

        tracing::debug!(format = ?format, media_type = ?media_type, size, "Identified payload");

        Ok(FileMetadata {
            format,
            media_type,
            size,
            ..Default::default()
        })
    }
}

impl std::fmt::Debug for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identifier")
            .field("media_types", &self.media_types.len())
            .finish_non_exhaustive()
    }
}

async fn file_size(path: &Path) -> VellumResult<u64> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        IdentifyError::new(IdentifyErrorKind::PayloadRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;
    Ok(metadata.len())
}

/// Identify a payload with the libmagic sniffer and the system table plus `media_types`.
pub async fn identify(payload: Payload<'_>, media_types: &MediaTypes) -> VellumResult<FileMetadata> {
    Identifier::new(Arc::new(FileCommandSniffer::default()))
        .with_media_types(media_types)
        .identify(payload)
        .await
}
