//! Regeneration progress events.

use crate::FileId;
use serde::Serialize;

/// Progress of one file's variant generation.
///
/// Sent once before the first variant (with `ready` empty) and again after
/// each variant completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct VariantProgress {
    /// File being processed
    id: FileId,
    /// Names of the variants generated so far, in generation order
    ready: Vec<String>,
    /// Number of variants this pass generates
    total: usize,
}

impl VariantProgress {
    pub(crate) fn new(id: FileId, ready: Vec<String>, total: usize) -> Self {
        Self { id, ready, total }
    }
}

/// Progress of a regeneration pass over every stored file.
///
/// Sent once before the first file (with no `id`) and again after each file
/// completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct BatchProgress {
    /// Last processed file, absent on the opening announcement
    id: Option<FileId>,
    /// Number of files processed so far
    ready: usize,
    /// Number of files in the pass
    total: usize,
}

impl BatchProgress {
    pub(crate) fn new(id: Option<FileId>, ready: usize, total: usize) -> Self {
        Self { id, ready, total }
    }
}

/// Event published to [`FileStorage::subscribe`](crate::FileStorage::subscribe) receivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::From)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Per-file variant progress
    Variant(VariantProgress),
    /// All-files pass progress
    Batch(BatchProgress),
}
