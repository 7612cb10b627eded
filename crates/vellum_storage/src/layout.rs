//! On-disk layout of a storage root.
//!
//! ```text
//! {root}/{c1}/{c2}/{name}.{ext}            original
//! {root}/{c1}/{c2}/{name}.{ext}.json       metadata
//! {root}/{c1}/{c2}/{name}.{variant}.{ext}  variant
//! ```
//!
//! `c1`/`c2` come from [`FileId::shard`]. Every path here is a pure function
//! of the root and the id.

use crate::FileId;
use crate::id::is_valid_segment;
use std::path::{Path, PathBuf};

const METADATA_SUFFIX: &str = ".json";

/// Directory holding every artifact of `id`.
pub(crate) fn shard_dir(root: &Path, id: &FileId) -> PathBuf {
    let (first, second) = id.shard();
    root.join(first).join(second)
}

/// Path of the original payload.
pub(crate) fn original_path(root: &Path, id: &FileId) -> PathBuf {
    shard_dir(root, id).join(id.to_string())
}

/// Path of a variant: the variant name spliced in before the extension.
pub(crate) fn variant_path(root: &Path, id: &FileId, variant: &str) -> PathBuf {
    shard_dir(root, id).join(format!("{}.{}.{}", id.name(), variant, id.ext()))
}

/// Path of the original, or of a variant when one is named.
pub(crate) fn file_path(root: &Path, id: &FileId, variant: Option<&str>) -> PathBuf {
    match variant {
        Some(variant) => variant_path(root, id, variant),
        None => original_path(root, id),
    }
}

/// Path of the metadata document.
pub(crate) fn metadata_path(root: &Path, id: &FileId) -> PathBuf {
    shard_dir(root, id).join(format!("{}{}", id, METADATA_SUFFIX))
}

/// Role of a shard directory entry relative to one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entry<'a> {
    Original,
    Metadata,
    Variant(&'a str),
}

/// What `file_name` is to `id`, or `None` if it belongs to another file.
pub(crate) fn classify<'a>(id: &FileId, file_name: &'a str) -> Option<Entry<'a>> {
    let rest = file_name.strip_prefix(id.name())?.strip_prefix('.')?;

    if rest == id.ext() {
        return Some(Entry::Original);
    }
    if rest.strip_suffix(METADATA_SUFFIX) == Some(id.ext()) {
        return Some(Entry::Metadata);
    }

    let variant = rest.strip_suffix(id.ext())?.strip_suffix('.')?;
    is_valid_segment(variant).then_some(Entry::Variant(variant))
}

/// Whether `variant` can be stored next to `id` without clobbering its metadata.
pub(crate) fn is_valid_variant(id: &FileId, variant: &str) -> bool {
    is_valid_segment(variant) && variant_path(Path::new(""), id, variant) != metadata_path(Path::new(""), id)
}
