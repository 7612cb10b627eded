//! File identifiers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use vellum_error::{StorageError, StorageErrorKind, VellumError, VellumResult};

/// Shortest name the two-level shard can be derived from.
const MIN_NAME_LEN: usize = 3;

/// Identifier of a stored file: `<name>.<ext>`.
///
/// `name` is opaque (a UUID v4 unless the caller picked one) and `ext` is the
/// detected format extension. Neither part may contain a dot or a path
/// separator, and `name` has at least three characters so that its shard can
/// always be derived.
///
/// # Examples
///
/// ```
/// use vellum_storage::FileId;
///
/// let id: FileId = "0d2c5f8e-4b1a-4c3e-9f6d-7a8b9c0d1e2f.png".parse().unwrap();
/// assert_eq!(id.name(), "0d2c5f8e-4b1a-4c3e-9f6d-7a8b9c0d1e2f");
/// assert_eq!(id.ext(), "png");
/// assert_eq!(id.shard(), ("e", "2f"));
/// assert_eq!(id.to_string(), "0d2c5f8e-4b1a-4c3e-9f6d-7a8b9c0d1e2f.png");
///
/// assert!("no-extension".parse::<FileId>().is_err());
/// assert!("ab.txt".parse::<FileId>().is_err());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display("{}.{}", name, ext)]
#[serde(try_from = "String", into = "String")]
pub struct FileId {
    name: String,
    ext: String,
}

/// A path segment we can splice into a file name.
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| matches!(c, '.' | '/' | '\\' | '\0'))
}

impl FileId {
    /// Build an id from a name and an extension, validating both.
    pub fn new(name: impl Into<String>, ext: impl Into<String>) -> VellumResult<Self> {
        let name = name.into();
        let ext = ext.into();

        if !is_valid_segment(&name) || name.chars().count() < MIN_NAME_LEN {
            return Err(StorageError::new(StorageErrorKind::InvalidId(format!(
                "name '{}' must have at least {} characters and no dots or separators",
                name, MIN_NAME_LEN
            )))
            .into());
        }
        if !is_valid_segment(&ext) {
            return Err(StorageError::new(StorageErrorKind::InvalidId(format!(
                "extension '{}' must be non-empty with no dots or separators",
                ext
            )))
            .into());
        }

        Ok(Self { name, ext })
    }

    /// A fresh id with a random UUID v4 name.
    pub fn generate(ext: impl Into<String>) -> VellumResult<Self> {
        Self::new(Uuid::new_v4().to_string(), ext)
    }

    /// The opaque name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The format extension.
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// The two shard directory names.
    ///
    /// The first is the third-from-last character of the name, the second its
    /// last two characters.
    pub fn shard(&self) -> (&str, &str) {
        let starts: Vec<usize> = self.name.char_indices().map(|(i, _)| i).collect();
        // new() guarantees at least MIN_NAME_LEN characters
        let first = starts[starts.len() - 3];
        let second = starts[starts.len() - 2];
        (&self.name[first..second], &self.name[second..])
    }
}

impl FromStr for FileId {
    type Err = VellumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, ext) = s.split_once('.').ok_or_else(|| {
            StorageError::new(StorageErrorKind::InvalidId(format!(
                "'{}' is not of the form <name>.<ext>",
                s
            )))
        })?;
        Self::new(name, ext)
    }
}

impl TryFrom<String> for FileId {
    type Error = VellumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.to_string()
    }
}
