//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create a shard directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to list a storage directory
    #[display("Failed to read storage directory: {}", _0)]
    DirectoryRead(String),
    /// Failed to write a payload or metadata document
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read a metadata document
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Identifier does not have the `<name>.<ext>` shape
    #[display("Invalid file id: {}", _0)]
    InvalidId(String),
    /// Variant name cannot be spliced into a path
    #[display("Invalid variant name: {}", _0)]
    InvalidVariant(String),
    /// Metadata document missing where derived variants need it
    #[display("Missing metadata for file: {}", _0)]
    MissingMetadata(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use vellum_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::InvalidId("no-extension".to_string()));
/// assert!(format!("{}", err).contains("Invalid file id"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorageErrorKind {
        &self.kind
    }
}
