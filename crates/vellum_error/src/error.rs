//! Top-level error wrapper types.

use crate::{ConfigError, GeneratorError, IdentifyError, JsonError, StorageError};

/// Every error condition a Vellum operation can surface.
///
/// # Examples
///
/// ```
/// use vellum_error::{ConfigError, VellumError, VellumErrorKind};
///
/// let err: VellumError = ConfigError::new("Storage path is required").into();
/// assert!(matches!(err.kind(), VellumErrorKind::Config(_)));
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VellumErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Storage I/O or addressing error
    #[from(StorageError)]
    Storage(StorageError),
    /// Media type identification error
    #[from(IdentifyError)]
    Identify(IdentifyError),
    /// Metadata document serialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Variant generator failure
    #[from(GeneratorError)]
    Generator(GeneratorError),
}

/// Vellum error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vellum Error: {}", _0)]
pub struct VellumError(Box<VellumErrorKind>);

impl VellumError {
    /// Create a new error from a kind.
    pub fn new(kind: VellumErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VellumErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to VellumErrorKind
impl<T> From<T> for VellumError
where
    T: Into<VellumErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vellum operations.
pub type VellumResult<T> = std::result::Result<T, VellumError>;
