//! Variant generator error types.

/// Failure reported by a variant generator.
///
/// Generators may return any [`VellumError`](crate::VellumError); this type is
/// for failures that originate in the generator itself.
///
/// # Examples
///
/// ```
/// use vellum_error::GeneratorError;
///
/// let err = GeneratorError::new("thumb", "convert exited with status 1");
/// assert_eq!(err.variant, "thumb");
/// assert!(format!("{}", err).contains("thumb"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Generator Error: variant '{}': {} at line {} in {}",
    variant,
    message,
    line,
    file
)]
pub struct GeneratorError {
    /// Name of the variant being generated
    pub variant: String,
    /// What went wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl GeneratorError {
    /// Create a new GeneratorError for a variant at the current location.
    #[track_caller]
    pub fn new(variant: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            variant: variant.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
