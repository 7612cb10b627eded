//! Variant generator trait.

use crate::{FileId, VariantDescription};
use std::path::Path;
use vellum_error::VellumResult;

/// Produces one variant of a file.
///
/// The storage calls `generate` once per variant, in order, and waits for
/// each call before starting the next. An implementation reads `src`, writes a
/// complete file to `dest` (or fails), and must not hold on to either path
/// after returning.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use vellum_error::VellumResult;
/// use vellum_storage::{FileId, VariantDescription, VariantGenerator};
///
/// struct Copy;
///
/// #[async_trait::async_trait]
/// impl VariantGenerator for Copy {
///     async fn generate(
///         &self,
///         _id: &FileId,
///         src: &Path,
///         dest: &Path,
///         _variant: &VariantDescription,
///     ) -> VellumResult<()> {
///         tokio::fs::copy(src, dest)
///             .await
///             .map(|_| ())
///             .map_err(|e| vellum_error::GeneratorError::new("copy", e.to_string()).into())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait VariantGenerator: Send + Sync {
    /// Write the `variant` of `id` from `src` to `dest`.
    async fn generate(
        &self,
        id: &FileId,
        src: &Path,
        dest: &Path,
        variant: &VariantDescription,
    ) -> VellumResult<()>;
}
