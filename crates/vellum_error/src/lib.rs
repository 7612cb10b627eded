//! Error types for the Vellum library.
//!
//! This crate provides the foundation error types used throughout the Vellum workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Not-found conditions are deliberately absent: lookups report them as `None`.
//!
//! # Examples
//!
//! ```
//! use vellum_error::{ConfigError, VellumResult};
//!
//! fn open_root(path: Option<&str>) -> VellumResult<String> {
//!     match path {
//!         Some(path) => Ok(path.to_string()),
//!         None => Err(ConfigError::new("Storage path is required"))?,
//!     }
//! }
//!
//! assert!(open_root(None).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generator;
mod identify;
mod json;
mod storage;

pub use config::ConfigError;
pub use error::{VellumError, VellumErrorKind, VellumResult};
pub use generator::GeneratorError;
pub use identify::{IdentifyError, IdentifyErrorKind};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
