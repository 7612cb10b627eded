//! Variant descriptions and variant lists.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use vellum_identify::FileMetadata;

/// One variant to generate: a name plus whatever parameters the generator needs.
///
/// Parameters are free-form and flattened next to `name` when serialized, so a
/// TOML or JSON entry like `{ name = "thumb", width = 128 }` deserializes
/// directly.
///
/// # Examples
///
/// ```
/// use vellum_storage::VariantDescription;
///
/// let thumb = VariantDescription::new("thumb").with_param("width", 128);
/// assert_eq!(thumb.param_u64("width"), Some(128));
///
/// let parsed: VariantDescription =
///     serde_json::from_str(r#"{"name":"thumb","width":128}"#).unwrap();
/// assert_eq!(parsed, thumb);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDescription {
    /// Variant name, spliced into the variant's file name
    pub name: String,
    /// Generator parameters
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl VariantDescription {
    /// A variant with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Raw parameter value.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Parameter as an unsigned integer.
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.param(key).and_then(Value::as_u64)
    }

    /// Parameter as a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }
}

/// Function choosing the variants of a file from its metadata.
pub type VariantFn = dyn Fn(&FileMetadata) -> Vec<VariantDescription> + Send + Sync;

/// Which variants a storage generates.
///
/// Either one fixed list for every file, or a list derived per file from its
/// metadata (e.g. skip sizes larger than the original).
#[derive(Clone)]
pub enum Variants {
    /// Same list for every file
    Static(Vec<VariantDescription>),
    /// List computed from each file's metadata
    Derived(Arc<VariantFn>),
}

impl Variants {
    /// Wrap a metadata-driven variant function.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&FileMetadata) -> Vec<VariantDescription> + Send + Sync + 'static,
    {
        Variants::Derived(Arc::new(f))
    }
}

impl Default for Variants {
    fn default() -> Self {
        Variants::Static(Vec::new())
    }
}

impl From<Vec<VariantDescription>> for Variants {
    fn from(variants: Vec<VariantDescription>) -> Self {
        Variants::Static(variants)
    }
}

impl std::fmt::Debug for Variants {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variants::Static(variants) => f.debug_tuple("Static").field(variants).finish(),
            Variants::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}
