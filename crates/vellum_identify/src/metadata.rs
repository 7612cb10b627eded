//! File metadata document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vellum_error::{JsonError, VellumResult};

/// Keys of the detected fields, as written on disk.
pub const RESERVED_FIELDS: [&str; 3] = ["format", "mediaType", "size"];

/// Metadata stored next to every file.
///
/// The three detected fields are fixed; anything a caller adds lives in
/// `extra` and is flattened into the same JSON object on disk. `extra` never
/// holds a [`RESERVED_FIELDS`] key once [`FileMetadata::lift_reserved`] ran,
/// otherwise the document would carry the key twice.
///
/// # Examples
///
/// ```
/// use vellum_identify::FileMetadata;
///
/// let mut metadata = FileMetadata {
///     format: Some("txt".to_string()),
///     media_type: Some("text/plain".to_string()),
///     size: 500,
///     ..Default::default()
/// };
/// metadata.insert("length", 500);
///
/// let json = serde_json::to_string(&metadata).unwrap();
/// assert!(json.contains("\"mediaType\":\"text/plain\""));
/// assert!(json.contains("\"length\":500"));
///
/// let parsed: FileMetadata = serde_json::from_str(&json).unwrap();
/// assert_eq!(parsed, metadata);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Detected format extension (e.g. `jpeg`, `mp3`, `txt`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Detected media type (e.g. `image/jpeg`, `text/plain`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Payload size in bytes
    pub size: u64,
    /// Caller-added fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileMetadata {
    /// Attach a caller-defined field, replacing any previous value.
    ///
    /// A reserved key overwrites the detected field when the value fits it
    /// (a string or null for `format` and `mediaType`, an unsigned integer for
    /// `size`). A value that does not fit is kept in `extra`, where
    /// [`FileMetadata::lift_reserved`] rejects it.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        match self.set_reserved(&key, value.into()) {
            Ok(previous) => previous,
            Err(value) => self.extra.insert(key, value),
        }
    }

    /// Look up a caller-defined field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Move reserved keys out of `extra` into the detected fields.
    ///
    /// # Errors
    ///
    /// `JsonError` if a reserved key holds a value its field cannot take.
    pub fn lift_reserved(&mut self) -> VellumResult<()> {
        for key in RESERVED_FIELDS {
            if let Some(value) = self.extra.remove(key) {
                self.set_reserved(key, value).map_err(|value| {
                    JsonError::new(format!("Metadata field `{}` cannot be {}", key, value))
                })?;
            }
        }
        Ok(())
    }

    /// Set a detected field, returning its previous value. Hands the value
    /// back when `key` is not reserved or the value does not fit.
    fn set_reserved(&mut self, key: &str, value: Value) -> Result<Option<Value>, Value> {
        let optional_text = |value: Value| match value {
            Value::String(text) => Ok(Some(text)),
            Value::Null => Ok(None),
            other => Err(other),
        };

        match key {
            "format" => {
                let previous = std::mem::replace(&mut self.format, optional_text(value)?);
                Ok(previous.map(Value::String))
            }
            "mediaType" => {
                let previous = std::mem::replace(&mut self.media_type, optional_text(value)?);
                Ok(previous.map(Value::String))
            }
            "size" => match value.as_u64() {
                Some(size) => Ok(Some(Value::from(std::mem::replace(&mut self.size, size)))),
                None => Err(value),
            },
            _ => Err(value),
        }
    }
}
