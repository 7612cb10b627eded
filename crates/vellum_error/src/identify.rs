//! Identification error types.

/// Kinds of identification errors.
///
/// An undetermined media type is not an error; only failures to read the
/// payload or to run the sniffer end up here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum IdentifyErrorKind {
    /// The sniffer could not be started
    #[display("Media type sniffer unavailable: {}", _0)]
    SnifferUnavailable(String),
    /// The sniffer ran but failed
    #[display("Media type sniffer failed: {}", _0)]
    SnifferFailed(String),
    /// The payload path could not be read
    #[display("Failed to read payload: {}", _0)]
    PayloadRead(String),
}

/// Identification error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Identify Error: {} at line {} in {}", kind, line, file)]
pub struct IdentifyError {
    kind: IdentifyErrorKind,
    line: u32,
    file: &'static str,
}

impl IdentifyError {
    /// Create a new identification error with caller location tracking.
    #[track_caller]
    pub fn new(kind: IdentifyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &IdentifyErrorKind {
        &self.kind
    }
}
