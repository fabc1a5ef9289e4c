//! Error status: whether an error is worth retrying

use crate::ErrorKind;
use std::fmt;

/// `Temporary` failures may succeed on a fresh attempt; `Permanent` ones
/// will fail the same way again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    Permanent,
    Temporary,
}

impl ErrorStatus {
    /// The status an error of `kind` starts with
    pub fn default_for(kind: ErrorKind) -> Self {
        if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
