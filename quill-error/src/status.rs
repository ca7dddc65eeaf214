//! Error status - whether a failed operation could succeed if tried again

use std::fmt;

/// How an error should be presented to whoever decides to try again.
///
/// quill never retries on its own; the status only tells the user whether
/// submitting the same request later is worth it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// Trying again will not help (bad key, unsupported model, 4xx)
    Permanent,
    /// Trying again may help (network blip, rate limit, 5xx)
    Temporary,
}

impl ErrorStatus {
    /// Check if an error with this status is worth submitting again
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
