//! Error kinds for quill operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on the kind to decide how to report a failure. The two kinds
/// a front-end cares most about are [`ErrorKind::ConfigInvalid`], raised before
/// any model call is made, and [`ErrorKind::GenerationFailed`], raised by a
/// model call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Missing or invalid configuration: credentials, model, revision cap
    ConfigInvalid,

    /// Invalid argument passed to an operation (e.g. an empty prompt)
    InvalidArgument,

    /// The model provider failed: transport, authentication, quota or
    /// a malformed/empty response
    GenerationFailed,

    /// Terminal or other IO failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::GenerationFailed => "GenerationFailed",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Whether this kind is reported before any model call is attempted
    pub fn is_pre_call(&self) -> bool {
        matches!(self, ErrorKind::ConfigInvalid | ErrorKind::InvalidArgument)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
