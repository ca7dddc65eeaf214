//! The main Error type for quill

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all quill operations.
///
/// This error type provides:
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description (for provider failures, the provider's own message)
/// - `status`: Whether submitting again could help
/// - `operation`: What operation caused the error
/// - `context`: Key-value pairs for debugging
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use quill_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::GenerationFailed, "quota exceeded")
///     .with_operation("provider::generate")
///     .with_status(ErrorStatus::Temporary)
///     .with_context("provider", "gemini")
///     .with_context("model", "gemini-2.5-flash");
///
/// assert_eq!(err.kind(), ErrorKind::GenerationFailed);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new, permanent error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: ErrorStatus::Permanent,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Look up a context value by key (first match)
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Set the error status
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    /// Check if submitting the same request again could help
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;

        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::IoFailed, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create a ConfigInvalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a ConfigInvalid error for a credential that was never supplied
    pub fn missing_credential(env_var: &'static str) -> Self {
        Self::new(
            ErrorKind::ConfigInvalid,
            format!("no API key configured; pass --api-key or set {}", env_var),
        )
        .with_context("env", env_var)
    }

    /// Create a ConfigInvalid error for a model the provider does not serve
    pub fn unsupported_model(model: impl Into<String>, provider: impl Into<String>) -> Self {
        let model = model.into();
        let provider = provider.into();
        Self::new(
            ErrorKind::ConfigInvalid,
            format!("model '{}' is not supported by {}", model, provider),
        )
        .with_context("model", model)
        .with_context("provider", provider)
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a GenerationFailed error carrying the provider's message
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GenerationFailed, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::ConfigInvalid, "no API key configured");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.message(), "no API key configured");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::generation_failed("deadline exceeded")
            .with_operation("provider::generate")
            .with_context("provider", "gemini")
            .with_context("model", "gemini-2.5-flash");

        assert_eq!(err.operation(), "provider::generate");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("provider", "gemini".to_string()));
        assert_eq!(err.context_value("model"), Some("gemini-2.5-flash"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::generation_failed("connection reset")
            .with_operation("gemini::complete")
            .with_operation("revision::run");

        assert_eq!(err.operation(), "revision::run");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "gemini::complete".to_string()));
    }

    #[test]
    fn test_temporary_status() {
        let err = Error::generation_failed("rate limited").with_status(ErrorStatus::Temporary);
        assert!(err.is_retryable());

        let err = Error::missing_credential("GEMINI_API_KEY");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::generation_failed("model overloaded")
            .with_status(ErrorStatus::Temporary)
            .with_operation("provider::generate")
            .with_context("model", "gemini-3-flash");

        let display = format!("{}", err);
        assert!(display.contains("GenerationFailed"));
        assert!(display.contains("temporary"));
        assert!(display.contains("provider::generate"));
        assert!(display.contains("model: gemini-3-flash"));
        assert!(display.ends_with("=> model overloaded"));
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::missing_credential("GEMINI_API_KEY");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("GEMINI_API_KEY"));

        let err = Error::unsupported_model("gpt-9", "gemini");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("model"), Some("gpt-9"));

        let err = Error::invalid_argument("prompt must not be empty");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.kind().is_pre_call());
    }

    #[test]
    fn test_set_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::generation_failed("response body was not JSON").set_source(json_err);

        assert!(err.source_ref().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::IoFailed);
        assert_eq!(err.operation(), "io");
    }
}
