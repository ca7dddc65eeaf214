//! Model invocation error helpers
//!
//! Re-exports quill-error and adds the conversion from provider-local
//! failures into the unified error.

pub use quill_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

/// Turn a provider failure into a `GenerationFailed` error.
///
/// The provider's message becomes the error message, so front-ends can show
/// it verbatim. Network failures, rate limits and 5xx answers are marked
/// temporary.
pub fn generation_failed(err: ProviderError, provider: &str, model: &str) -> Error {
    let status = if err.is_transient() {
        ErrorStatus::Temporary
    } else {
        ErrorStatus::Permanent
    };

    Error::generation_failed(err.to_string())
        .with_status(status)
        .with_context("provider", provider)
        .with_context("model", model)
        .set_source(err)
}
