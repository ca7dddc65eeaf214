//! # quill-error
//!
//! Unified error handling for quill, in the OpenDAL style.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., ConfigInvalid, GenerationFailed)
//! - **ErrorStatus**: Whether trying again later could help (informational, nothing retries)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use quill_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ConfigInvalid, "no API key configured")
//!         .with_operation("cli::build_provider")
//!         .with_context("env", "GEMINI_API_KEY"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, quill_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using quill Error
pub type Result<T> = std::result::Result<T, Error>;
