//! # proofcraft-error
//!
//! Unified error handling for proofcraft.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., InferenceFailed, FileNotFound)
//! - **ErrorStatus**: Decide how to handle it (Permanent or Temporary)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use proofcraft_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::FileNotFound, "problem statement not found")
//!         .with_operation("cli::read_problem")
//!         .with_context("path", "problem_statement.txt"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, proofcraft_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Gateway failures are *not* errors: they surface as an absent response

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using proofcraft Error
pub type Result<T> = std::result::Result<T, Error>;
