//! Error taxonomy for the attribute resolution core.
//!
//! The parser never fails (malformed lines are skipped, not rejected), so
//! there is deliberately no `Parse` variant here — see the module docs on
//! [`crate::attr_file`].

use std::path::PathBuf;

/// Errors surfaced across the public API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A null or malformed input reached the public surface (e.g. an empty
    /// attribute name passed to [`crate::add_macro`]).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A specifically requested resource does not exist. Returned only for
    /// operations that name a resource directly and expect it already
    /// cached, e.g. [`crate::cache::Cache::flush_source`] given a source
    /// that was never loaded. Collection itself never constructs this
    /// variant: a missing attribute file during a walk is absorbed as "no
    /// contribution" via `Cache::get`'s `Ok(None)`, not an error.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading an expected-present source failed.
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cooperative cancellation fired mid-query.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's `foreach` callback returned a non-zero status.
    #[error("callback aborted with status {0}")]
    CallbackAborted(i32),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
