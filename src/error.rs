//! The error taxonomy consumed by callers of [`crate::group::Group`] and by
//! the HTTP transport adapter.
//!
//! Only four variants are recoverable at runtime ([`CacheError::InvalidInput`],
//! [`CacheError::NotFound`], [`CacheError::LoaderError`],
//! [`CacheError::PeerError`]); the remaining failure modes described in
//! spec.md ("ProgrammingError": a `None` loader, double `register_peers`,
//! an unexpected request-path prefix) are wiring mistakes and panic at the
//! call site instead, matching the reference Go source's `panic()` calls.

use std::fmt;

/// Errors that can surface from a [`crate::group::Group::get`] call or from
/// the HTTP transport adapter.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The caller passed an empty key. Never retried by the core.
    #[error("requires a non-empty key")]
    InvalidInput,

    /// A group name has no registered [`crate::group::Group`].
    #[error("no such group: {0}")]
    NotFound(String),

    /// The embedder-supplied loader reported failure for this key.
    #[error("loader failed: {0}")]
    LoaderError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A remote peer could not be reached or returned a malformed response.
    ///
    /// Logged and treated as recoverable: [`crate::group::Group::get`] falls
    /// through to the local loader within the same single-flight window.
    #[error("peer fetch failed: {0}")]
    PeerError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wraps an arbitrary loader failure as a [`CacheError::LoaderError`].
    pub fn loader<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::LoaderError(Box::new(err))
    }

    /// Wraps an arbitrary transport/decode failure as a [`CacheError::PeerError`].
    pub fn peer<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::PeerError(Box::new(err))
    }

    /// Wraps a bare message as a [`CacheError::LoaderError`], for loaders that
    /// don't have a structured error type of their own.
    pub fn loader_msg(msg: impl Into<String>) -> Self {
        Self::LoaderError(Box::new(Message(msg.into())))
    }

    /// Wraps a bare message as a [`CacheError::PeerError`].
    pub fn peer_msg(msg: impl Into<String>) -> Self {
        Self::PeerError(Box::new(Message(msg.into())))
    }
}

/// A minimal `Error` wrapper around a plain string, for call sites that only
/// have a message and no underlying error type.
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}
