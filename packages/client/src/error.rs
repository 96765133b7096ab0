//! Error types for the courier client
//!
//! A single flat taxonomy covering every fallible stage of a request's life:
//! configuration (detected at build time, before any network I/O), body
//! encoding, transport, response body reads, response decoding, and batch
//! cancellation.
//!
//! All variants carry owned messages so the error type stays `Clone`; a
//! cloned error is what the response wrapper hands back from every derived
//! accessor after a failed body read.

use thiserror::Error;

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by request building, dispatch and batch execution.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// The URL handed to the request builder could not be parsed.
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The client's base URL could not be parsed when the request fell back
    /// to it.
    #[error("client base URL '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Neither the request nor the client carries a URL.
    #[error("no URL specified for the request and no base URL on the client")]
    NoUrlConfigured,

    /// A header name or value was rejected by the HTTP layer.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encoding(String),

    /// The underlying transport failed. The cause is wrapped opaquely, never
    /// inspected here.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be read off the wire.
    #[error("error reading response body: {0}")]
    BodyRead(String),

    /// The response body could not be parsed into the requested shape.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The batch-wide cancellation signal fired before this task was
    /// dispatched.
    #[error("batch cancelled before the task was dispatched")]
    Cancelled,
}

impl Error {
    pub(crate) fn invalid_url(url: &str, err: url::ParseError) -> Self {
        Error::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn invalid_base_url(url: &str, err: url::ParseError) -> Self {
        Error::InvalidBaseUrl {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    /// True for errors detected while assembling the request, before any
    /// network I/O was attempted.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl { .. }
                | Error::InvalidBaseUrl { .. }
                | Error::NoUrlConfigured
                | Error::InvalidHeader { .. }
        )
    }

    /// True when the failure came from the underlying transport.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True when the task was dropped by a triggered batch signal.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
