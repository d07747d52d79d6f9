//! Error types for the eBay SDK.
//!
//! All fallible operations return [`Result<T>`], whose error type is
//! [`EbayError`]. Errors fall into three layers:
//!
//! - **Connection errors** ([`EbayError::ConnectionError`], [`EbayError::HttpError`],
//!   [`EbayError::Timeout`]): the call did not produce a usable response. A status
//!   or `ack` failure carries the normalized [`Response`] so callers can inspect
//!   what eBay actually returned.
//! - **Request errors** ([`EbayError::InvalidParameter`], [`EbayError::UnsupportedCall`],
//!   [`EbayError::Auth`]): the request could not be built; no I/O happened.
//! - **Setup errors** ([`EbayError::Config`], [`EbayError::Parse`],
//!   [`EbayError::TaskFailed`]).
//!
//! # Examples
//!
//! ```
//! use ebaysdk::error::{EbayError, Result};
//!
//! fn require_item_id(item_id: Option<&str>) -> Result<&str> {
//!     item_id.ok_or_else(|| EbayError::InvalidParameter("item_id is required".to_owned()))
//! }
//!
//! assert!(require_item_id(None).is_err());
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::response::Response;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, EbayError>;

/// Errors that can occur while talking to an eBay API.
///
/// # Error Recovery
///
/// - **Transient errors** ([`HttpError`](Self::HttpError), [`Timeout`](Self::Timeout),
///   5xx [`ConnectionError`](Self::ConnectionError)): retry with backoff, see
///   [`crate::reliability`]
/// - **Request errors** ([`InvalidParameter`](Self::InvalidParameter),
///   [`UnsupportedCall`](Self::UnsupportedCall)): fix the call and retry
/// - **Credential errors** ([`Auth`](Self::Auth)): configure a token or token provider
/// - **Application errors** (`ack == Failure`): read [`response`](Self::response)
///   and its error messages
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum EbayError {
    /// The API answered, but with a non-2xx status or an `ack` of `Failure`.
    ///
    /// The message has the form `"{verb}: {error}, {error}"`. The response that
    /// triggered the failure is attached.
    #[error("{message}")]
    ConnectionError {
        /// Human readable summary of every error reported for the call.
        message: String,
        /// Normalized response that triggered the failure.
        response: Option<Box<Response>>,
    },

    /// The HTTP exchange failed before a response was received.
    ///
    /// Wraps [`reqwest::Error`]: DNS failures, refused connections, TLS errors.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The transport timed out waiting for the API.
    #[error("{verb}: request timed out after {after:?}")]
    Timeout {
        /// Call that timed out.
        verb: String,
        /// Configured timeout.
        after: Duration,
    },

    /// A request parameter cannot be encoded for the API family.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebaysdk::error::EbayError;
    ///
    /// let err = EbayError::InvalidParameter("item_id is required for getItem".to_owned());
    /// assert!(err.to_string().contains("invalid parameter"));
    /// ```
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The call name is not one the API family recognizes.
    #[error("{api} does not support the call '{verb}'")]
    UnsupportedCall {
        /// API family name.
        api: &'static str,
        /// Rejected call name.
        verb: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credentials for the call.
    #[error("authentication error: {0}")]
    Auth(String),

    /// A payload could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// A parallel task panicked or was cancelled.
    #[error("parallel task failed: {0}")]
    TaskFailed(String),
}

impl EbayError {
    /// Builds a connection error carrying the offending response.
    pub fn connection(message: impl Into<String>, response: Response) -> Self {
        Self::ConnectionError { message: message.into(), response: Some(Box::new(response)) }
    }

    /// Returns the response attached to a connection error, if any.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::ConnectionError { response, .. } => response.as_deref(),
            _ => None,
        }
    }

    /// Consumes the error and returns the attached response, if any.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::ConnectionError { response, .. } => response.map(|r| *r),
            _ => None,
        }
    }

    /// Returns `true` for failures of the connection layer: status or `ack`
    /// failures, network failures and timeouts.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionError { .. } | Self::HttpError(_) | Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for EbayError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidParameter(format!("parameters are not representable as JSON: {err}"))
    }
}
