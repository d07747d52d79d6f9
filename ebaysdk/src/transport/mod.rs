//! Wire layer: a sealed [`Transport`] trait that sends a
//! [`PreparedRequest`] and hands back the raw exchange. Transports return
//! every HTTP status to the caller; deciding whether a status is an error
//! is the connection's job, so the error can carry the normalized response.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebaysdk::{
//!     request::{Method, PreparedRequest},
//!     transport::{HttpTransport, Transport},
//! };
//! use url::Url;
//!
//! # async fn example() -> ebaysdk::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let url = Url::parse("https://api.ebay.com/buy/browse/v1/item_summary/search?q=drone").unwrap();
//! let request = PreparedRequest::new("search", Method::Get, url);
//!
//! let response = transport.send(&request).await?;
//! assert!(response.status > 0);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::time::Duration;

use crate::{error::Result, request::PreparedRequest};

pub mod config;
pub mod http;
mod sealed;

pub use config::{HttpConfig, HttpVersion, ProxyConfig};
pub use http::HttpTransport;

/// Raw response from a transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status, empty when unknown.
    pub reason: String,
    /// Final URL after redirects.
    pub url: String,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Time from sending the request to reading the full body.
    pub elapsed: Duration,
}

/// Transport protocol abstraction.
///
/// This trait is sealed; only implementations within this crate are allowed.
///
/// All transport implementations:
/// - Reject URLs that are not `http`/`https` or lack a host
/// - Reject header names and values containing CR, LF or NUL
/// - Apply the configured request timeout
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Sends a prepared request.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Timeout`](crate::EbayError::Timeout) when the
    /// configured timeout elapses, [`EbayError::HttpError`](crate::EbayError::HttpError)
    /// on network failures, and [`EbayError::InvalidParameter`](crate::EbayError::InvalidParameter)
    /// for requests that fail validation.
    fn send<'a>(
        &'a self,
        request: &'a PreparedRequest,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;

    /// Per-request timeout.
    fn timeout(&self) -> Duration;
}
