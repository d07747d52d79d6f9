//! Request building.
//!
//! API families turn a call name and a parameter mapping into a
//! [`PreparedRequest`]: the method, the final URL, the headers and the body
//! the transport will send. Nothing in this module performs I/O.
//!
//! Parameters are accepted as any [`serde::Serialize`] value and converted
//! through [`serde_json::Value`]; the top level must be a mapping or null.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{EbayError, Result};

pub mod query;
pub mod xml;

/// Request id header attached to every call.
pub const REQUEST_ID_HEADER: &str = "X-EBAY-SDK-REQUEST-ID";

/// `User-Agent` sent by this SDK.
pub const USER_AGENT: &str = concat!("ebaysdk-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP method of a prepared request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Method name in upper case.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport-ready request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Call name.
    pub verb: String,
    /// HTTP method.
    pub method: Method,
    /// Full URL including the query string.
    pub url: Url,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Encoded body; empty for `GET`.
    pub body: Vec<u8>,
}

impl PreparedRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(verb: impl Into<String>, method: Method, url: Url) -> Self {
        Self { verb: verb.into(), method, url, headers: Vec::new(), body: Vec::new() }
    }

    /// Appends a header.
    pub fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Returns the first header with the given name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body text with every `eBayAuthToken` element's content masked, for logging.
    #[must_use]
    pub fn redacted_body_text(&self) -> String {
        const OPEN: &str = "<eBayAuthToken>";
        const CLOSE: &str = "</eBayAuthToken>";

        let body = self.body_text();
        let mut out = String::with_capacity(body.len());
        let mut rest = body.as_str();
        while let Some(start) = rest.find(OPEN) {
            let content = start + OPEN.len();
            out.push_str(&rest[..content]);
            out.push_str("<redacted>");
            match rest[content..].find(CLOSE) {
                Some(end) => rest = &rest[content + end..],
                None => return out,
            }
        }
        out.push_str(rest);
        out
    }

    /// Headers with credential values masked, for logging.
    #[must_use]
    pub fn redacted_headers(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| {
                let sensitive = k.eq_ignore_ascii_case("authorization")
                    || k.eq_ignore_ascii_case("x-ebay-api-iaf-token")
                    || k.eq_ignore_ascii_case("x-ebay-api-cert-name");
                (k.as_str(), if sensitive { "<redacted>" } else { v.as_str() })
            })
            .collect()
    }
}

/// Converts call parameters into a JSON mapping.
///
/// `()` and `None` convert to an empty mapping.
///
/// # Errors
///
/// Returns [`EbayError::InvalidParameter`] if the parameters do not
/// serialize, or serialize to something other than a mapping.
pub fn to_params<P>(params: &P) -> Result<Map<String, Value>>
where
    P: Serialize + ?Sized,
{
    match serde_json::to_value(params)? {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(EbayError::InvalidParameter(format!(
            "parameters must be a mapping, got {}",
            xml::kind(&other)
        ))),
    }
}
