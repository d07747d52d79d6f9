//! API families.
//!
//! Each eBay API is a zero-sized type implementing [`Api`]. The trait holds
//! everything that differs between families: config defaults, the calls the
//! API understands, request encoding, and how errors are reported inside the
//! response body. [`Connection`](crate::Connection) supplies the rest.
//!
//! | Family | Format | Default endpoint |
//! |---|---|---|
//! | [`Browse`] | JSON | `https://api.ebay.com/buy/browse/v1` |
//! | [`Finding`] | XML | `https://svcs.ebay.com/services/search/FindingService/v1` |
//! | [`Merchandising`] | XML | `https://svcs.ebay.com/MerchandisingService` |
//! | [`Shopping`] | XML | `https://open.api.ebay.com/shopping` |
//! | [`Trading`] | XML | `https://api.ebay.com/ws/api.dll` |

use std::fmt;

use serde_json::{Map, Value};
use url::Url;

use crate::{
    config::Config,
    error::Result,
    request::{Method, PreparedRequest, REQUEST_ID_HEADER, USER_AGENT},
    response::{BodyMessages, NodeRules, PayloadFormat, Response},
};

pub mod browse;
pub mod finding;
mod legacy;
pub mod merchandising;
pub mod shopping;
pub mod trading;

pub use browse::Browse;
pub use finding::Finding;
pub use merchandising::Merchandising;
pub use shopping::Shopping;
pub use trading::Trading;

/// Inputs for building one request.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Call name.
    pub verb: &'a str,
    /// Call parameters.
    pub params: &'a Map<String, Value>,
    /// Merged connection config.
    pub config: &'a Config,
    /// OAuth token from the connection's token provider or `token` key.
    pub access_token: Option<&'a str>,
    /// Value of the request id header.
    pub request_id: &'a str,
}

impl CallContext<'_> {
    /// Starts a request carrying the headers every call shares.
    #[must_use]
    pub fn new_request(&self, method: Method, url: Url) -> PreparedRequest {
        let mut request = PreparedRequest::new(self.verb, method, url);
        request.push_header("User-Agent", USER_AGENT);
        request.push_header(REQUEST_ID_HEADER, self.request_id);
        request
    }
}

/// Behavior specific to one eBay API family.
pub trait Api: Clone + Default + fmt::Debug + Send + Sync + 'static {
    /// Family name used in errors and logs.
    const NAME: &'static str;

    /// Domain used when neither options nor YAML provide one; also selects the YAML section.
    const DEFAULT_DOMAIN: &'static str;

    /// Payload format the API answers with.
    const FORMAT: PayloadFormat;

    /// Whether requests use an OAuth access token.
    const USES_ACCESS_TOKEN: bool = false;

    /// Fills in defaults for keys that options and YAML left unset.
    fn apply_defaults(&self, config: &mut Config);

    /// Checks that the API understands `verb`.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::UnsupportedCall`](crate::EbayError::UnsupportedCall)
    /// for unknown calls.
    fn check_verb(&self, verb: &str) -> Result<()>;

    /// Encodes a call into a transport-ready request.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::InvalidParameter`](crate::EbayError::InvalidParameter)
    /// or [`EbayError::Auth`](crate::EbayError::Auth) when the request cannot be built.
    fn build_request(&self, ctx: &CallContext<'_>) -> Result<PreparedRequest>;

    /// Date-like and list nodes for the reply of `verb`.
    fn node_rules(&self, verb: &str) -> NodeRules;

    /// Extracts errors, warnings and codes from the response body.
    fn body_messages(&self, response: &Response) -> BodyMessages;
}
