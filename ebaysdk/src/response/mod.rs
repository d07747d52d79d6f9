//! Normalized API responses.
//!
//! A [`Response`] keeps the raw exchange (status, reason, headers, bytes) next
//! to the parsed [`ReplyNode`] tree and the body-level errors and warnings the
//! API family extracted from it.
//!
//! The payload format is chosen from the `Content-Type` header: anything
//! mentioning `json` is parsed as JSON, anything mentioning `xml` as XML, and
//! other or missing types fall back to the format native to the API family.

use std::time::Duration;

use serde_json::Value;

use crate::{
    error::{EbayError, Result},
    transport::TransportResponse,
};

pub mod tree;
pub mod xml;

pub use tree::{Ack, ReplyNode, parse_timestamp};
pub use xml::NodeRules;

/// Payload format of an API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    /// Legacy XML APIs.
    Xml,
    /// REST APIs.
    Json,
}

impl PayloadFormat {
    /// Picks the payload format from a `Content-Type` value.
    #[must_use]
    pub fn detect(content_type: Option<&str>, native: Self) -> Self {
        match content_type.map(str::to_ascii_lowercase) {
            Some(ct) if ct.contains("json") => Self::Json,
            Some(ct) if ct.contains("xml") => Self::Xml,
            _ => native,
        }
    }
}

/// Errors, warnings and codes found in a response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyMessages {
    /// Formatted error messages.
    pub errors: Vec<String>,
    /// Formatted warning messages.
    pub warnings: Vec<String>,
    /// Distinct error and warning codes, in order of appearance.
    pub codes: Vec<String>,
}

impl BodyMessages {
    /// Records a code once.
    pub fn add_code(&mut self, code: impl Into<String>) {
        let code = code.into();
        if !code.is_empty() && !self.codes.contains(&code) {
            self.codes.push(code);
        }
    }
}

/// Response of one API call.
#[derive(Debug, Clone)]
pub struct Response {
    verb: String,
    status: u16,
    reason: String,
    url: String,
    headers: Vec<(String, String)>,
    content: Vec<u8>,
    format: PayloadFormat,
    root: Option<String>,
    reply: ReplyNode,
    json: Option<Value>,
    parse_error: Option<String>,
    messages: BodyMessages,
    elapsed: Duration,
}

impl Response {
    /// Normalizes a raw transport response.
    ///
    /// Parse failures do not fail the call: the reply is left empty and the
    /// failure is reported through [`Response::error`].
    pub(crate) fn parse(
        verb: &str,
        raw: TransportResponse,
        native: PayloadFormat,
        rules: &NodeRules,
    ) -> Self {
        let TransportResponse { status, reason, url, headers, body, elapsed } = raw;
        let content_type = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str());
        let format = PayloadFormat::detect(content_type, native);

        let mut response = Self {
            verb: verb.to_owned(),
            status,
            reason,
            url,
            headers,
            content: body,
            format,
            root: None,
            reply: ReplyNode::Null,
            json: None,
            parse_error: None,
            messages: BodyMessages::default(),
            elapsed,
        };

        if response.content.iter().all(u8::is_ascii_whitespace) {
            return response;
        }

        match format {
            PayloadFormat::Json => match serde_json::from_slice::<Value>(&response.content) {
                Ok(value) => {
                    response.reply = ReplyNode::from_value(value.clone());
                    response.json = Some(value);
                }
                Err(e) => response.parse_error = Some(format!("invalid JSON body: {e}")),
            },
            PayloadFormat::Xml => match xml::parse(&response.content, rules) {
                Ok((root, node)) => {
                    response.root = Some(root);
                    response.reply = node;
                }
                Err(e) => response.parse_error = Some(e.to_string()),
            },
        }

        response
    }

    pub(crate) fn set_messages(&mut self, messages: BodyMessages) {
        self.messages = messages;
    }

    /// Call name that produced this response.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status
    }

    /// HTTP reason phrase.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Final request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// All response headers in received order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the first header with the given name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Raw body bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Format the body was parsed as.
    #[must_use]
    pub const fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Name of the stripped XML root element, such as `GetItemResponse`.
    #[must_use]
    pub fn root_name(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Parsed reply tree.
    #[must_use]
    pub const fn reply(&self) -> &ReplyNode {
        &self.reply
    }

    /// Plain mapping view of the reply tree.
    #[must_use]
    pub fn dict(&self) -> Value {
        self.reply.to_value()
    }

    /// Body as JSON.
    ///
    /// JSON payloads are returned exactly as received; XML payloads yield
    /// the same value as [`Response::dict`].
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Parse`] if the body could not be parsed.
    pub fn json(&self) -> Result<Value> {
        if let Some(error) = &self.parse_error {
            return Err(EbayError::Parse(error.clone()));
        }
        Ok(self.json.clone().unwrap_or_else(|| self.dict()))
    }

    /// Application-level acknowledgement of legacy APIs.
    #[must_use]
    pub fn ack(&self) -> Option<Ack> {
        self.reply.ack()
    }

    /// Body-level error messages.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.messages.errors
    }

    /// Body-level warning messages.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.messages.warnings
    }

    /// Distinct error and warning codes.
    #[must_use]
    pub fn response_codes(&self) -> &[String] {
        &self.messages.codes
    }

    /// Time between sending the request and reading the full body.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Every error reported for the call.
    ///
    /// A non-2xx status contributes its reason phrase first, followed by
    /// parse failures and body-level errors.
    #[must_use]
    pub fn error_list(&self) -> Vec<String> {
        let mut list = Vec::new();
        if self.is_success() {
            if let Some(parse_error) = &self.parse_error {
                list.push(parse_error.clone());
            }
        } else if self.reason.is_empty() {
            list.push(format!("HTTP {}", self.status));
        } else {
            list.push(self.reason.clone());
        }
        list.extend(self.messages.errors.iter().cloned());
        list
    }

    /// Returns `"{verb}: {error}, {error}"`, or `None` when the call reported no error.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        let list = self.error_list();
        if list.is_empty() { None } else { Some(format!("{}: {}", self.verb, list.join(", "))) }
    }
}
