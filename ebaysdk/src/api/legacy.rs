//! Pieces shared by the XML APIs.

use serde_json::{Map, Value};

use super::CallContext;
use crate::{
    config::Config,
    error::Result,
    request::{
        Method, PreparedRequest,
        xml::{envelope, map_to_xml},
    },
    response::{Ack, BodyMessages, ReplyNode, Response},
};

/// Builds a `POST` request with the `{verb}Request` envelope as body.
pub(super) fn xml_request(
    ctx: &CallContext<'_>,
    namespace: &str,
    params: &Map<String, Value>,
) -> Result<PreparedRequest> {
    let url = ctx.config.base_url()?;
    let body = envelope(ctx.verb, namespace, &map_to_xml(params)?);

    let mut request = ctx.new_request(Method::Post, url);
    request.push_header("Content-Type", "text/xml");
    request.body = body.into_bytes();
    Ok(request)
}

/// Pushes `name: value` when the config key is set.
pub(super) fn push_config_header(
    request: &mut PreparedRequest,
    config: &Config,
    name: &str,
    key: &str,
) {
    if let Some(value) = config.get_str(key) {
        request.push_header(name, value);
    }
}

fn field<'a>(node: &'a ReplyNode, key: &str) -> &'a str {
    node[key].as_str().unwrap_or_default()
}

/// Reads `Errors` elements of the Trading and Shopping APIs.
///
/// Errors only count when `Ack` is `Failure`; warnings are always kept.
pub(super) fn errors_elements(response: &Response) -> BodyMessages {
    let mut messages = BodyMessages::default();

    for error in response.reply()["Errors"].iter() {
        let severity = field(error, "SeverityCode");
        let code = field(error, "ErrorCode");
        let message = format!(
            "Class: {}, Severity: {severity}, Code: {code}, {} {}",
            field(error, "ErrorClassification"),
            field(error, "ShortMessage"),
            field(error, "LongMessage"),
        );
        let message = message.trim_end().to_owned();

        messages.add_code(code);
        if severity == "Warning" {
            messages.warnings.push(message);
        } else {
            messages.errors.push(message);
        }
    }

    if response.ack() != Some(Ack::Failure) {
        messages.errors.clear();
    }
    messages
}

/// Reads `errorMessage.error` elements of the Finding and Merchandising APIs.
///
/// Errors only count when `ack` is `Failure`; warnings are always kept.
pub(super) fn error_message_elements(response: &Response) -> BodyMessages {
    let mut messages = BodyMessages::default();

    for error in response.reply()["errorMessage"]["error"].iter() {
        let severity = field(error, "severity");
        let code = field(error, "errorId");
        let message = format!(
            "Domain: {}, Severity: {severity}, errorId: {code}, {}",
            field(error, "domain"),
            field(error, "message"),
        );

        messages.add_code(code);
        if severity == "Warning" {
            messages.warnings.push(message);
        } else {
            messages.errors.push(message);
        }
    }

    if response.ack() != Some(Ack::Failure) {
        messages.errors.clear();
    }
    messages
}

/// Prefixes every path with `{verb}Response.`.
pub(super) fn response_paths<'a>(
    verb: &'a str,
    paths: &'a [&'a str],
) -> impl Iterator<Item = String> + 'a {
    paths.iter().map(move |path| format!("{verb}Response.{path}"))
}
