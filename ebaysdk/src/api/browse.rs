//! Browse API.
//!
//! REST/JSON item search and lookup.
//! <https://developer.ebay.com/api-docs/buy/browse/overview.html>
//!
//! Every call needs an OAuth application token, supplied by a
//! [`TokenProvider`](crate::auth::TokenProvider) attached to the connection
//! or the `token` config key.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, auth::StaticToken, browse};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! let mut api = browse::Connection::new(ConnectionOptions::new())?
//!     .with_token_provider(StaticToken::new("v^1.1#i^1#..."));
//! let response = api.execute("search", &json!({ "q": "drone", "limit": 3 })).await?;
//!
//! for item in response.reply()["itemSummaries"].iter() {
//!     println!("{}", item["title"].as_str().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use serde_json::{Map, Value};
use url::Url;

use super::{Api, CallContext};
use crate::{
    config::Config,
    error::{EbayError, Result},
    request::{
        Method, PreparedRequest,
        query::{append_query, query_pairs, scalar_to_string},
    },
    response::{BodyMessages, NodeRules, PayloadFormat, ReplyNode, Response},
};

const ITEM_ID: &str = "item_id";

/// Calls of the Browse API with their method and path below the base uri.
///
/// `{item_id}` is replaced by the percent-encoded `item_id` parameter.
pub const CALLS: &[(&str, Method, &str)] = &[
    ("search", Method::Get, "item_summary/search"),
    ("searchByImage", Method::Post, "item_summary/search_by_image"),
    ("getItem", Method::Get, "item/{item_id}"),
    ("getItemByLegacyId", Method::Get, "item/get_item_by_legacy_id"),
    ("getItems", Method::Get, "item/"),
    ("getItemsByItemGroup", Method::Get, "item/get_items_by_item_group"),
    ("checkCompatibility", Method::Post, "item/{item_id}/check_compatibility"),
];

/// The Browse API family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Browse;

fn lookup(verb: &str) -> Option<(Method, &'static str)> {
    CALLS.iter().find(|(name, ..)| *name == verb).map(|&(_, method, path)| (method, path))
}

/// Reads `item_id` as a string or number.
fn item_id(params: &Map<String, Value>, verb: &str) -> Result<String> {
    match params.get(ITEM_ID) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(EbayError::InvalidParameter(format!("{ITEM_ID} is required for {verb}"))),
    }
}

/// Appends `path` to the base url, one encoded segment at a time.
fn join_path(mut url: Url, path: &str, item_id: Option<&str>) -> Result<Url> {
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| EbayError::Config("base url cannot carry a path".to_owned()))?;
        segments.pop_if_empty();
        for segment in path.split('/') {
            match (segment, item_id) {
                ("{item_id}", Some(id)) => segments.push(id),
                _ => segments.push(segment),
            };
        }
    }
    Ok(url)
}

fn field(node: &ReplyNode, key: &str) -> String {
    scalar_to_string(&node[key].to_value())
}

impl Api for Browse {
    const NAME: &'static str = "Browse";
    const DEFAULT_DOMAIN: &'static str = "api.ebay.com";
    const FORMAT: PayloadFormat = PayloadFormat::Json;
    const USES_ACCESS_TOKEN: bool = true;

    fn apply_defaults(&self, config: &mut Config) {
        config.set("domain", Self::DEFAULT_DOMAIN);
        config.set("uri", "/buy/browse/v1");
        config.set("https", true);
        config.set("warnings", true);
        config.set("errors", true);
        config.set("siteid", "EBAY_US");
        config.set("version", "v1");
        config.set("service", "BrowseAPI");
        config.set("timeout", 20u64);
        config.set("debug", false);
        config.set("retries", 0u64);
        config.set("doc_url", "https://developer.ebay.com/api-docs/buy/browse/overview.html");
    }

    fn check_verb(&self, verb: &str) -> Result<()> {
        match lookup(verb) {
            Some(_) => Ok(()),
            None => Err(EbayError::UnsupportedCall { api: Self::NAME, verb: verb.to_owned() }),
        }
    }

    fn build_request(&self, ctx: &CallContext<'_>) -> Result<PreparedRequest> {
        let (method, path) = lookup(ctx.verb).ok_or_else(|| EbayError::UnsupportedCall {
            api: Self::NAME,
            verb: ctx.verb.to_owned(),
        })?;
        let token = ctx.access_token.ok_or_else(|| {
            EbayError::Auth(format!(
                "{} requires an OAuth access token; attach a token provider or set `token`",
                ctx.verb
            ))
        })?;

        let id =
            if path.contains("{item_id}") { Some(item_id(ctx.params, ctx.verb)?) } else { None };
        let skip: &[&str] = if id.is_some() { &[ITEM_ID] } else { &[] };
        let mut url = join_path(ctx.config.base_url()?, path, id.as_deref())?;

        let body = match method {
            Method::Get => {
                append_query(&mut url, &query_pairs(ctx.params, skip)?);
                Vec::new()
            }
            Method::Post => {
                let mut body = ctx.params.clone();
                for key in skip {
                    body.remove(*key);
                }
                serde_json::to_vec(&body)?
            }
        };

        let mut request = ctx.new_request(method, url);
        request.push_header("Content-Type", "application/json");
        request.push_header("Accept", "application/json");
        request.push_header("Authorization", format!("Bearer {token}"));
        let marketplace = ctx.config.get_str("siteid").unwrap_or_else(|| "EBAY_US".to_owned());
        request.push_header("X-EBAY-C-MARKETPLACE-ID", marketplace);
        request.body = body;
        Ok(request)
    }

    fn node_rules(&self, _verb: &str) -> NodeRules {
        NodeRules::default()
    }

    /// Reads `errors[]` and `warnings[]`; only `200` bodies are inspected.
    fn body_messages(&self, response: &Response) -> BodyMessages {
        let mut messages = BodyMessages::default();
        if response.status_code() != 200 {
            return messages;
        }

        let reply = response.reply();
        let mut codes = Vec::new();
        for (key, target) in
            [("errors", &mut messages.errors), ("warnings", &mut messages.warnings)]
        {
            for entry in reply[key].iter() {
                let code = field(entry, "errorId");
                target.push(format!(
                    "Category: {}, Code: {code}, {}",
                    field(entry, "category"),
                    field(entry, "message"),
                ));
                codes.push(code);
            }
        }
        for code in codes {
            messages.add_code(code);
        }
        messages
    }
}

/// Browse API connection.
pub type Connection = crate::connection::Connection<Browse>;
