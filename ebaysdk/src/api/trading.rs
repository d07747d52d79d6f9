//! Trading API.
//!
//! Seller and buyer account operations.
//! <https://developer.ebay.com/Devzone/XML/docs/Reference/eBay/index.html>
//!
//! Any PascalCase call name is accepted, since the Trading API grows new
//! calls faster than a fixed list could track.
//!
//! # Authentication
//!
//! - `iaf_token` set: sent as the `X-EBAY-API-IAF-TOKEN` header.
//! - otherwise `token` set: injected as `RequesterCredentials/eBayAuthToken`,
//!   unless the parameters already carry `RequesterCredentials`.

use serde_json::{Map, json};

use super::{
    Api, CallContext,
    legacy::{errors_elements, push_config_header, response_paths, xml_request},
};
use crate::{
    config::Config,
    error::{EbayError, Result},
    request::PreparedRequest,
    response::{BodyMessages, NodeRules, PayloadFormat, Response},
};

/// XML namespace of Trading requests.
pub const NAMESPACE: &str = "urn:ebay:apis:eBLBaseComponents";

const CREDENTIALS_KEY: &str = "RequesterCredentials";

const DATETIME_NODES: &[&str] = &[
    "actualdeliverytime",
    "actualshipmenttime",
    "createddate",
    "createdtime",
    "creationdate",
    "creationtime",
    "endtime",
    "expirationtime",
    "hardexpirationtime",
    "lastmodifieddate",
    "lastmodifiedtime",
    "paidtime",
    "paymenttime",
    "registrationdate",
    "scheduletime",
    "shippedtime",
    "shippingservicecutofftime",
    "starttime",
    "timestamp",
    "updatetime",
    "usercreationdate",
];

const LIST_NODES: &[&str] = &[
    "Errors",
    "Fees.Fee",
    "ItemArray.Item",
    "OrderArray.Order",
    "OrderArray.Order.TransactionArray.Transaction",
    "TransactionArray.Transaction",
    "CategoryArray.Category",
    "FeedbackDetailArray.FeedbackDetail",
    "MemberMessage.MemberMessageExchange",
    "ActiveList.ItemArray.Item",
    "SoldList.OrderTransactionArray.OrderTransaction",
    "UnsoldList.ItemArray.Item",
    "Item.PictureDetails.PictureURL",
    "Item.ItemSpecifics.NameValueList",
    "Item.ItemSpecifics.NameValueList.Value",
    "Item.Variations.Variation",
    "Item.ShippingDetails.ShippingServiceOptions",
    "Item.ShippingDetails.InternationalShippingServiceOption",
    "Item.PaymentMethods",
    "Item.ShipToLocations",
    "Item.ListingDetails.ExpressItemRequirements",
    "Category.CategoryFeatures",
    "Notification",
];

/// The Trading API family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trading;

/// Returns `true` for PascalCase ASCII identifiers such as `GetItem`.
fn is_pascal_case(verb: &str) -> bool {
    let mut chars = verb.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

impl Api for Trading {
    const NAME: &'static str = "Trading";
    const DEFAULT_DOMAIN: &'static str = "api.ebay.com";
    const FORMAT: PayloadFormat = PayloadFormat::Xml;

    fn apply_defaults(&self, config: &mut Config) {
        config.set("domain", Self::DEFAULT_DOMAIN);
        config.set("uri", "/ws/api.dll");
        config.set("https", true);
        config.set("warnings", true);
        config.set("errors", true);
        config.set("siteid", "0");
        config.set("version", "1173");
        config.set("timeout", 20u64);
        config.set("debug", false);
        config.set("retries", 0u64);
        config.set(
            "doc_url",
            "https://developer.ebay.com/Devzone/XML/docs/Reference/eBay/index.html",
        );
    }

    fn check_verb(&self, verb: &str) -> Result<()> {
        if is_pascal_case(verb) {
            Ok(())
        } else {
            Err(EbayError::UnsupportedCall { api: Self::NAME, verb: verb.to_owned() })
        }
    }

    fn build_request(&self, ctx: &CallContext<'_>) -> Result<PreparedRequest> {
        let config = ctx.config;
        let iaf_token = config.get_str("iaf_token");
        let token = config.get_str("token");

        let mut request = match (&iaf_token, &token) {
            (None, Some(token)) if !ctx.params.contains_key(CREDENTIALS_KEY) => {
                let mut params = Map::with_capacity(ctx.params.len() + 1);
                params.insert(CREDENTIALS_KEY.to_owned(), json!({ "eBayAuthToken": token }));
                params.extend(ctx.params.clone());
                xml_request(ctx, NAMESPACE, &params)?
            }
            _ => xml_request(ctx, NAMESPACE, ctx.params)?,
        };

        request.push_header("X-EBAY-API-CALL-NAME", ctx.verb);
        push_config_header(&mut request, config, "X-EBAY-API-COMPATIBILITY-LEVEL", "version");
        push_config_header(&mut request, config, "X-EBAY-API-SITEID", "siteid");
        push_config_header(&mut request, config, "X-EBAY-API-DEV-NAME", "devid");
        push_config_header(&mut request, config, "X-EBAY-API-APP-NAME", "appid");
        push_config_header(&mut request, config, "X-EBAY-API-CERT-NAME", "certid");
        if let Some(iaf_token) = iaf_token {
            request.push_header("X-EBAY-API-IAF-TOKEN", iaf_token);
        }
        Ok(request)
    }

    fn node_rules(&self, verb: &str) -> NodeRules {
        NodeRules::new(DATETIME_NODES, response_paths(verb, LIST_NODES))
    }

    fn body_messages(&self, response: &Response) -> BodyMessages {
        errors_elements(response)
    }
}

/// Trading API connection.
pub type Connection = crate::connection::Connection<Trading>;
