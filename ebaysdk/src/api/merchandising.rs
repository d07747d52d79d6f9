//! Merchandising API.
//!
//! Item and product recommendations.
//! <https://developer.ebay.com/Devzone/merchandising/docs/CallRef/index.html>

use super::{
    Api, CallContext,
    finding::{apply_soa_defaults, push_soa_headers},
    legacy::{error_message_elements, response_paths, xml_request},
};
use crate::{
    config::Config,
    error::{EbayError, Result},
    request::PreparedRequest,
    response::{BodyMessages, NodeRules, PayloadFormat, Response},
};

/// XML namespace of Merchandising requests.
pub const NAMESPACE: &str = "http://www.ebay.com/marketplace/services";

/// Operations of the Merchandising service.
pub const CALLS: &[&str] = &[
    "getDeals",
    "getMostWatchedItems",
    "getRelatedCategoryItems",
    "getSimilarItems",
    "getTopSellingProducts",
    "getVersion",
];

const DATETIME_NODES: &[&str] = &["endtime", "timestamp"];

const LIST_NODES: &[&str] = &[
    "errorMessage.error",
    "itemRecommendations.item",
    "productRecommendations.product",
];

/// The Merchandising API family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Merchandising;

impl Api for Merchandising {
    const NAME: &'static str = "Merchandising";
    const DEFAULT_DOMAIN: &'static str = "svcs.ebay.com";
    const FORMAT: PayloadFormat = PayloadFormat::Xml;

    fn apply_defaults(&self, config: &mut Config) {
        apply_soa_defaults(config, Self::DEFAULT_DOMAIN);
        config.set("uri", "/MerchandisingService");
        config.set("version", "1.5.0");
        config.set("service", "MerchandisingService");
        config.set(
            "doc_url",
            "https://developer.ebay.com/Devzone/merchandising/docs/CallRef/index.html",
        );
    }

    fn check_verb(&self, verb: &str) -> Result<()> {
        if CALLS.contains(&verb) {
            Ok(())
        } else {
            Err(EbayError::UnsupportedCall { api: Self::NAME, verb: verb.to_owned() })
        }
    }

    fn build_request(&self, ctx: &CallContext<'_>) -> Result<PreparedRequest> {
        let mut request = xml_request(ctx, NAMESPACE, ctx.params)?;
        push_soa_headers(&mut request, ctx, "EBAY-SOA-CONSUMER-ID");
        Ok(request)
    }

    fn node_rules(&self, verb: &str) -> NodeRules {
        NodeRules::new(DATETIME_NODES, response_paths(verb, LIST_NODES))
    }

    fn body_messages(&self, response: &Response) -> BodyMessages {
        error_message_elements(response)
    }
}

/// Merchandising API connection.
pub type Connection = crate::connection::Connection<Merchandising>;
