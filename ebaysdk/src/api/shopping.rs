//! Shopping API.
//!
//! Public item, user and category lookups.
//! <https://developer.ebay.com/Devzone/shopping/docs/CallRef/index.html>
//!
//! Requests carry the OAuth application token as `X-EBAY-API-IAF-TOKEN`
//! when a token provider is attached or the `token` key is set.

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

/// XML namespace of Shopping requests.
pub const NAMESPACE: &str = "urn:ebay:apis:eBLBaseComponents";

/// Calls of the Shopping API.
pub const CALLS: &[&str] = &[
    "FindHalfProducts",
    "FindPopularItems",
    "FindPopularSearches",
    "FindProducts",
    "FindReviewsAndGuides",
    "GetCategoryInfo",
    "GeteBayTime",
    "GetItemStatus",
    "GetMultipleItems",
    "GetShippingCosts",
    "GetSingleItem",
    "GetUserProfile",
];

const DATETIME_NODES: &[&str] = &[
    "birthdate",
    "creationtime",
    "enddate",
    "endtime",
    "estimateddeliverymaxtime",
    "estimateddeliverymintime",
    "lastmodifieddate",
    "modtime",
    "registrationdate",
    "starttime",
    "timestamp",
    "updatetime",
];

const LIST_NODES: &[&str] = &[
    "Errors",
    "Item",
    "Product",
    "Item.PictureURL",
    "Item.PaymentMethods",
    "Item.ShipToLocations",
    "Item.ItemSpecifics.NameValueList",
    "Item.ItemSpecifics.NameValueList.Value",
    "Item.Variations.Variation",
    "Item.Variations.Pictures.VariationSpecificPictureSet",
    "CategoryArray.Category",
    "ItemArray.Item",
    "ShippingDetails.ShippingServiceOption",
    "ShippingDetails.InternationalShippingServiceOption",
    "FeedbackHistory.BidRetractionFeedbackPeriods.BidRetractionFeedbackPeriod",
    "ReviewsAndGuides.BuyingGuideDetails.BuyingGuide",
    "ItemSearchResult.ItemArray.Item",
    "PopularSearchResult",
];

/// Calls whose reply holds a single `Item`.
const SINGLE_ITEM_CALLS: &[&str] = &["GetSingleItem"];

/// The Shopping API family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shopping;

impl Api for Shopping {
    const NAME: &'static str = "Shopping";
    const DEFAULT_DOMAIN: &'static str = "open.api.ebay.com";
    const FORMAT: PayloadFormat = PayloadFormat::Xml;
    const USES_ACCESS_TOKEN: bool = true;

    fn apply_defaults(&self, config: &mut Config) {
        config.set("domain", Self::DEFAULT_DOMAIN);
        config.set("uri", "/shopping");
        config.set("https", true);
        config.set("warnings", true);
        config.set("errors", true);
        config.set("siteid", "0");
        config.set("version", "1199");
        config.set("timeout", 20u64);
        config.set("debug", false);
        config.set("retries", 0u64);
        config.set("doc_url", "https://developer.ebay.com/Devzone/shopping/docs/CallRef/index.html");
    }

    fn check_verb(&self, verb: &str) -> Result<()> {
        if CALLS.contains(&verb) {
            Ok(())
        } else {
            Err(EbayError::UnsupportedCall { api: Self::NAME, verb: verb.to_owned() })
        }
    }

    fn build_request(&self, ctx: &CallContext<'_>) -> Result<PreparedRequest> {
        let config = ctx.config;
        let mut request = xml_request(ctx, NAMESPACE, ctx.params)?;

        request.push_header("X-EBAY-API-CALL-NAME", ctx.verb);
        push_config_header(&mut request, config, "X-EBAY-API-VERSION", "version");
        push_config_header(&mut request, config, "X-EBAY-API-APP-ID", "appid");
        push_config_header(&mut request, config, "X-EBAY-API-SITE-ID", "siteid");
        request.push_header("X-EBAY-API-REQUEST-ENCODING", "XML");
        if let Some(token) = ctx.access_token {
            request.push_header("X-EBAY-API-IAF-TOKEN", token);
        }
        Ok(request)
    }

    fn node_rules(&self, verb: &str) -> NodeRules {
        let lists = LIST_NODES
            .iter()
            .filter(|path| !(SINGLE_ITEM_CALLS.contains(&verb) && **path == "Item"))
            .copied()
            .collect::<Vec<_>>();
        NodeRules::new(DATETIME_NODES, response_paths(verb, &lists).collect::<Vec<_>>())
    }

    fn body_messages(&self, response: &Response) -> BodyMessages {
        errors_elements(response)
    }
}

/// Shopping API connection.
pub type Connection = crate::connection::Connection<Shopping>;
