//! Finding API.
//!
//! Item search across eBay sites.
//! <https://developer.ebay.com/Devzone/finding/CallRef/index.html>
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, finding};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! let mut api = finding::Connection::new(ConnectionOptions::new().appid("MyApp-1234"))?;
//! let response = api.execute("findItemsAdvanced", &json!({ "keywords": "legos" })).await?;
//!
//! for item in response.reply()["searchResult"]["item"].iter() {
//!     println!("{}", item["title"].as_str().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use super::{
    Api, CallContext,
    legacy::{error_message_elements, push_config_header, response_paths, xml_request},
};
use crate::{
    config::Config,
    error::{EbayError, Result},
    request::PreparedRequest,
    response::{BodyMessages, NodeRules, PayloadFormat, Response},
};

/// XML namespace of Finding requests.
pub const NAMESPACE: &str = "http://www.ebay.com/marketplace/search/v1/services";

/// Operations of the Finding service.
pub const CALLS: &[&str] = &[
    "findCompletedItems",
    "findItemsAdvanced",
    "findItemsByCategory",
    "findItemsByImage",
    "findItemsByKeywords",
    "findItemsByProduct",
    "findItemsIneBayStores",
    "getHistograms",
    "getSearchKeywordsRecommendation",
    "getVersion",
];

const DATETIME_NODES: &[&str] = &["starttimefrom", "timestamp", "starttime", "endtime"];

const LIST_NODES: &[&str] = &[
    "searchResult.item",
    "errorMessage.error",
    "itemSearchURL",
    "searchResult.item.galleryInfoContainer.galleryURL",
    "searchResult.item.paymentMethod",
    "searchResult.item.shippingInfo.shipToLocations",
    "searchResult.item.discountPriceInfo",
    "aspectHistogramContainer.aspect",
    "aspectHistogramContainer.aspect.valueHistogram",
    "categoryHistogramContainer.categoryHistogram",
    "categoryHistogramContainer.categoryHistogram.childCategoryHistogram",
    "conditionHistogramContainer.conditionHistogram",
];

/// The Finding API family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Finding;

impl Api for Finding {
    const NAME: &'static str = "Finding";
    const DEFAULT_DOMAIN: &'static str = "svcs.ebay.com";
    const FORMAT: PayloadFormat = PayloadFormat::Xml;

    fn apply_defaults(&self, config: &mut Config) {
        apply_soa_defaults(config, Self::DEFAULT_DOMAIN);
        config.set("uri", "/services/search/FindingService/v1");
        config.set("version", "1.12.0");
        config.set("service", "FindingService");
        config.set("doc_url", "https://developer.ebay.com/Devzone/finding/CallRef/index.html");
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
        push_soa_headers(&mut request, ctx, "X-EBAY-SOA-SECURITY-APPNAME");
        Ok(request)
    }

    fn node_rules(&self, verb: &str) -> NodeRules {
        NodeRules::new(DATETIME_NODES, response_paths(verb, LIST_NODES))
    }

    fn body_messages(&self, response: &Response) -> BodyMessages {
        error_message_elements(response)
    }
}

/// Defaults shared by the SOA-style services (Finding and Merchandising).
pub(super) fn apply_soa_defaults(config: &mut Config, domain: &str) {
    config.set("domain", domain);
    config.set("https", true);
    config.set("warnings", true);
    config.set("errors", true);
    config.set("siteid", "EBAY-US");
    config.set("timeout", 20u64);
    config.set("debug", false);
    config.set("retries", 0u64);
}

/// Adds the `X-EBAY-SOA-*` headers; `appid_header` names the app id header.
pub(super) fn push_soa_headers(
    request: &mut PreparedRequest,
    ctx: &CallContext<'_>,
    appid_header: &str,
) {
    let config = ctx.config;
    push_config_header(request, config, "X-EBAY-SOA-SERVICE-NAME", "service");
    push_config_header(request, config, "X-EBAY-SOA-SERVICE-VERSION", "version");
    push_config_header(request, config, appid_header, "appid");
    push_config_header(request, config, "X-EBAY-SOA-GLOBAL-ID", "siteid");
    request.push_header("X-EBAY-SOA-OPERATION-NAME", ctx.verb);
    request.push_header("X-EBAY-SOA-REQUEST-DATA-FORMAT", "XML");
}

/// Finding API connection.
pub type Connection = crate::connection::Connection<Finding>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        api::test_support::{config_for, context, params},
        config::ConnectionOptions,
        request::Method,
    };

    #[test]
    fn test_defaults() {
        let config = config_for(&Finding, ConnectionOptions::new());
        assert_eq!(config.get_str("domain").as_deref(), Some("svcs.ebay.com"));
        assert_eq!(config.get_str("uri").as_deref(), Some("/services/search/FindingService/v1"));
        assert_eq!(config.get_str("siteid").as_deref(), Some("EBAY-US"));
        assert_eq!(config.get_str("version").as_deref(), Some("1.12.0"));
    }

    #[test]
    fn test_check_verb() {
        assert!(Finding.check_verb("findItemsAdvanced").is_ok());
        let err = Finding.check_verb("GetItem").unwrap_err();
        assert!(matches!(err, EbayError::UnsupportedCall { api: "Finding", .. }));
    }

    #[test]
    fn test_build_request() {
        let config = config_for(&Finding, ConnectionOptions::new().appid("app-1"));
        let params =
            params(json!({ "keywords": "legos", "paginationInput": { "entriesPerPage": 2 } }));
        let request =
            Finding.build_request(&context("findItemsAdvanced", &params, &config, None)).unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "https://svcs.ebay.com/services/search/FindingService/v1");
        assert_eq!(request.header("X-EBAY-SOA-OPERATION-NAME"), Some("findItemsAdvanced"));
        assert_eq!(request.header("X-EBAY-SOA-SECURITY-APPNAME"), Some("app-1"));
        assert_eq!(request.header("X-EBAY-SOA-SERVICE-NAME"), Some("FindingService"));
        assert_eq!(request.header("X-EBAY-SOA-GLOBAL-ID"), Some("EBAY-US"));
        assert_eq!(request.header("Content-Type"), Some("text/xml"));
        assert_eq!(request.header("X-EBAY-SDK-REQUEST-ID"), Some("test-request-id"));
        assert_eq!(
            request.body_text(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><findItemsAdvancedRequest \
             xmlns=\"http://www.ebay.com/marketplace/search/v1/services\"><keywords>legos</keywords>\
             <paginationInput><entriesPerPage>2</entriesPerPage></paginationInput></findItemsAdvancedRequest>"
        );
    }

    #[test]
    fn test_build_request_without_appid_omits_header() {
        let config = config_for(&Finding, ConnectionOptions::new());
        let params = params(json!({}));
        let request =
            Finding.build_request(&context("getVersion", &params, &config, None)).unwrap();
        assert!(request.header("X-EBAY-SOA-SECURITY-APPNAME").is_none());
    }

    #[test]
    fn test_invalid_parameter() {
        let config = config_for(&Finding, ConnectionOptions::new());
        let params = params(json!({ "bad key": 1 }));
        let result = Finding.build_request(&context("getVersion", &params, &config, None));
        assert!(matches!(result, Err(EbayError::InvalidParameter(_))));
    }

    #[test]
    fn test_node_rules_are_scoped_to_the_call() {
        let rules = Finding.node_rules("findItemsByKeywords");
        let xml = b"<findItemsByKeywordsResponse><searchResult><item><title>a</title></item></searchResult></findItemsByKeywordsResponse>";
        let (_, node) = crate::response::xml::parse(xml, &rules).unwrap();
        assert_eq!(node["searchResult"]["item"][0]["title"].as_str(), Some("a"));
    }
}
