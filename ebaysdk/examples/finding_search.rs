//! Keyword search through the Finding API.
//!
//! Prints title, price and end time of each hit, then the paging summary.
//!
//! # Running this example
//!
//! ```bash
//! export EBAY_APPID=MyApp-1234-...
//! cargo run --example finding_search -- "vintage camera"
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::env;

use ebaysdk::{CallOptions, ConnectionOptions, finding};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let appid = env::var("EBAY_APPID").map_err(|_| "EBAY_APPID environment variable not set")?;
    let keywords = env::args().nth(1).unwrap_or_else(|| "vintage camera".to_owned());

    let options = ConnectionOptions::new().without_config_file().appid(appid).siteid("EBAY-US");
    let mut api = finding::Connection::new(options)?;

    let params = json!({
        "keywords": keywords,
        "itemFilter": [
            { "name": "Condition", "value": "Used" },
            { "name": "LocatedIn", "value": "US" }
        ],
        "sortOrder": "PricePlusShippingLowest",
        "paginationInput": { "entriesPerPage": 10 }
    });
    // per-call list nodes add to the built-in Finding rules
    let call_options =
        CallOptions::new().list_node("findItemsAdvancedResponse.searchResult.item.primaryCategory");

    let response = api.execute_with("findItemsAdvanced", &params, &call_options).await?;
    let reply = response.reply();

    println!("ack: {:?}, {} ms", response.ack(), response.elapsed().as_millis());
    for item in reply["searchResult"]["item"].as_list().unwrap_or_default() {
        let price = &item["sellingStatus"]["currentPrice"];
        println!(
            "{:<60} {:>8} {} ends {}",
            item["title"].as_str().unwrap_or("-"),
            price["value"].as_str().unwrap_or("?"),
            price["_currencyId"].as_str().unwrap_or(""),
            item["listingInfo"]["endTime"]
                .as_datetime()
                .map_or_else(|| "?".to_owned(), |t| t.to_rfc3339()),
        );
    }

    let pages = &reply["paginationOutput"];
    println!(
        "page {} of {}, {} entries",
        pages["pageNumber"].as_str().unwrap_or("?"),
        pages["totalPages"].as_str().unwrap_or("?"),
        pages["totalEntries"].as_str().unwrap_or("?"),
    );
    Ok(())
}
