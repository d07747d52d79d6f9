//! Trading API call with error inspection.
//!
//! Calls `GeteBayOfficialTime`, then `GetItem` for an item id given on the
//! command line, showing how API-reported failures surface as
//! [`EbayError::ConnectionError`] while still carrying the reply.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example trading_errors -- 110552341234
//! ```
//!
//! Credentials come from `ebay.yaml` in the working directory or the home
//! directory.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::env;

use ebaysdk::{ConnectionOptions, EbayError, trading};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let item_id = env::args().nth(1).unwrap_or_else(|| "1".to_owned());
    let mut api = trading::Connection::new(ConnectionOptions::new())?;

    let response = api.execute("GeteBayOfficialTime", &json!({})).await?;
    println!(
        "official time: {}",
        response.reply()["Timestamp"].as_datetime().map_or_else(String::new, |t| t.to_rfc3339())
    );

    match api.execute("GetItem", &json!({ "ItemID": item_id })).await {
        Ok(response) => {
            println!("title: {}", response.reply()["Item"]["Title"].as_str().unwrap_or("-"));
        }
        Err(EbayError::ConnectionError { message, response: Some(response) }) => {
            println!("call failed: {message}");
            println!("  status: {} {}", response.status_code(), response.reason());
            println!("  ack: {:?}", response.ack());
            for code in response.response_codes() {
                println!("  code: {code}");
            }
        }
        Err(e) => return Err(e.into()),
    }

    // the last reply stays available on the connection either way
    if let Some(error) = api.error() {
        eprintln!("last error: {error}");
    }
    Ok(())
}
