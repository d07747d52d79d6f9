//! Concurrent Browse searches with partial failures.
//!
//! Queues one search per argument, runs them with at most three requests in
//! flight, and reports each slot in input order.
//!
//! # Running this example
//!
//! ```bash
//! export EBAY_TOKEN=<OAuth application token>
//! cargo run --example browse_parallel -- "rust book" "mechanical keyboard" "lego"
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::env;

use ebaysdk::{ConnectionOptions, Parallel, auth::StaticToken, browse};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = env::var("EBAY_TOKEN").map_err(|_| "EBAY_TOKEN environment variable not set")?;
    let mut queries = env::args().skip(1).collect::<Vec<_>>();
    if queries.is_empty() {
        queries = vec!["rust book".to_owned(), "lego".to_owned()];
    }

    let api = browse::Connection::new(ConnectionOptions::new().without_config_file())?
        .with_token_provider(StaticToken::new(token));

    let mut parallel = Parallel::new().with_max_in_flight(3);
    for query in &queries {
        parallel.add(&api, "search", &json!({ "q": query, "limit": 3 }))?;
    }

    let results = parallel.wait().await;
    for (query, result) in queries.iter().zip(&results) {
        match result {
            Ok(response) => {
                let reply = response.reply();
                println!("{query}: {} results", reply["total"].as_i64().unwrap_or(0));
                for item in reply["itemSummaries"].as_list().unwrap_or_default() {
                    println!("  {}", item["title"].as_str().unwrap_or("-"));
                }
            }
            Err(e) => println!("{query}: failed: {e}"),
        }
    }

    if let Some(errors) = results.error() {
        eprintln!("{} of {} searches failed:\n{errors}", results.failures().count(), results.len());
    }
    Ok(())
}
