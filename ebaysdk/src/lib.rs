//! ebaysdk: Client SDK for the eBay Web APIs
//!
//! One connection type drives five eBay API families over a shared HTTP
//! stack: the REST/JSON Browse API and the XML Finding, Shopping, Trading
//! and Merchandising APIs. Whatever the wire format, every call yields the
//! same [`Response`]: a navigable reply tree, the raw body, `status_code`,
//! `ack`, and the errors and warnings eBay reported.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Application    │  connection.execute("findItemsAdvanced", &params)
//! └────────┬─────────┘
//!          │
//! ┌────────▼────────────────────────────────────────────┐
//! │                 ebaysdk (this crate)                │
//! │  ┌────────────┐  ┌─────────────┐  ┌──────────────┐  │
//! │  │  Config    │  │  API family │  │  Response    │  │
//! │  │ (options + │─▶│ (request    │  │ (reply tree, │  │
//! │  │  YAML)     │  │  builder)   │  │  messages)   │  │
//! │  └────────────┘  └──────┬──────┘  └──────▲───────┘  │
//! │                  ┌──────▼──────────────────┴──────┐ │
//! │                  │  HTTP transport (+ retries)    │ │
//! │                  └──────┬─────────────────────────┘ │
//! └─────────────────────────┼───────────────────────────┘
//!                           │ HTTPS
//!                  ┌────────▼────────┐
//!                  │  eBay endpoint  │
//!                  └─────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Search with the Finding API
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, finding};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! // Credentials come from the options or from the `ebay.yaml` file
//! let mut api = finding::Connection::new(ConnectionOptions::new().appid("MyApp-1234"))?;
//!
//! let response = api
//!     .execute(
//!         "findItemsAdvanced",
//!         &json!({ "keywords": "legos", "paginationInput": { "entriesPerPage": 5 } }),
//!     )
//!     .await?;
//!
//! println!("ack: {:?}", response.ack());
//! for item in response.reply()["searchResult"]["item"].iter() {
//!     let id = item["itemId"].as_str().unwrap_or_default();
//!     println!("{id}: {}", item["title"].as_str().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Look up an item with the Browse API
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, auth::StaticToken, browse};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! let mut api = browse::Connection::new(ConnectionOptions::new())?
//!     .with_token_provider(StaticToken::new("application-access-token"));
//!
//! let response = api.execute("getItem", &json!({ "item_id": "v1|110551991234|0" })).await?;
//! let item = response.json()?;
//! println!("{}", item["title"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## 3. Run calls concurrently
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, Parallel, shopping};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! let api = shopping::Connection::new(ConnectionOptions::new())?;
//!
//! let mut parallel = Parallel::new().with_max_in_flight(4);
//! for id in ["110551991234", "110551995678"] {
//!     parallel.add(&api, "GetSingleItem", &json!({ "ItemID": id }))?;
//! }
//!
//! let results = parallel.wait().await;
//! println!("{} ok, error: {:?}", results.successes().count(), results.error());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Settings are merged with this precedence: explicit [`ConnectionOptions`],
//! then the domain's section of the YAML file (`ebay.yaml` by default, looked
//! up as given, then under `$HOME`, then `/etc`), then the family defaults.
//! See [`config`] for the recognized keys.
//!
//! # Module Organization
//!
//! - [`api`]: the API families and the [`Api`](api::Api) trait they implement
//! - [`connection`]: [`Connection`], the per-family call pipeline
//! - [`parallel`]: [`Parallel`], bounded concurrent execution
//! - [`config`]: option and YAML merging
//! - [`request`]: prepared requests and the XML/query encoders
//! - [`response`]: [`Response`] and the reply tree
//! - [`transport`]: HTTP transport abstraction
//! - [`reliability`]: retry with exponential backoff
//! - [`auth`]: access token providers
//! - [`error`]: error types
//!
//! # Error Handling
//!
//! All operations return [`Result<T, EbayError>`](error::Result). A call
//! that reached eBay but failed keeps its response:
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, EbayError, trading};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! let mut api = trading::Connection::new(ConnectionOptions::new())?;
//!
//! match api.execute("GetItem", &json!({ "ItemID": "1" })).await {
//!     Ok(response) => println!("{:?}", response.ack()),
//!     Err(EbayError::ConnectionError { message, response }) => {
//!         eprintln!("{message}");
//!         if let Some(response) = response {
//!             eprintln!("codes: {:?}", response.response_codes());
//!         }
//!     }
//!     Err(EbayError::UnsupportedCall { api, verb }) => eprintln!("{api} has no call {verb}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and mockito"
)]

pub mod api;
pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod parallel;
pub mod reliability;
pub mod request;
pub mod response;
pub mod transport;

pub use api::{browse, finding, merchandising, shopping, trading};
pub use config::{Config, ConnectionOptions};
pub use connection::{CallOptions, Connection};
pub use error::{EbayError, Result};
pub use parallel::{Parallel, ParallelResults};
pub use response::{Ack, ReplyNode, Response};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<EbayError>;
        let _ = std::marker::PhantomData::<finding::Connection>;
        let _ = std::marker::PhantomData::<ParallelResults>;
    }
}
