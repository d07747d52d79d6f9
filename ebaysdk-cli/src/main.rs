//! `ebay` - command-line client for the eBay Finding, Shopping, Trading,
//! Merchandising and Browse APIs.
//!
//! Every command prints the normalized reply as JSON on stdout. Logs and
//! error messages go to stderr.
//!
//! ```text
//! ebay --appid MyApp-1234 search "vintage camera" --limit 5
//! ebay --token $OAUTH find "python books" "rust books" --limit 3
//! ebay --token $OAUTH item "v1|110552341234|0"
//! ebay call trading GeteBayOfficialTime
//! ebay call finding findItemsAdvanced --params '{"keywords":"lego"}' \
//!     --list-node findItemsAdvancedResponse.searchResult.item
//! ```

#![allow(
    clippy::multiple_crate_versions,
    reason = "Transitive dependency version conflicts outside our control"
)]

mod observability;

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use ebaysdk::{
    CallOptions, Connection, ConnectionOptions, EbayError, Parallel, Response,
    api::{Api, Browse, Finding, Merchandising, Shopping, Trading},
};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::observability::{LogFormat, init_observability};

/// Writes a line to stdout, ending quietly when the reader hangs up.
macro_rules! safe_println {
    ($($arg:tt)*) => {{
        if let Err(e) = writeln!(io::stdout(), $($arg)*) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(EbayError::Config(format!("cannot write output: {e}")));
        }
    }};
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Call the eBay APIs from the command line")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// YAML defaults file
    #[arg(short = 'y', long, global = true, env = "EBAY_YAML", default_value = "ebay.yaml")]
    yaml: PathBuf,

    /// Skip the YAML defaults file
    #[arg(long, global = true, conflicts_with = "yaml")]
    no_yaml: bool,

    /// Application id
    #[arg(short = 'a', long, global = true, env = "EBAY_APPID")]
    appid: Option<String>,

    /// Certificate id
    #[arg(short = 'c', long, global = true, env = "EBAY_CERTID")]
    certid: Option<String>,

    /// Developer id
    #[arg(long, global = true, env = "EBAY_DEVID")]
    devid: Option<String>,

    /// Auth'n'Auth token (Trading) or OAuth access token (Shopping, Browse)
    #[arg(short = 't', long, global = true, env = "EBAY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API host, e.g. api.sandbox.ebay.com
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Site or marketplace id, e.g. EBAY-US or EBAY_GB
    #[arg(long, global = true)]
    siteid: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Extra attempts for transient failures
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Print the reply even when the API reports errors
    #[arg(long, global = true)]
    no_errors: bool,

    /// Log request and response details
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keyword search through the Finding API (findItemsAdvanced)
    Search {
        /// Search keywords
        keywords: String,

        /// Results per page
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: u32,

        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Sort order, e.g. PricePlusShippingLowest
        #[arg(long)]
        sort: Option<String>,
    },

    /// Keyword search through the Browse API; several queries run concurrently
    Find {
        /// One or more search queries
        #[arg(required = true)]
        queries: Vec<String>,

        /// Results per query
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: u32,

        /// Browse filter expression, e.g. "conditionIds:{1000}"
        #[arg(long)]
        filter: Option<String>,

        /// Concurrent requests
        #[arg(long, default_value_t = 4)]
        max_in_flight: usize,
    },

    /// Fetch a single item
    Item {
        /// Browse item id (v1|...|0), or legacy item id with --via shopping
        item_id: String,

        /// API used for the lookup
        #[arg(long, value_enum, default_value_t = ItemSource::Browse)]
        via: ItemSource,
    },

    /// Run any call of any API with JSON parameters
    Call {
        /// API family
        #[arg(value_enum)]
        api: Family,

        /// Call name, e.g. findItemsAdvanced or GetItem
        verb: String,

        /// Call parameters as a JSON object
        #[arg(short = 'p', long, default_value = "{}")]
        params: String,

        /// Element path that must always parse as a list
        #[arg(long = "list-node")]
        list_nodes: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ItemSource {
    Browse,
    Shopping,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    Finding,
    Shopping,
    Trading,
    Merchandising,
    Browse,
}

impl GlobalArgs {
    fn options(&self) -> ConnectionOptions {
        let mut options = ConnectionOptions::new();
        options = if self.no_yaml {
            options.without_config_file()
        } else {
            options.config_file(self.yaml.clone())
        };

        if let Some(appid) = &self.appid {
            options = options.appid(appid.as_str());
        }
        if let Some(certid) = &self.certid {
            options = options.certid(certid.as_str());
        }
        if let Some(devid) = &self.devid {
            options = options.devid(devid.as_str());
        }
        if let Some(token) = &self.token {
            options = options.token(token.as_str());
        }
        if let Some(domain) = &self.domain {
            options = options.domain(domain.as_str());
        }
        if let Some(siteid) = &self.siteid {
            options = options.siteid(siteid.as_str());
        }
        if let Some(timeout) = self.timeout {
            options = options.timeout(Duration::from_secs(timeout));
        }
        if let Some(retries) = self.retries {
            options = options.retries(retries);
        }
        if self.no_errors {
            options = options.errors(false);
        }
        if self.debug {
            options = options.debug(true);
        }
        options
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = if cli.global.debug { cli.global.verbose.max(2) } else { cli.global.verbose };
    init_observability(LogFormat::from_env(), verbosity);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, EbayError> {
    let options = cli.global.options();

    match cli.command {
        Command::Search { keywords, limit, page, sort } => {
            let mut params = json!({
                "keywords": keywords,
                "paginationInput": { "entriesPerPage": limit, "pageNumber": page },
            });
            if let Some(sort) = sort {
                params["sortOrder"] = Value::String(sort);
            }
            let response =
                call::<Finding>(options, "findItemsAdvanced", params, &CallOptions::new()).await?;
            print_response(&response)?;
        }
        Command::Find { queries, limit, filter, max_in_flight } => {
            return find(options, queries, limit, filter, max_in_flight).await;
        }
        Command::Item { item_id, via } => {
            let response = match via {
                ItemSource::Browse => {
                    let params = json!({ "item_id": item_id });
                    call::<Browse>(options, "getItem", params, &CallOptions::new()).await?
                }
                ItemSource::Shopping => {
                    let params = json!({ "ItemID": item_id, "IncludeSelector": "Details" });
                    call::<Shopping>(options, "GetSingleItem", params, &CallOptions::new()).await?
                }
            };
            print_response(&response)?;
        }
        Command::Call { api, verb, params, list_nodes } => {
            let params = parse_params(&params)?;
            let call_options = CallOptions::new().list_nodes_from(list_nodes);
            let response = match api {
                Family::Finding => call::<Finding>(options, &verb, params, &call_options).await?,
                Family::Shopping => call::<Shopping>(options, &verb, params, &call_options).await?,
                Family::Trading => call::<Trading>(options, &verb, params, &call_options).await?,
                Family::Merchandising => {
                    call::<Merchandising>(options, &verb, params, &call_options).await?
                }
                Family::Browse => call::<Browse>(options, &verb, params, &call_options).await?,
            };
            print_response(&response)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn call<A: Api>(
    options: ConnectionOptions,
    verb: &str,
    params: Value,
    call_options: &CallOptions,
) -> Result<Response, EbayError> {
    let api = Connection::<A>::new(options)?;
    debug!(api = A::NAME, verb, domain = api.config().domain(), "calling");
    let response = api.send_with(verb, &params, call_options).await?;
    info!(
        api = A::NAME,
        verb,
        status = response.status_code(),
        elapsed_ms = response.elapsed().as_millis(),
        "call finished"
    );
    Ok(response)
}

async fn find(
    options: ConnectionOptions,
    queries: Vec<String>,
    limit: u32,
    filter: Option<String>,
    max_in_flight: usize,
) -> Result<ExitCode, EbayError> {
    let api = Connection::<Browse>::new(options)?;
    let mut parallel = Parallel::new().with_max_in_flight(max_in_flight);
    for query in &queries {
        let mut params = json!({ "q": query, "limit": limit });
        if let Some(filter) = &filter {
            params["filter"] = Value::String(filter.clone());
        }
        parallel.add(&api, "search", &params)?;
    }

    let results = parallel.wait().await;
    let failed = results.failures().count();

    let mut output = Map::with_capacity(queries.len());
    for (query, result) in queries.into_iter().zip(&results) {
        let entry = match result {
            Ok(response) => response.dict(),
            Err(e) => json!({ "error": e.to_string() }),
        };
        output.insert(query, entry);
    }
    print_json(&Value::Object(output))?;

    if failed == 0 {
        return Ok(ExitCode::SUCCESS);
    }
    info!(failed, total = results.len(), "some searches failed");
    for (_, error) in results.failures() {
        report(error);
    }
    Ok(ExitCode::FAILURE)
}

fn parse_params(raw: &str) -> Result<Value, EbayError> {
    let params: Value = serde_json::from_str(raw)
        .map_err(|e| EbayError::InvalidParameter(format!("--params is not valid JSON: {e}")))?;
    if params.is_object() {
        Ok(params)
    } else {
        Err(EbayError::InvalidParameter("--params must be a JSON object".to_owned()))
    }
}

fn print_json(value: &Value) -> Result<(), EbayError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| EbayError::Parse(e.to_string()))?;
    safe_println!("{text}");
    Ok(())
}

fn print_response(response: &Response) -> Result<(), EbayError> {
    print_json(&response.dict())?;
    for warning in response.warnings() {
        let _ = writeln!(io::stderr(), "warning: {warning}");
    }
    Ok(())
}

fn report(error: &EbayError) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error: {error}");
    if let Some(response) = error.response() {
        let _ = writeln!(
            stderr,
            "  HTTP {} {} ({})",
            response.status_code(),
            response.reason(),
            response.url()
        );
        for code in response.response_codes() {
            let _ = writeln!(stderr, "  code: {code}");
        }
    }
}
