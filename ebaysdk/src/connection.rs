//! Connection to one eBay API family.
//!
//! A [`Connection`] owns the merged [`Config`], an HTTP transport and the
//! retry policy. [`Connection::execute`] keeps the last response for later
//! inspection; [`Connection::send`] is stateless and returns the response by
//! value, which is what the [`Parallel`](crate::Parallel) executor uses.
//!
//! Each call runs the same pipeline:
//!
//! 1. the family checks the call name and builds the request
//! 2. the transport sends it, retrying transient failures when `retries` is set
//! 3. the body is normalized into a reply tree and body-level messages
//! 4. with the `errors` key on (the default), any reported error becomes
//!    [`EbayError::ConnectionError`] carrying the response

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::{
    api::{Api, CallContext},
    auth::TokenProvider,
    config::{Config, ConnectionOptions},
    error::{EbayError, Result},
    reliability::{RetryPolicy, is_retryable, retry_with_backoff},
    request::{PreparedRequest, to_params},
    response::{NodeRules, Response},
    transport::{HttpConfig, HttpTransport, Transport},
};

/// Per-call options.
///
/// # Examples
///
/// ```
/// use ebaysdk::CallOptions;
///
/// let options = CallOptions::new().list_node("findItemsAdvancedResponse.searchResult.item");
/// assert_eq!(options.list_nodes().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    list_nodes: Vec<String>,
}

impl CallOptions {
    /// Creates empty call options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the node at `path` to be a list.
    ///
    /// Paths start at the response root element, e.g.
    /// `GetOrdersResponse.OrderArray.Order`.
    #[must_use]
    pub fn list_node(mut self, path: impl Into<String>) -> Self {
        self.list_nodes.push(path.into());
        self
    }

    /// Forces every node in `paths` to be a list.
    #[must_use]
    pub fn list_nodes_from<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.list_nodes.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Caller-supplied list node paths.
    #[must_use]
    pub fn list_nodes(&self) -> &[String] {
        &self.list_nodes
    }
}

/// Connection to the API family `A`.
///
/// Cloning is cheap and clones share the HTTP connection pool; the last
/// response is copied with the clone.
#[derive(Debug, Clone)]
pub struct Connection<A: Api> {
    api: A,
    config: Config,
    transport: HttpTransport,
    retry: RetryPolicy,
    token_provider: Option<Arc<dyn TokenProvider>>,
    last: Option<Response>,
}

impl<A: Api> Connection<A> {
    /// Creates a connection from explicit options and the YAML config file.
    ///
    /// The YAML section is chosen by the `domain` option, falling back to
    /// the family's default domain.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Config`] if the config file is missing or
    /// malformed, or if the merged settings are invalid.
    pub fn new(options: ConnectionOptions) -> Result<Self> {
        let domain = options
            .get("domain")
            .and_then(serde_yaml::Value::as_str)
            .map_or_else(|| A::DEFAULT_DOMAIN.to_owned(), str::to_owned);
        let config = Config::load(&domain, &options)?;
        Self::from_config(config)
    }

    /// Creates a connection from an already merged config.
    ///
    /// Family defaults fill the keys the config leaves unset.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Config`] if the endpoint, timeout or proxy
    /// settings are invalid.
    pub fn from_config(mut config: Config) -> Result<Self> {
        let api = A::default();
        api.apply_defaults(&mut config);

        config.base_url()?;
        let transport = HttpTransport::with_config(&HttpConfig::from_config(&config)?)?;
        let retry = RetryPolicy::from_config(&config);

        debug!(
            api = A::NAME,
            domain = config.domain(),
            file = ?config.file_used(),
            protocol = transport.protocol_name(),
            attempts = retry.max_attempts,
            "Connection configured"
        );

        Ok(Self { api, config, transport, retry, token_provider: None, last: None })
    }

    /// Attaches the collaborator that supplies OAuth access tokens.
    ///
    /// The provider is asked once per call; it takes precedence over the
    /// `token` config key.
    #[must_use]
    pub fn with_token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// The merged configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the merged configuration.
    ///
    /// Changes to transport settings (`timeout`, proxy) only apply to
    /// connections created afterwards.
    pub const fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Response of the last [`execute`](Self::execute) call, including failed ones.
    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        self.last.as_ref()
    }

    /// Error string of the last response, `"{verb}: {error}, ..."`.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.last.as_ref().and_then(Response::error)
    }

    /// Builds the request for `verb` without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::UnsupportedCall`] for calls the family does not
    /// know, [`EbayError::InvalidParameter`] for parameters that cannot be
    /// encoded, and [`EbayError::Auth`] when a required token is missing.
    pub fn prepare<P>(&self, verb: &str, params: &P) -> Result<PreparedRequest>
    where
        P: Serialize + ?Sized,
    {
        self.prepare_map(verb, &to_params(params)?)
    }

    fn prepare_map(&self, verb: &str, params: &Map<String, Value>) -> Result<PreparedRequest> {
        self.api.check_verb(verb)?;
        let access_token = self.access_token()?;
        let request_id = Uuid::new_v4().to_string();
        let ctx = CallContext {
            verb,
            params,
            config: &self.config,
            access_token: access_token.as_deref(),
            request_id: &request_id,
        };
        self.api.build_request(&ctx)
    }

    fn access_token(&self) -> Result<Option<String>> {
        if !A::USES_ACCESS_TOKEN {
            return Ok(None);
        }
        match &self.token_provider {
            Some(provider) => provider.access_token().map(Some),
            None => Ok(self.config.get_str("token")),
        }
    }

    /// Runs a call and stores its response.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`]. When the failure carries a response, it is
    /// still available through [`Connection::response`].
    pub async fn execute<P>(&mut self, verb: &str, params: &P) -> Result<&Response>
    where
        P: Serialize + ?Sized,
    {
        self.execute_with(verb, params, &CallOptions::default()).await
    }

    /// Runs a call with per-call options and stores its response.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn execute_with<P>(
        &mut self,
        verb: &str,
        params: &P,
        options: &CallOptions,
    ) -> Result<&Response>
    where
        P: Serialize + ?Sized,
    {
        self.last = None;
        match self.send_with(verb, params, options).await {
            Ok(response) => Ok(&*self.last.insert(response)),
            Err(error) => {
                self.last = error.response().cloned();
                Err(error)
            }
        }
    }

    /// Runs a call and returns the response without storing it.
    ///
    /// # Errors
    ///
    /// - request building errors, see [`Connection::prepare`]
    /// - [`EbayError::HttpError`] or [`EbayError::Timeout`] on network failure
    /// - [`EbayError::ConnectionError`] when the `errors` key is on and the
    ///   call failed at HTTP or body level
    pub async fn send<P>(&self, verb: &str, params: &P) -> Result<Response>
    where
        P: Serialize + ?Sized,
    {
        self.send_with(verb, params, &CallOptions::default()).await
    }

    /// Runs a call with per-call options and returns the response.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn send_with<P>(
        &self,
        verb: &str,
        params: &P,
        options: &CallOptions,
    ) -> Result<Response>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params(params)?;
        self.send_map(verb, &params, options).await
    }

    #[instrument(skip(self, params, options), fields(api = A::NAME))]
    pub(crate) async fn send_map(
        &self,
        verb: &str,
        params: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<Response> {
        let request = self.prepare_map(verb, params)?;
        let mut rules = self.api.node_rules(verb);
        rules.extend_list_nodes(options.list_nodes());

        if self.config.get_bool("debug", false) {
            debug!(
                method = %request.method,
                url = %request.url,
                headers = ?request.redacted_headers(),
                body = %request.redacted_body_text(),
                "Sending request"
            );
        }

        let request = &request;
        let rules = &rules;
        let raise_errors = self.config.get_bool("errors", true);
        let result =
            retry_with_backoff(&self.retry, is_retryable, move || self.attempt(request, rules))
                .await;

        match result {
            // 5xx replies are raised internally so they can be retried
            Err(EbayError::ConnectionError { response: Some(response), .. }) if !raise_errors => {
                Ok(*response)
            }
            other => other,
        }
    }

    async fn attempt(&self, request: &PreparedRequest, rules: &NodeRules) -> Result<Response> {
        let raw = self.transport.send(request).await?;
        let mut response = Response::parse(&request.verb, raw, A::FORMAT, rules);
        let messages = self.api.body_messages(&response);
        response.set_messages(messages);

        if self.config.get_bool("debug", false) {
            debug!(
                status = response.status_code(),
                elapsed = ?response.elapsed(),
                body = %response.text(),
                "Response received"
            );
        }
        self.log_messages(&response);

        let raise = self.config.get_bool("errors", true) || response.status_code() >= 500;
        if raise && let Some(message) = response.error() {
            return Err(EbayError::connection(message, response));
        }
        Ok(response)
    }

    fn log_messages(&self, response: &Response) {
        if self.config.get_bool("warnings", true) && !response.warnings().is_empty() {
            warn!(
                verb = response.verb(),
                warnings = %response.warnings().join("\n"),
                "Call reported warnings"
            );
        }
        if self.config.get_bool("errors", true) && !response.errors().is_empty() {
            error!(
                verb = response.verb(),
                errors = %response.errors().join("\n"),
                "Call reported errors"
            );
        }
    }
}
