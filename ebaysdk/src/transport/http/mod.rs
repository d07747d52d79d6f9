//! reqwest-backed [`Transport`].

use std::{
    sync::LazyLock,
    time::{Duration, Instant},
};

use reqwest::{Client, Proxy};
use tracing::{debug, instrument};
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{EbayError, Result},
    request::{Method, PreparedRequest},
    transport::{Transport, TransportResponse, sealed},
};

/// Client shared by every connection without a proxy or HTTP version pin.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(100)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create default HTTP client")
});

/// Validates that the URL is `http`/`https` and names a host.
fn validate_url(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EbayError::Config(format!("unsupported URL scheme: {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(EbayError::Config(format!("URL missing host: {url}")));
    }
    Ok(())
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(EbayError::InvalidParameter(
            "invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(EbayError::InvalidParameter(format!(
            "invalid value for header '{name}': control characters not allowed"
        )));
    }
    Ok(())
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Cloning is cheap: the underlying client is reference-counted and shares
/// its connection pool with every clone.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use ebaysdk::transport::{HttpConfig, HttpTransport, Transport};
///
/// let config = HttpConfig { timeout_secs: 5.0, ..HttpConfig::default() };
/// let transport = HttpTransport::with_config(&config)?;
/// assert_eq!(transport.timeout(), Duration::from_secs(5));
/// # Ok::<(), ebaysdk::EbayError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
    timeout: Duration,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Transport on the shared client with a 20 second request timeout.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` matches [`HttpTransport::with_config`].
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: DEFAULT_HTTP_CLIENT.clone(),
            http_version: HttpVersion::Auto,
            timeout: HttpConfig::default().timeout(),
        })
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// The shared client is reused unless the configuration needs a proxy,
    /// a fixed HTTP version or a different pool size.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or client creation fails.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;
        let defaults = HttpConfig::default();

        let shared = config.proxy.is_none()
            && config.http_version == HttpVersion::Auto
            && config.pool_max_idle_per_host == defaults.pool_max_idle_per_host
            && config.connect_timeout_secs == defaults.connect_timeout_secs;

        let client = if shared {
            DEFAULT_HTTP_CLIENT.clone()
        } else {
            let mut builder = Client::builder()
                .pool_max_idle_per_host(config.pool_max_idle_per_host)
                .connect_timeout(config.connect_timeout());

            builder = match config.http_version {
                HttpVersion::Http1 => builder.http1_only(),
                HttpVersion::Http2 => builder.http2_prior_knowledge(),
                HttpVersion::Auto => builder,
            };

            if let Some(proxy) = &config.proxy {
                builder = builder.proxy(Proxy::all(proxy.url()).map_err(EbayError::HttpError)?);
            }

            builder.build().map_err(EbayError::HttpError)?
        };

        Ok(Self { client, http_version: config.http_version, timeout: config.timeout() })
    }

    fn map_error(&self, verb: &str, error: reqwest::Error) -> EbayError {
        if error.is_timeout() {
            EbayError::Timeout { verb: verb.to_owned(), after: self.timeout }
        } else {
            EbayError::HttpError(error)
        }
    }

    #[instrument(
        skip(self, request),
        fields(verb = %request.verb, method = %request.method, url = %request.url)
    )]
    async fn execute_request(&self, request: &PreparedRequest) -> Result<TransportResponse> {
        validate_url(&request.url)?;
        for (name, value) in &request.headers {
            validate_header(name, value)?;
        }

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, request.url.clone()).timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| self.map_error(&request.verb, e))?;

        let status = response.status();
        let url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let body = response.bytes().await.map_err(|e| self.map_error(&request.verb, e))?.to_vec();
        let elapsed = started.elapsed();

        debug!(status = status.as_u16(), bytes = body.len(), ?elapsed, "response received");

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            url,
            headers,
            body,
            elapsed,
        })
    }
}

impl Transport for HttpTransport {
    async fn send<'a>(&'a self, request: &'a PreparedRequest) -> Result<TransportResponse> {
        self.execute_request(request).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
