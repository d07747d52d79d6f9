//! Transport configuration types.
//!
//! [`HttpConfig`] is derived from a connection's [`Config`] with
//! [`HttpConfig::from_config`]. Recognized keys:
//!
//! | key | meaning | default |
//! |---|---|---|
//! | `timeout` | request timeout, seconds | 20 |
//! | `connect_timeout` | TCP/TLS connect timeout, seconds | 10 |
//! | `pool_size` | idle connections kept per host | 100 |
//! | `http_version` | `auto`, `http1` or `http2` | `auto` |
//! | `proxy_host` / `proxy_port` | HTTP proxy | none |

use std::time::Duration;

use crate::{
    config::Config,
    error::{EbayError, Result},
};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 20.0;

/// HTTP transport configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Request timeout in seconds.
    pub timeout_secs: f64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP version preference.
    pub http_version: HttpVersion,
    /// Optional HTTP proxy.
    pub proxy: Option<ProxyConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            http_version: HttpVersion::default(),
            proxy: None,
        }
    }
}

impl HttpConfig {
    /// Reads the transport keys from a connection config.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Config`] if a proxy host is set without a valid
    /// port, `http_version` or `pool_size` is malformed, or the resulting
    /// values fail [`HttpConfig::validate`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut http = Self::default();

        if let Some(timeout) = config.get_f64("timeout") {
            http.timeout_secs = timeout;
        }
        if let Some(connect) = config.get_u64("connect_timeout") {
            http.connect_timeout_secs = connect;
        }
        if let Some(size) = config.get_u64("pool_size") {
            http.pool_max_idle_per_host = usize::try_from(size)
                .map_err(|_| EbayError::Config(format!("pool_size {size} is too large")))?;
        }
        if let Some(version) = config.get_str("http_version") {
            http.http_version = version.parse()?;
        }

        if let Some(host) = config.get_str("proxy_host").filter(|h| !h.is_empty()) {
            let port = config
                .get_u64("proxy_port")
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| {
                    EbayError::Config(format!("proxy_host '{host}' requires a valid proxy_port"))
                })?;
            http.proxy = Some(ProxyConfig { host, port });
        }

        http.validate()?;
        Ok(http)
    }

    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns error if timeout values are outside valid ranges:
    /// - `timeout_secs`: must be greater than 0 and at most 300 seconds
    /// - `connect_timeout_secs`: must be 1-60 seconds
    pub fn validate(&self) -> Result<()> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 || self.timeout_secs > 300.0
        {
            return Err(EbayError::Config(
                "timeout must be greater than 0 and at most 300 seconds".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(EbayError::Config(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    /// Returns connect timeout as Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// HTTP proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy host name.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

impl ProxyConfig {
    /// Proxy URL in `http://host:port` form.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// HTTP version preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 only (requires prior knowledge).
    Http2,
    /// Auto-negotiate (prefer HTTP/2, fall back to HTTP/1.1).
    #[default]
    Auto,
}

impl std::str::FromStr for HttpVersion {
    type Err = EbayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "http1" | "http/1.1" => Ok(Self::Http1),
            "http2" | "http/2" => Ok(Self::Http2),
            other => Err(EbayError::Config(format!(
                "http_version must be auto, http1 or http2, got '{other}'"
            ))),
        }
    }
}

const fn default_pool_max_idle() -> usize {
    100
}

const fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionOptions;

    fn config(options: ConnectionOptions) -> Config {
        Config::load("api.ebay.com", &options.without_config_file()).unwrap()
    }

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.pool_max_idle_per_host, 100);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.http_version, HttpVersion::Auto);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_from_config_timeout() {
        let options = ConnectionOptions::new().timeout(Duration::from_secs(5));
        let http = HttpConfig::from_config(&config(options)).unwrap();
        assert_eq!(http.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_proxy() {
        let http =
            HttpConfig::from_config(&config(ConnectionOptions::new().proxy("proxy.local", 3128)))
                .unwrap();
        let proxy = http.proxy.unwrap();
        assert_eq!(proxy.url(), "http://proxy.local:3128");
    }

    #[test]
    fn test_from_config_proxy_requires_port() {
        let options = ConnectionOptions::new().option("proxy_host", "proxy.local");
        let err = HttpConfig::from_config(&config(options)).unwrap_err();
        assert!(err.to_string().contains("proxy_port"));
    }

    #[test]
    fn test_from_config_rejects_zero_timeout() {
        let options = ConnectionOptions::new().option("timeout", 0u64);
        assert!(HttpConfig::from_config(&config(options)).is_err());
    }

    #[test]
    fn test_validate_bounds() {
        let config = HttpConfig { timeout_secs: 301.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = HttpConfig { connect_timeout_secs: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = HttpConfig { timeout_secs: 0.5, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_config_transport_keys() {
        let options = ConnectionOptions::new()
            .option("http_version", "http1")
            .option("pool_size", 8u64)
            .option("connect_timeout", 3u64);
        let http = HttpConfig::from_config(&config(options)).unwrap();
        assert_eq!(http.http_version, HttpVersion::Http1);
        assert_eq!(http.pool_max_idle_per_host, 8);
        assert_eq!(http.connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_from_config_rejects_unknown_http_version() {
        let options = ConnectionOptions::new().option("http_version", "http3");
        let err = HttpConfig::from_config(&config(options)).unwrap_err();
        assert!(err.to_string().contains("http_version"));
    }

    #[test]
    fn test_http_version_parse() {
        assert_eq!("AUTO".parse::<HttpVersion>().ok(), Some(HttpVersion::Auto));
        assert_eq!("http/2".parse::<HttpVersion>().ok(), Some(HttpVersion::Http2));
        assert!("spdy".parse::<HttpVersion>().is_err());
    }
}
