//! Connection configuration.
//!
//! Every [`Connection`](crate::Connection) owns a [`Config`]: a flat key/value
//! store assembled from three layers, highest precedence first:
//!
//! 1. options passed to the constructor ([`ConnectionOptions`]),
//! 2. the section of the YAML config file named after the API domain,
//! 3. defaults supplied by the API family.
//!
//! # YAML layout
//!
//! ```yaml
//! name: ebay_api_config
//!
//! api.ebay.com:
//!     appid: MyApp-1234
//!     certid: SBX-abcd
//!     devid: 1234-5678
//!     token: AgAAAA...
//!
//! svcs.ebay.com:
//!     appid: MyApp-1234
//!     version: 1.12.0
//!     http_version: http1
//!     pool_size: 16
//! ```
//!
//! Transport keys (`timeout`, `connect_timeout`, `pool_size`, `http_version`,
//! `proxy_host`, `proxy_port`) are described in
//! [`transport::config`](crate::transport::config).
//!
//! # Examples
//!
//! ```
//! use ebaysdk::config::{Config, ConnectionOptions};
//!
//! let options = ConnectionOptions::new().appid("MyApp-1234").without_config_file();
//! let mut config = Config::load("svcs.ebay.com", &options)?;
//!
//! config.set("siteid", "EBAY-US");
//! config.set("appid", "ignored-default");
//!
//! assert_eq!(config.get_str("appid").as_deref(), Some("MyApp-1234"));
//! assert_eq!(config.get_str("siteid").as_deref(), Some("EBAY-US"));
//! # Ok::<(), ebaysdk::EbayError>(())
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use serde_yaml::Value;
use tracing::debug;
use url::Url;

use crate::error::{EbayError, Result};

/// Config file looked up when the caller does not choose one.
pub const DEFAULT_CONFIG_FILE: &str = "ebay.yaml";

/// Constructor options for a connection.
///
/// Only the options that are explicitly set take part in the precedence
/// rules; everything else falls through to the YAML file and the API defaults.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    values: BTreeMap<String, Value>,
    config_file: Option<PathBuf>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self { values: BTreeMap::new(), config_file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)) }
    }
}

impl ConnectionOptions {
    /// Creates options that load `ebay.yaml` and set nothing else.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary config key.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// eBay application id (OAuth client id).
    #[must_use]
    pub fn appid(self, appid: impl Into<String>) -> Self {
        self.option("appid", appid.into())
    }

    /// eBay cert id (OAuth client secret).
    #[must_use]
    pub fn certid(self, certid: impl Into<String>) -> Self {
        self.option("certid", certid.into())
    }

    /// eBay developer id.
    #[must_use]
    pub fn devid(self, devid: impl Into<String>) -> Self {
        self.option("devid", devid.into())
    }

    /// Auth'n'Auth token for Trading, or OAuth token for Shopping/Browse.
    #[must_use]
    pub fn token(self, token: impl Into<String>) -> Self {
        self.option("token", token.into())
    }

    /// OAuth user token sent as `X-EBAY-API-IAF-TOKEN` by Trading.
    #[must_use]
    pub fn iaf_token(self, token: impl Into<String>) -> Self {
        self.option("iaf_token", token.into())
    }

    /// Site or marketplace id (`EBAY-US`, `0`, `EBAY_US` depending on the API).
    #[must_use]
    pub fn siteid(self, siteid: impl Into<String>) -> Self {
        self.option("siteid", siteid.into())
    }

    /// API version or compatibility level.
    #[must_use]
    pub fn version(self, version: impl Into<String>) -> Self {
        self.option("version", version.into())
    }

    /// API host, optionally with a port.
    #[must_use]
    pub fn domain(self, domain: impl Into<String>) -> Self {
        self.option("domain", domain.into())
    }

    /// Endpoint path below the domain.
    #[must_use]
    pub fn uri(self, uri: impl Into<String>) -> Self {
        self.option("uri", uri.into())
    }

    /// Uses `https` (default) or plain `http`.
    #[must_use]
    pub fn https(self, https: bool) -> Self {
        self.option("https", https)
    }

    /// Routes requests through an HTTP proxy.
    #[must_use]
    pub fn proxy(self, host: impl Into<String>, port: u16) -> Self {
        self.option("proxy_host", host.into()).option("proxy_port", u64::from(port))
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.option("timeout", timeout.as_secs_f64())
    }

    /// Logs body-level warnings.
    #[must_use]
    pub fn warnings(self, enabled: bool) -> Self {
        self.option("warnings", enabled)
    }

    /// Turns status and `ack` failures into errors.
    #[must_use]
    pub fn errors(self, enabled: bool) -> Self {
        self.option("errors", enabled)
    }

    /// Logs request and response bodies at debug level.
    #[must_use]
    pub fn debug(self, enabled: bool) -> Self {
        self.option("debug", enabled)
    }

    /// Extra attempts for transient failures (default 0).
    ///
    /// Timeouts, connect failures and 5xx replies are retried, also when
    /// [`errors`](Self::errors) is off.
    #[must_use]
    pub fn retries(self, retries: u32) -> Self {
        self.option("retries", u64::from(retries))
    }

    /// Loads defaults from the given YAML file.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Disables YAML loading entirely; no file I/O happens.
    #[must_use]
    pub fn without_config_file(mut self) -> Self {
        self.config_file = None;
        self
    }

    /// Returns an explicitly set option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// Returns the configured YAML file, if loading is enabled.
    #[must_use]
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

/// Merged configuration of one connection.
#[derive(Debug, Clone)]
pub struct Config {
    domain: String,
    values: BTreeMap<String, Value>,
    overrides: BTreeMap<String, Value>,
    file_used: Option<PathBuf>,
}

impl Config {
    /// Builds the config for `domain`, reading the YAML file named in `options`.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Config`] if the file cannot be found, read or parsed.
    pub fn load(domain: &str, options: &ConnectionOptions) -> Result<Self> {
        let mut config = Self::empty(domain, options);

        if let Some(path) = options.config_file_path() {
            let found = locate_config_file(path).ok_or_else(|| {
                EbayError::Config(format!(
                    "config file {} not found. Use ConnectionOptions::without_config_file() to \
                     run without a YAML config.",
                    path.display()
                ))
            })?;
            let content = std::fs::read_to_string(&found).map_err(|e| {
                EbayError::Config(format!("cannot read config file {}: {e}", found.display()))
            })?;
            config.merge_yaml(&content)?;
            debug!(path = %found.display(), domain, "loaded YAML config");
            config.file_used = Some(found);
        }

        config.apply_overrides();
        Ok(config)
    }

    /// Builds the config for `domain` from YAML text instead of a file.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Config`] if the YAML is malformed.
    pub fn from_yaml(domain: &str, yaml: &str, options: &ConnectionOptions) -> Result<Self> {
        let mut config = Self::empty(domain, options);
        config.merge_yaml(yaml)?;
        config.apply_overrides();
        Ok(config)
    }

    fn empty(domain: &str, options: &ConnectionOptions) -> Self {
        Self {
            domain: domain.to_owned(),
            values: BTreeMap::new(),
            overrides: options.values.clone(),
            file_used: None,
        }
    }

    fn merge_yaml(&mut self, yaml: &str) -> Result<()> {
        let document: Value = serde_yaml::from_str(yaml)
            .map_err(|e| EbayError::Config(format!("invalid YAML config: {e}")))?;

        let Some(section) = document.get(self.domain.as_str()) else {
            debug!(domain = %self.domain, "YAML config has no section for domain");
            return Ok(());
        };

        let Value::Mapping(section) = section else {
            return Err(EbayError::Config(format!(
                "YAML section '{}' must be a mapping",
                self.domain
            )));
        };

        for (key, value) in section {
            let Some(key) = key.as_str() else {
                return Err(EbayError::Config(format!(
                    "YAML section '{}' has a non-string key",
                    self.domain
                )));
            };
            self.set(key, value.clone());
        }
        Ok(())
    }

    fn apply_overrides(&mut self) {
        for (key, value) in &self.overrides {
            if !value.is_null() {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    /// Domain whose YAML section was consulted.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// YAML file the config was read from, if any.
    #[must_use]
    pub fn file_used(&self) -> Option<&Path> {
        self.file_used.as_deref()
    }

    /// Sets `key` unless a constructor option or YAML value already provides it.
    pub fn set(&mut self, key: &str, default: impl Into<Value>) {
        if let Some(value) = self.overrides.get(key).filter(|v| !v.is_null()) {
            self.values.insert(key.to_owned(), value.clone());
        } else if self.get(key).is_none() {
            self.values.insert(key.to_owned(), default.into());
        }
    }

    /// Sets `key` regardless of constructor options and YAML.
    pub fn force(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_owned(), value.into());
    }

    /// Removes `key`.
    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Returns the raw value of `key`; nulls read as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// Returns `key` rendered as a string.
    ///
    /// Numbers and booleans are stringified, so `siteid: 0` in YAML reads as `"0"`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Returns `key` as a boolean, accepting `true`/`false`, `yes`/`no` and `1`/`0`.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Returns `key` as a float.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns `key` as an unsigned integer.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns `key` as a duration in seconds.
    #[must_use]
    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        self.get_f64(key)
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Iterates over all set keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter(|(_, v)| !v.is_null()).map(|(k, _)| k.as_str())
    }

    /// Builds `{scheme}://{domain}{uri}` from the `https`, `domain` and `uri` keys.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Config`] if the domain is missing or the result is not a URL.
    pub fn base_url(&self) -> Result<Url> {
        let scheme = if self.get_bool("https", true) { "https" } else { "http" };
        let domain = self
            .get_str("domain")
            .ok_or_else(|| EbayError::Config("domain is not set".to_owned()))?;
        let uri = self.get_str("uri").unwrap_or_default();
        validate_uri(&uri)?;

        Url::parse(&format!("{scheme}://{domain}{uri}"))
            .map_err(|e| EbayError::Config(format!("invalid endpoint '{domain}{uri}': {e}")))
    }
}

/// Finds `path` as given, then under `$HOME` and `/etc`.
fn locate_config_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if path.is_absolute() {
        return None;
    }

    let mut dirs = Vec::with_capacity(2);
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home));
    }
    dirs.push(PathBuf::from("/etc"));

    dirs.into_iter().map(|dir| dir.join(path)).find(|candidate| candidate.is_file())
}

/// Validates an endpoint path.
///
/// Paths must be empty or start with `/`, and must not contain `..` or `//`.
pub(crate) fn validate_uri(uri: &str) -> Result<()> {
    if uri.is_empty() {
        return Ok(());
    }
    if !uri.starts_with('/') {
        return Err(EbayError::Config(format!("uri must start with '/': {uri}")));
    }
    if uri.contains("..") || uri.contains("//") {
        return Err(EbayError::Config(format!("uri contains a traversal sequence: {uri}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const YAML: &str = r"
name: ebay_api_config

api.ebay.com:
    appid: yaml-app
    certid: yaml-cert
    siteid: 0
    https: false

svcs.ebay.com:
    appid: finding-app
";

    #[test]
    fn test_options_default_uses_ebay_yaml() {
        let options = ConnectionOptions::new();
        assert_eq!(options.config_file_path(), Some(Path::new(DEFAULT_CONFIG_FILE)));
    }

    #[test]
    fn test_without_config_file_loads_nothing() {
        let options = ConnectionOptions::new().without_config_file();
        let config = Config::load("api.ebay.com", &options).unwrap();
        assert!(config.file_used().is_none());
        assert_eq!(config.keys().count(), 0);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let options = ConnectionOptions::new().config_file("/nonexistent/dir/ebay-test.yaml");
        let err = Config::load("api.ebay.com", &options).unwrap_err();
        assert!(matches!(err, EbayError::Config(_)));
        assert!(err.to_string().contains("without_config_file"));
    }

    #[test]
    fn test_yaml_section_for_domain() {
        let options = ConnectionOptions::new().without_config_file();
        let config = Config::from_yaml("svcs.ebay.com", YAML, &options).unwrap();
        assert_eq!(config.get_str("appid").as_deref(), Some("finding-app"));
        assert!(config.get("certid").is_none());
    }

    #[test]
    fn test_yaml_without_matching_section() {
        let options = ConnectionOptions::new();
        let config = Config::from_yaml("open.api.ebay.com", YAML, &options).unwrap();
        assert_eq!(config.keys().count(), 0);
    }

    #[test]
    fn test_precedence_options_over_yaml_over_defaults() {
        let options = ConnectionOptions::new().appid("option-app");
        let mut config = Config::from_yaml("api.ebay.com", YAML, &options).unwrap();

        config.set("appid", "default-app");
        config.set("certid", "default-cert");
        config.set("devid", "default-dev");

        assert_eq!(config.get_str("appid").as_deref(), Some("option-app"));
        assert_eq!(config.get_str("certid").as_deref(), Some("yaml-cert"));
        assert_eq!(config.get_str("devid").as_deref(), Some("default-dev"));
    }

    #[test]
    fn test_force_overrides_everything() {
        let options = ConnectionOptions::new().https(false);
        let mut config = Config::from_yaml("api.ebay.com", YAML, &options).unwrap();
        config.force("https", true);
        assert!(config.get_bool("https", false));
    }

    #[test]
    fn test_null_default_reads_as_absent() {
        let options = ConnectionOptions::new().without_config_file();
        let mut config = Config::load("api.ebay.com", &options).unwrap();
        config.set("proxy_host", Value::Null);
        assert!(config.get("proxy_host").is_none());
        assert!(config.get_str("proxy_host").is_none());
    }

    #[test]
    fn test_numbers_render_as_strings() {
        let config = Config::from_yaml("api.ebay.com", YAML, &ConnectionOptions::new()).unwrap();
        assert_eq!(config.get_str("siteid").as_deref(), Some("0"));
    }

    #[test]
    fn test_get_bool_variants() {
        let options = ConnectionOptions::new()
            .option("a", "yes")
            .option("b", "0")
            .option("c", true)
            .option("d", "maybe");
        let config = Config::load("x", &options.without_config_file()).unwrap();
        assert!(config.get_bool("a", false));
        assert!(!config.get_bool("b", true));
        assert!(config.get_bool("c", false));
        assert!(config.get_bool("d", true));
        assert!(!config.get_bool("missing", false));
    }

    #[test]
    fn test_get_duration() {
        let options = ConnectionOptions::new()
            .timeout(Duration::from_millis(1500))
            .option("zero", 0u64)
            .without_config_file();
        let config = Config::load("x", &options).unwrap();
        assert_eq!(config.get_duration("timeout"), Some(Duration::from_millis(1500)));
        assert_eq!(config.get_duration("zero"), None);
    }

    #[test]
    fn test_invalid_yaml() {
        let yaml = "api.ebay.com: [unclosed";
        let err = Config::from_yaml("api.ebay.com", yaml, &ConnectionOptions::new()).unwrap_err();
        assert!(matches!(err, EbayError::Config(_)));
    }

    #[test]
    fn test_section_must_be_mapping() {
        let err = Config::from_yaml("api.ebay.com", "api.ebay.com: 3", &ConnectionOptions::new())
            .unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let options = ConnectionOptions::new().config_file(file.path());
        let config = Config::load("api.ebay.com", &options).unwrap();

        assert_eq!(config.file_used(), Some(file.path()));
        assert_eq!(config.get_str("appid").as_deref(), Some("yaml-app"));
        assert!(!config.get_bool("https", true));
    }

    #[test]
    fn test_base_url() {
        let options = ConnectionOptions::new()
            .domain("api.ebay.com")
            .uri("/buy/browse/v1")
            .without_config_file();
        let config = Config::load("api.ebay.com", &options).unwrap();
        assert_eq!(config.base_url().unwrap().as_str(), "https://api.ebay.com/buy/browse/v1");
    }

    #[test]
    fn test_base_url_plain_http_with_port() {
        let options = ConnectionOptions::new()
            .domain("127.0.0.1:8080")
            .uri("/shopping")
            .https(false)
            .without_config_file();
        let config = Config::load("127.0.0.1:8080", &options).unwrap();
        assert_eq!(config.base_url().unwrap().as_str(), "http://127.0.0.1:8080/shopping");
    }

    #[test]
    fn test_base_url_requires_domain() {
        let config = Config::load("x", &ConnectionOptions::new().without_config_file()).unwrap();
        assert!(matches!(config.base_url(), Err(EbayError::Config(_))));
    }

    #[test]
    fn test_validate_uri() {
        assert!(validate_uri("").is_ok());
        assert!(validate_uri("/ws/api.dll").is_ok());
        assert!(validate_uri("ws/api.dll").is_err());
        assert!(validate_uri("/ws/../etc").is_err());
        assert!(validate_uri("/ws//api").is_err());
    }
}
