//! Client configuration
//!
//! Everything the facade needs to know about the remote deployment. The
//! core never reads the environment; [`ClientConfig::from_env`] is the one
//! place where process environment variables are consulted.

use bulkapi_core::query::MAX_PAGE_SIZE;
use bulkapi_core::{Error, Result};
use std::time::Duration;

/// Environment variable holding the API token
pub const TOKEN_VAR: &str = "BULK_API_TOKEN";
/// Environment variable overriding the API url
pub const URL_VAR: &str = "BULK_API_URL";
/// Environment variable overriding the cache expiration, in seconds
pub const EXPIRATION_VAR: &str = "BULK_API_EXPIRATION_TIME";

/// Default API root
pub const DEFAULT_API_URL: &str = "https://data-warehouse.pivot/bulk/api/";
/// Default cache expiration, in seconds
pub const DEFAULT_EXPIRATION_SECS: u64 = 7200;

/// Configuration for a [`crate::Client`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API token sent as `Authorization: Token <token>`
    pub token: String,
    /// API root url, always ending with `/`
    pub api_url: String,
    /// How long cached query results stay valid
    pub expiration: Duration,
    /// Page size applied to queries that do not set one
    pub page_size: Option<usize>,
    /// Log the client configuration at debug level on construction
    pub log: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            expiration: Duration::from_secs(DEFAULT_EXPIRATION_SECS),
            page_size: None,
            log: false,
        }
    }
}

impl ClientConfig {
    /// Config with the given token and defaults for everything else
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Set the API root. A trailing `/` is added when missing.
    pub fn with_api_url<S: Into<String>>(mut self, api_url: S) -> Self {
        let mut api_url = api_url.into();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        self.api_url = api_url;
        self
    }

    /// Set the cache expiration
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Set the default page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Enable configuration logging
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR).filter(|t| !t.is_empty()).ok_or_else(|| {
            Error::InvalidOperation(format!("environment variable {} is not set", TOKEN_VAR))
        })?;
        let mut config = Self::new(token);

        if let Some(url) = lookup(URL_VAR).filter(|u| !u.is_empty()) {
            config = config.with_api_url(url);
        }

        if let Some(raw) = lookup(EXPIRATION_VAR).filter(|e| !e.is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::InvalidOperation(format!(
                    "{} must be a number of seconds, got '{}'",
                    EXPIRATION_VAR, raw
                ))
            })?;
            config = config.with_expiration(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Check the values that can be wrong without talking to the server
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::InvalidOperation("API token is empty".to_string()));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::InvalidOperation(format!(
                "API url '{}' is not an http(s) url",
                self.api_url
            )));
        }
        match self.page_size {
            Some(0) => Err(Error::InvalidPagination {
                name: "page_size",
                value: 0,
            }),
            Some(size) if size > MAX_PAGE_SIZE => Err(Error::PageSizeExceeded {
                requested: size,
                max: MAX_PAGE_SIZE,
            }),
            _ => Ok(()),
        }
    }
}
