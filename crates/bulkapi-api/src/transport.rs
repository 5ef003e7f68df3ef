//! HTTP collaborator contract
//!
//! The client never opens sockets itself. Every request goes through a
//! [`Transport`] supplied at construction, which makes the facade testable
//! against canned responses and lets callers bring their own HTTP stack.

use crate::config::ClientConfig;
use bulkapi_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
}

impl Method {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Absolute URL without query string
    pub url: String,
    /// Query string parameters, in order
    pub params: Vec<(String, String)>,
    /// Request headers, in order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request with no parameters, headers or body
    pub fn new<S: Into<String>>(method: Method, url: S) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a query string parameter
    pub fn with_param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Append a header
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body along with the matching content headers
    pub fn with_json(mut self, body: &Value) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json"))
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Query string parameter by name
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body as JSON
    pub fn json_body(&self) -> Result<Option<Value>> {
        match self.body {
            Some(ref body) => Ok(Some(serde_json::from_slice(body)?)),
            None => Ok(None),
        }
    }
}

/// One incoming response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers, in order
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Response with a raw body
    pub fn new<B: Into<Vec<u8>>>(status: u16, body: B) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Response carrying a JSON document
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string()).with_header("Content-Type", "application/json")
    }

    /// Bodyless response, e.g. `204 No Content`
    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new())
    }

    /// Append a header
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded lossily as UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into [`Error::Api`]
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Api {
                status: self.status,
                body: self.text(),
            })
        }
    }

    /// Decode the body as JSON into `T`
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends requests to the remote API.
///
/// Implementations report connection-level failures as
/// [`Error::Transport`]; status codes are returned as-is and interpreted by
/// the caller.
pub trait Transport: Send + Sync {
    /// Send one request and wait for the response
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }
}

/// Transport bound to one API root and token
#[derive(Clone)]
pub(crate) struct Session {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl Session {
    pub(crate) fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `path` resolved against the API root
    pub(crate) fn url(&self, path: &str) -> String {
        join_url(&self.config.api_url, path)
    }

    /// Send `request` with the token attached. Non-2xx statuses become
    /// [`Error::Api`].
    pub(crate) fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request =
            request.with_header("Authorization", format!("Token {}", self.config.token));
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(&request)?;
        trace!(
            status = response.status,
            bytes = response.body.len(),
            "received response"
        );
        response.error_for_status()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

/// Resolve `path` against `base` the way a browser resolves a link.
///
/// Absolute URLs are returned unchanged, paths starting with `/` replace the
/// path of `base`, anything else is appended to `base`.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if let Some(rest) = path.strip_prefix('/') {
        return format!("{}/{}", origin(base), rest);
    }
    if base.ends_with('/') {
        format!("{}{}", base, path)
    } else {
        match base.rfind('/') {
            Some(i) if i > base.find("://").map_or(0, |s| s + 2) => {
                format!("{}{}", &base[..=i], path)
            }
            _ => format!("{}/{}", base, path),
        }
    }
}

fn origin(url: &str) -> &str {
    let start = url.find("://").map_or(0, |i| i + 3);
    match url[start..].find('/') {
        Some(i) => &url[..start + i],
        None => url,
    }
}
