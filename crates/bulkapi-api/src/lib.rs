//! # Bulk API client
//!
//! Exposes the models of a remote tabular-data warehouse as queryable
//! objects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bulkapi::{Client, ClientConfig, HttpRequest, HttpResponse, QueryOptions, Transport, Q};
//!
//! struct MyHttp;
//!
//! impl Transport for MyHttp {
//!     fn send(&self, request: &HttpRequest) -> bulkapi::Result<HttpResponse> {
//!         // hand the request to an HTTP library of your choice
//!         # let _ = request;
//!         unimplemented!()
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::from_env()?, MyHttp)?;
//!     let questions = client.app("pivotpoll")?.model("question")?;
//!
//!     let filter = Q::lookup("question__startswith", "Who")?
//!         | (Q::lookup("question__startswith", "What")? & Q::lookup("integer__gte", 1)?);
//!     let table = questions.query(
//!         &QueryOptions::new()
//!             .with_filter(filter)
//!             .with_order(["-id"])
//!             .with_page_size(100),
//!     )?;
//!
//!     for row in table.rows() {
//!         println!("{:?}", row.get("question"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Filter forms
//!
//! The same filter can be written three ways and always compiles to the same
//! wire parameters:
//!
//! ```rust
//! use bulkapi::{compile_filter, FilterNode, Q};
//! use serde_json::json;
//!
//! let from_mapping = FilterNode::from_mapping(&json!({
//!     "or": [{"question__startswith": "Who"},
//!            {"question__startswith": "What", "integer__gte": 1}]
//! }))?;
//! let from_text = FilterNode::from_text(
//!     "or:\n  - question__startswith: Who\n  - question__startswith: What\n    integer__gte: 1\n",
//! )?;
//! let from_builder = Q::lookup("question__startswith", "Who")?
//!     | (Q::lookup("question__startswith", "What")? & Q::lookup("integer__gte", 1)?);
//!
//! assert_eq!(compile_filter(&from_mapping)?, compile_filter(&from_text)?);
//! assert_eq!(compile_filter(&from_mapping)?, compile_filter(&from_builder)?);
//! # Ok::<(), bulkapi::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use bulkapi_core::query::Compiler;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

pub mod cache;
pub mod config;
pub mod files;
pub mod logging;
pub mod transport;

// Re-export core types
pub use bulkapi_core::query::{
    compile, compile_filter, materialize, FieldEntry, FieldLookup, FieldPath, FieldSpec,
    FilterNode, LookupOperator, Materializer, OrderBy, Page, QueryOptions, QueryParams,
    ResultTable, RowRef, MAX_PAGE_SIZE, Q,
};
pub use bulkapi_core::{CacheKey, Error, QueryCache, Result};

pub use cache::MemoryCache;
pub use config::ClientConfig;
pub use files::{FileDownloader, FileResolver};
pub use logging::{LogConfig, LogFormat, LogOutput};
pub use transport::{join_url, HttpRequest, HttpResponse, Method, Transport};

use transport::Session;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Metadata of one model property
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyDefinition {
    /// The server rejects writes to this property
    #[serde(rename = "readOnly", default)]
    pub read_only: bool,
    /// Value format; `uri` marks a reference to another model object
    #[serde(default)]
    pub format: Option<String>,
}

impl PropertyDefinition {
    /// True if the property references another model object
    pub fn is_related(&self) -> bool {
        self.format.as_deref() == Some("uri")
    }
}

/// Property metadata of one model, as published in the API's schema
/// definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModelDefinition {
    /// Properties by field name
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
}

impl ModelDefinition {
    /// Parse a schema definition document (`{"properties": {...}}`)
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Add or replace one property
    pub fn with_property<S: Into<String>>(mut self, name: S, property: PropertyDefinition) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }
}

struct ClientInner {
    session: Session,
    compiler: Compiler,
    cache: Option<Arc<dyn QueryCache>>,
    apps: RwLock<Option<BTreeMap<String, String>>>,
    model_urls: RwLock<HashMap<String, BTreeMap<String, String>>>,
    definitions: RwLock<HashMap<String, ModelDefinition>>,
}

/// Entry point to the API.
///
/// Cheap to clone; clones share the transport, the query cache and the
/// memoised app and model url maps.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client with an in-memory query cache expiring after
    /// `config.expiration`.
    ///
    /// No request is sent until the first app or model is looked up.
    pub fn new<T: Transport + 'static>(config: ClientConfig, transport: T) -> Result<Self> {
        let cache: Arc<dyn QueryCache> = Arc::new(MemoryCache::new(config.expiration));
        Self::with_cache(config, transport, Some(cache))
    }

    /// Create a client with a caller-supplied query cache, or none at all
    pub fn with_cache<T: Transport + 'static>(
        config: ClientConfig,
        transport: T,
        cache: Option<Arc<dyn QueryCache>>,
    ) -> Result<Self> {
        config.validate()?;
        if config.log {
            debug!(
                api_url = %config.api_url,
                expiration_secs = config.expiration.as_secs(),
                page_size = ?config.page_size,
                cached = cache.is_some(),
                "bulk api client configured"
            );
        }
        Ok(Client {
            inner: Arc::new(ClientInner {
                session: Session::new(config, Arc::new(transport)),
                compiler: Compiler::new(),
                cache,
                apps: RwLock::new(None),
                model_urls: RwLock::new(HashMap::new()),
                definitions: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        self.inner.session.config()
    }

    /// Map of app label to app url, fetched once
    pub fn apps(&self) -> Result<BTreeMap<String, String>> {
        {
            let apps = self.inner.apps.read().map_err(|_| Error::LockPoisoned)?;
            if let Some(ref apps) = *apps {
                return Ok(apps.clone());
            }
        }
        let url = self.config().api_url.clone();
        let apps: BTreeMap<String, String> = self.get_json(&url)?;
        debug!(count = apps.len(), "loaded app list");
        let mut slot = self.inner.apps.write().map_err(|_| Error::LockPoisoned)?;
        *slot = Some(apps.clone());
        Ok(apps)
    }

    /// Handle for the app with the given label
    pub fn app(&self, label: &str) -> Result<AppApi> {
        let apps = self.apps()?;
        let url = apps
            .get(label)
            .ok_or_else(|| Error::NotFound(format!("App {} does not exist in bulk api", label)))?;
        Ok(AppApi {
            client: self.clone(),
            label: label.to_string(),
            url: self.inner.session.url(url),
        })
    }

    /// Drop every cached query result
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.inner.cache {
            cache.invalidate();
            info!("query cache cleared");
        }
    }

    /// Register property metadata for `app_label.model_name`
    pub fn register_definition(
        &self,
        app_label: &str,
        model_name: &str,
        definition: ModelDefinition,
    ) -> Result<()> {
        let mut definitions = self
            .inner
            .definitions
            .write()
            .map_err(|_| Error::LockPoisoned)?;
        definitions.insert(definition_key(app_label, model_name), definition);
        Ok(())
    }

    /// Registered property metadata, keyed `app_label.model_name`
    pub fn definitions(&self) -> Result<HashMap<String, ModelDefinition>> {
        let definitions = self
            .inner
            .definitions
            .read()
            .map_err(|_| Error::LockPoisoned)?;
        Ok(definitions.clone())
    }

    /// Property metadata for one model, if registered
    pub fn definition(&self, app_label: &str, model_name: &str) -> Result<Option<ModelDefinition>> {
        let definitions = self
            .inner
            .definitions
            .read()
            .map_err(|_| Error::LockPoisoned)?;
        Ok(definitions
            .get(&definition_key(app_label, model_name))
            .cloned())
    }

    /// Downloader for stored files, sharing this client's transport
    pub fn file_downloader(&self) -> FileDownloader {
        FileDownloader::new(self.inner.session.clone())
    }

    /// Download a stored file into `dest_dir`; see [`FileDownloader::download`]
    pub fn download_file(
        &self,
        file_name: &str,
        dest_dir: &Path,
        local_name: Option<&str>,
    ) -> Result<PathBuf> {
        self.file_downloader()
            .download(file_name, dest_dir, local_name)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .inner
            .session
            .execute(HttpRequest::new(Method::Get, url))?;
        response.json_body()
    }

    fn model_urls(&self, app: &AppApi) -> Result<BTreeMap<String, String>> {
        {
            let urls = self
                .inner
                .model_urls
                .read()
                .map_err(|_| Error::LockPoisoned)?;
            if let Some(models) = urls.get(&app.label) {
                return Ok(models.clone());
            }
        }
        let models: BTreeMap<String, String> = self.get_json(&app.url)?;
        debug!(app = %app.label, count = models.len(), "loaded model list");
        let mut urls = self
            .inner
            .model_urls
            .write()
            .map_err(|_| Error::LockPoisoned)?;
        urls.insert(app.label.clone(), models.clone());
        Ok(models)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.config().api_url)
            .field("cached", &self.inner.cache.is_some())
            .finish()
    }
}

fn definition_key(app_label: &str, model_name: &str) -> String {
    format!("{}.{}", app_label, model_name.to_lowercase())
}

/// One app of the API
#[derive(Debug, Clone)]
pub struct AppApi {
    client: Client,
    label: String,
    url: String,
}

impl AppApi {
    /// App label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Absolute app url
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Map of model name to model url, fetched once per app
    pub fn models(&self) -> Result<BTreeMap<String, String>> {
        self.client.model_urls(self)
    }

    /// Handle for a model of this app; the name is matched case-insensitively
    pub fn model(&self, name: &str) -> Result<ModelApi> {
        let model_name = name.to_lowercase();
        let models = self.models()?;
        let url = models.get(&model_name).ok_or_else(|| {
            Error::NotFound(format!("Model {} does not exist in bulk api", model_name))
        })?;
        let mut url = self.client.inner.session.url(url);
        if !url.ends_with('/') {
            url.push('/');
        }
        Ok(ModelApi {
            client: self.client.clone(),
            app_label: self.label.clone(),
            model_name,
            url,
            materializer: Materializer::new(),
        })
    }
}

impl fmt::Display for AppApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppAPI: {}", self.label)
    }
}

/// One page of query results with the pagination envelope
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    /// Materialized rows of this page
    pub table: ResultTable,
    /// Total number of matching rows across all pages
    pub count: u64,
    /// Url of the next page
    pub next: Option<String>,
    /// Url of the previous page
    pub previous: Option<String>,
}

/// One model of an app: querying and object access
#[derive(Debug, Clone)]
pub struct ModelApi {
    client: Client,
    app_label: String,
    model_name: String,
    url: String,
    materializer: Materializer,
}

impl ModelApi {
    /// Label of the owning app
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// Lower-cased model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Absolute model url, ending with `/`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client this model belongs to
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Treat the given output columns as file fields: query results carry
    /// only their stored file name.
    pub fn with_file_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materializer = self.materializer.with_file_fields(fields);
        self
    }

    /// Registered property metadata of this model
    pub fn definition(&self) -> Result<Option<ModelDefinition>> {
        self.client.definition(&self.app_label, &self.model_name)
    }

    /// Run a query and collect every page, starting at `options.page`.
    ///
    /// Results are served from and stored in the client's cache unless
    /// `options.skip_cache` is set.
    pub fn query(&self, options: &QueryOptions) -> Result<ResultTable> {
        let mut params = self.compile(options)?;
        let endpoint = self.query_url();
        let key = CacheKey::new(&endpoint, &params);
        let cache = match self.client.inner.cache {
            Some(ref cache) if !options.skip_cache => Some(cache),
            _ => None,
        };

        if let Some(cache) = cache {
            if let Some(table) = cache.get(&key) {
                debug!(model = %self, key = %key, rows = table.len(), "query served from cache");
                return Ok(table);
            }
        }

        let mut table = ResultTable::default();
        let mut page_number = options.page;
        loop {
            params.set("page", Value::from(page_number));
            let page = self.fetch_page(&endpoint, &params)?;
            debug!(
                model = %self,
                page = page_number,
                rows = page.results.len(),
                count = page.count,
                "fetched query page"
            );
            let has_next = page.has_next();
            table.append(
                self.materializer
                    .materialize(&page.results, options.fields.as_ref()),
            );
            if !has_next {
                break;
            }
            page_number += 1;
        }

        if let Some(cache) = cache {
            cache.put(key, table.clone());
        }
        Ok(table)
    }

    /// Fetch only the page named by `options.page`. Never cached.
    pub fn query_page(&self, options: &QueryOptions) -> Result<QueryPage> {
        let params = self.compile(options)?;
        let page = self.fetch_page(&self.query_url(), &params)?;
        Ok(QueryPage {
            table: self
                .materializer
                .materialize(&page.results, options.fields.as_ref()),
            count: page.count,
            next: page.next,
            previous: page.previous,
        })
    }

    /// Objects on one page of the plain listing endpoint
    pub fn list(&self, page: usize) -> Result<Vec<ModelObj>> {
        if page == 0 {
            return Err(Error::InvalidPagination {
                name: "page",
                value: 0,
            });
        }
        let request = HttpRequest::new(Method::Get, self.url.clone()).with_param("page", page);
        let response = self.client.inner.session.execute(request)?;
        let page = Page::from_slice(&response.body)?;
        page.results
            .into_iter()
            .map(|data| {
                let uri = self.object_uri(&data)?;
                Ok(ModelObj::loaded(self.clone(), uri, data))
            })
            .collect()
    }

    /// Fetch one object by primary key
    pub fn get<K: fmt::Display>(&self, pk: K) -> Result<ModelObj> {
        let uri = format!("{}{}", self.url, pk);
        let data = self.fetch(&uri)?;
        Ok(ModelObj::loaded(self.clone(), uri, data))
    }

    /// Create an object from `data` and return it as stored by the server
    pub fn create(&self, data: &Map<String, Value>) -> Result<ModelObj> {
        let request =
            HttpRequest::new(Method::Post, self.url.clone()).with_json(&Value::Object(data.clone()))?;
        let response = self.client.inner.session.execute(request)?;
        let data: Map<String, Value> = response.json_body()?;
        let uri = self.object_uri(&data)?;
        info!(model = %self, uri = %uri, "created object");
        Ok(ModelObj::loaded(self.clone(), uri, data))
    }

    /// Write `data` to the object at `uri`: a partial update when `patch`,
    /// else a full replacement. Returns the stored object data.
    pub fn update(&self, uri: &str, data: &Map<String, Value>, patch: bool) -> Result<Map<String, Value>> {
        let method = if patch { Method::Patch } else { Method::Put };
        let request = HttpRequest::new(method, self.client.inner.session.url(uri))
            .with_json(&Value::Object(data.clone()))?;
        let response = self.client.inner.session.execute(request)?;
        if response.status != 200 {
            return Err(Error::Api {
                status: response.status,
                body: format!("update not successful; {}", response.text()),
            });
        }
        debug!(model = %self, uri = %uri, method = %method, "updated object");
        response.json_body()
    }

    /// Delete the object at `uri`. The server must answer `204 No Content`.
    pub fn delete(&self, uri: &str) -> Result<()> {
        let request = HttpRequest::new(Method::Delete, self.client.inner.session.url(uri));
        let response = self.client.inner.session.execute(request)?;
        if response.status != 204 {
            return Err(Error::Api {
                status: response.status,
                body: format!("delete not successful; {}", response.text()),
            });
        }
        info!(model = %self, uri = %uri, "deleted object");
        Ok(())
    }

    /// Handle for the object at `uri`; its data is fetched on first access
    pub fn object<S: Into<String>>(&self, uri: S) -> ModelObj {
        ModelObj {
            model: self.clone(),
            uri: uri.into(),
            data: None,
            related: HashMap::new(),
        }
    }

    fn compile(&self, options: &QueryOptions) -> Result<QueryParams> {
        match (options.page_size, self.client.config().page_size) {
            (None, Some(page_size)) => {
                let options = options.clone().with_page_size(page_size);
                self.client.inner.compiler.compile(&options)
            }
            _ => self.client.inner.compiler.compile(options),
        }
    }

    fn query_url(&self) -> String {
        format!("{}query", self.url)
    }

    fn fetch_page(&self, endpoint: &str, params: &QueryParams) -> Result<Page> {
        let request = HttpRequest::new(Method::Post, endpoint).with_json(&params.to_json())?;
        let response = self.client.inner.session.execute(request)?;
        Page::from_slice(&response.body)
    }

    fn fetch(&self, uri: &str) -> Result<Map<String, Value>> {
        self.client.get_json(&self.client.inner.session.url(uri))
    }

    fn object_uri(&self, data: &Map<String, Value>) -> Result<String> {
        match data.get("id") {
            Some(Value::String(id)) => Ok(format!("{}{}", self.url, id)),
            Some(Value::Number(id)) => Ok(format!("{}{}", self.url, id)),
            _ => Err(Error::Serialization(format!(
                "{} object has no usable 'id'",
                self
            ))),
        }
    }
}

impl fmt::Display for ModelApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelAPI: {}.{}", self.app_label, self.model_name)
    }
}

/// One object of a model, addressed by its uri
#[derive(Debug, Clone)]
pub struct ModelObj {
    model: ModelApi,
    uri: String,
    data: Option<Map<String, Value>>,
    related: HashMap<String, ModelObj>,
}

impl ModelObj {
    fn loaded(model: ModelApi, uri: String, data: Map<String, Value>) -> Self {
        Self {
            model,
            uri,
            data: Some(data),
            related: HashMap::new(),
        }
    }

    /// Object uri
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Model this object belongs to
    pub fn model(&self) -> &ModelApi {
        &self.model
    }

    /// True once the object data has been fetched
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Object data, fetched on first access
    pub fn data(&mut self) -> Result<&Map<String, Value>> {
        Ok(&*self.data_mut()?)
    }

    /// Fetch the object data again
    pub fn refresh(&mut self) -> Result<()> {
        self.data = Some(self.model.fetch(&self.uri)?);
        self.related.clear();
        Ok(())
    }

    /// Value of one field; `None` if the object has no such field
    pub fn field(&mut self, name: &str) -> Result<Option<Value>> {
        Ok(self.data()?.get(name).cloned())
    }

    /// Set one field locally. Read-only and related fields are rejected;
    /// use [`ModelObj::set_related`] for the latter.
    pub fn set_field<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        if let Some(property) = self.property(name)? {
            if property.read_only {
                return Err(Error::ReadOnlyField(name.to_string()));
            }
            if property.is_related() {
                return Err(Error::InvalidOperation(format!(
                    "'{}' references another object; set it with a ModelObj",
                    name
                )));
            }
        }
        self.data_mut()?.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Point a related field at `other`
    pub fn set_related(&mut self, name: &str, other: &ModelObj) -> Result<()> {
        if let Some(property) = self.property(name)? {
            if property.read_only {
                return Err(Error::ReadOnlyField(name.to_string()));
            }
        }
        self.data_mut()?
            .insert(name.to_string(), Value::String(other.uri.clone()));
        self.related.insert(name.to_string(), other.clone());
        Ok(())
    }

    /// Object referenced by a related field; `None` when the field is null
    pub fn related(&mut self, name: &str) -> Result<Option<ModelObj>> {
        if let Some(obj) = self.related.get(name) {
            return Ok(Some(obj.clone()));
        }
        if let Some(property) = self.property(name)? {
            if !property.is_related() {
                return Err(Error::InvalidOperation(format!(
                    "'{}' is not a related field",
                    name
                )));
            }
        }
        let uri = match self.field(name)? {
            Some(Value::String(uri)) => uri,
            Some(Value::Null) | None => return Ok(None),
            Some(other) => {
                return Err(Error::InvalidOperation(format!(
                    "'{}' does not hold an object uri: {}",
                    name, other
                )))
            }
        };
        let (app_label, model_name) = split_object_uri(&uri).ok_or_else(|| {
            Error::InvalidOperation(format!("'{}' is not an object uri", uri))
        })?;
        let model = self.model.client.app(app_label)?.model(model_name)?;
        let obj = model.object(uri.clone());
        self.related.insert(name.to_string(), obj.clone());
        Ok(Some(obj))
    }

    /// Write the full local data back to the server
    pub fn save(&mut self) -> Result<()> {
        let data = self.data_mut()?.clone();
        let stored = self.model.update(&self.uri, &data, false)?;
        self.data = Some(stored);
        Ok(())
    }

    /// Partially update the object and adopt the server's copy
    pub fn update(&mut self, data: &Map<String, Value>) -> Result<()> {
        let stored = self.model.update(&self.uri, data, true)?;
        self.data = Some(stored);
        self.related.clear();
        Ok(())
    }

    /// Delete the object on the server
    pub fn delete(self) -> Result<()> {
        self.model.delete(&self.uri)
    }

    fn data_mut(&mut self) -> Result<&mut Map<String, Value>> {
        if self.data.is_none() {
            self.data = Some(self.model.fetch(&self.uri)?);
        }
        self.data
            .as_mut()
            .ok_or_else(|| Error::InvalidOperation(format!("no data for {}", self.uri)))
    }

    fn property(&self, name: &str) -> Result<Option<PropertyDefinition>> {
        Ok(self
            .model
            .definition()?
            .and_then(|definition| definition.property(name).cloned()))
    }
}

impl fmt::Display for ModelObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelObj: {}", self.uri)
    }
}

/// Related objects are sent as their uri
impl From<&ModelObj> for Value {
    fn from(obj: &ModelObj) -> Self {
        Value::String(obj.uri.clone())
    }
}

/// App label and model name of an object uri `.../<app>/<model>/<id>`
fn split_object_uri(uri: &str) -> Option<(&str, &str)> {
    let path = match uri.find("://") {
        Some(i) => uri[i + 3..].split_once('/').map_or("", |(_, p)| p),
        None => uri,
    };
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let _id = segments.next()?;
    let model = segments.next()?;
    let app = segments.next()?;
    Some((app, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_object_uri() {
        assert_eq!(
            split_object_uri("https://data-warehouse.pivot/bulk/api/pivotal/location/12"),
            Some(("pivotal", "location"))
        );
        assert_eq!(
            split_object_uri("/bulk/api/pivotal/location/12/"),
            Some(("pivotal", "location"))
        );
        assert_eq!(split_object_uri("http://host/12"), None);
    }

    #[test]
    fn test_model_definition_from_json() {
        let definition = ModelDefinition::from_json(&json!({
            "properties": {
                "id": {"type": "integer", "readOnly": true},
                "location": {"type": "string", "format": "uri"},
                "text": {"type": "string"}
            }
        }))
        .unwrap();
        assert!(definition.property("id").unwrap().read_only);
        assert!(definition.property("location").unwrap().is_related());
        assert!(!definition.property("text").unwrap().is_related());
        assert!(definition.property("missing").is_none());
    }
}
