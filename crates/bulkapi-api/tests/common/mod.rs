#![allow(dead_code)]

use bulkapi::{Client, ClientConfig, HttpRequest, HttpResponse, Method, Result, Transport};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const API_URL: &str = "http://test.org/api/";
pub const APP_URL: &str = "http://test.org/api/pivotpoll/";
pub const MODEL_URL: &str = "http://test.org/api/pivotpoll/question/";
pub const QUERY_URL: &str = "http://test.org/api/pivotpoll/question/query";

/// Transport answering from canned responses and recording every request.
///
/// Several responses registered for the same route are returned in order;
/// the last one is repeated once the others are used up.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, url: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn on_json(&self, method: Method, url: &str, body: Value) {
        self.on(method, url, HttpResponse::json(200, &body));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url == url)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let queue = match routes.get_mut(&(request.method, request.url.clone())) {
            Some(queue) => queue,
            None => return Ok(HttpResponse::new(404, "{\"detail\": \"Not found.\"}")),
        };
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(response.unwrap_or_else(|| HttpResponse::empty(404)))
    }
}

/// Paged response envelope
pub fn page(results: Value, next: Option<&str>) -> Value {
    let count = results.as_array().map_or(0, |r| r.len());
    json!({
        "count": count,
        "next": next,
        "previous": null,
        "results": results,
    })
}

/// Transport with the app and model maps already routed
pub fn mock_api() -> Arc<MockTransport> {
    let transport = MockTransport::new();
    transport.on_json(Method::Get, API_URL, json!({"pivotpoll": APP_URL}));
    transport.on_json(
        Method::Get,
        APP_URL,
        json!({
            "question": "/api/pivotpoll/question/",
            "answer": "pivotpoll/answer/"
        }),
    );
    transport
}

pub fn config() -> ClientConfig {
    ClientConfig::new("test-token").with_api_url(API_URL)
}

pub fn client(transport: &Arc<MockTransport>) -> Client {
    Client::new(config(), Arc::clone(transport)).unwrap()
}
