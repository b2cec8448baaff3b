//! Per-request state shared by every unit of one dispatch.
//!
//! # Responsibilities
//! - Hold the request view units read (method, path, params, query, headers)
//! - Hold collaborator slots (`body`, `cookies`, `session`) and per-request `locals`
//! - Build the response and track whether it has been sent
//!
//! # Design Decisions
//! - Fixed struct instead of an open property bag; `locals` is the only
//!   free-form slot
//! - Startup configuration is read-only here; per-request data lives in `locals`
//! - The first send wins; later sends are logged and ignored

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;

use crate::config::AppConfig;
use crate::dispatch::error::HandlerError;
use crate::dispatch::signal::Signal;
use crate::routing::{split_target, Params};

/// Whether the response has been handed back yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Pending,
    Sent,
}

/// The response being built for a request.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    state: ResponseState,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            state: ResponseState::Pending,
        }
    }
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn is_sent(&self) -> bool {
        self.state == ResponseState::Sent
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// A request body decoded by a body-parsing unit.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(serde_json::Value),
    Form(Params),
    Text(String),
}

/// Everything a handler unit can see and change about one request.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// The target as received, query included.
    pub original_url: String,
    /// Mount prefix of the route currently running.
    pub base_url: String,
    /// Captures of the route currently running.
    pub params: Params,
    pub query: Params,
    pub headers: HeaderMap,
    pub raw_body: Bytes,
    /// Filled by a body-parsing unit.
    pub body: Option<ParsedBody>,
    /// Filled by a cookie-parsing unit.
    pub cookies: BTreeMap<String, String>,
    /// Filled by a session-store unit.
    pub session: Option<serde_json::Map<String, serde_json::Value>>,
    /// Free-form per-request storage for units to share data.
    pub locals: HashMap<String, serde_json::Value>,
    pub request_id: Option<String>,
    config: Arc<AppConfig>,
    response: Response,
    error_in_flight: Option<HandlerError>,
}

impl RequestContext {
    pub fn new(method: Method, target: &str, config: Arc<AppConfig>) -> Self {
        let (path, query) = split_target(target);
        let path = if path.is_empty() { "/" } else { path };

        Self {
            method,
            path: path.to_string(),
            original_url: target.to_string(),
            base_url: String::new(),
            params: Params::new(),
            query: query.map(Params::from_urlencoded).unwrap_or_default(),
            headers: HeaderMap::new(),
            raw_body: Bytes::new(),
            body: None,
            cookies: BTreeMap::new(),
            session: None,
            locals: HashMap::new(),
            request_id: None,
            config,
            response: Response::default(),
            error_in_flight: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A value from the `[settings]` table of the startup configuration.
    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.config.settings.get(key)
    }

    /// The failure currently being routed to error units, if any.
    pub fn error_in_flight(&self) -> Option<&HandlerError> {
        self.error_in_flight.as_ref()
    }

    pub(crate) fn set_error_in_flight(&mut self, err: Option<HandlerError>) {
        self.error_in_flight = err;
    }

    /// A request header as text. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn is_sent(&self) -> bool {
        self.response.is_sent()
    }

    /// Set the response status. Ignored once the response is sent.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if !self.is_sent() {
            self.response.status = status;
        }
        self
    }

    /// Set a response header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        if !self.is_sent() {
            self.response.headers.insert(name, value);
        }
        self
    }

    /// Send `body` and finish the response. Defaults to `text/plain`.
    pub fn send(&mut self, body: impl Into<Bytes>) -> Signal {
        if !self.response.headers.contains_key(header::CONTENT_TYPE) && !self.is_sent() {
            self.response.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        self.finish(Some(body.into()))
    }

    /// Serialize `value` as the JSON response body.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Signal {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.finish(Some(body.into()))
            }
            Err(e) => Signal::Fail(HandlerError::from_error(e)),
        }
    }

    /// Respond with `302 Found` pointing at `location`.
    pub fn redirect(&mut self, location: &str) -> Signal {
        let value = match HeaderValue::from_str(location) {
            Ok(value) => value,
            Err(e) => return Signal::Fail(HandlerError::from_error(e)),
        };
        self.status(StatusCode::FOUND).set_header(header::LOCATION, value);
        self.send(format!("Found. Redirecting to {}", location))
    }

    /// Finish the response with whatever status and headers are set, no body.
    pub fn end(&mut self) -> Signal {
        self.finish(None)
    }

    fn finish(&mut self, body: Option<Bytes>) -> Signal {
        if self.is_sent() {
            tracing::warn!(
                method = %self.method,
                path = %self.path,
                "Response already sent; ignoring second send"
            );
            return Signal::Responded;
        }
        if let Some(body) = body {
            self.response.body = body;
        }
        self.response.state = ResponseState::Sent;
        Signal::Responded
    }
}
