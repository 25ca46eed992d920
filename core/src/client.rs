//! Request building, response decoding, and execution.
//!
//! # Design
//! `Client` owns the configuration and a `Transport`. Building
//! (`new_request`) and decoding (`parse_response`) are pure and never touch
//! the network; `execute` joins them with one blocking round-trip through the
//! transport. Setters take `&mut self`, so configuration cannot change while a
//! call borrowing the client is in flight.

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::devices::Devices;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{Envelope, Response, STATUS_OK};

/// Outer `{"request": ...}` wrapper every payload is sent in.
#[derive(Serialize)]
struct RequestBody<'a, B: ?Sized> {
    request: &'a B,
}

/// Client for the Pushwoosh JSON API.
#[derive(Debug, Clone)]
pub struct Client<T = UreqTransport> {
    application: String,
    auth_token: String,
    base_url: String,
    user_agent: String,
    transport: T,
}

impl Client<UreqTransport> {
    /// Client for `application` with the default endpoint, user agent and a
    /// default `ureq` agent.
    pub fn new(application: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(application))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::default())
    }
}

impl<T> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            application: config.application,
            auth_token: config.auth_token,
            base_url: config.base_url,
            user_agent: config.user_agent,
            transport,
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn set_application(&mut self, application: impl Into<String>) {
        self.application = application.into();
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn set_auth_token(&mut self, auth_token: impl Into<String>) {
        self.auth_token = auth_token.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the endpoint. Request paths are joined onto this URL's path.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Device operations bound to this client.
    pub fn devices(&self) -> Devices<'_, T> {
        Devices::new(self)
    }

    /// Build a request for `path` under the base URL.
    ///
    /// A payload is sent as `{"request": <body>}`; `None` yields a request
    /// without a body.
    pub fn new_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.resolve(path)?;

        let mut headers = vec![("user-agent".to_string(), self.user_agent.clone())];
        let body = match body {
            Some(payload) => {
                let json = serde_json::to_string(&RequestBody { request: payload })
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(json)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        })
    }

    /// Decode a transport response into the envelope type `R`.
    ///
    /// Non-200 transport statuses and non-200 embedded statuses are errors;
    /// both carry the decoded (or synthesized) envelope.
    pub fn parse_response<R: Envelope>(&self, response: HttpResponse) -> Result<R, ApiError> {
        let decoded = serde_json::from_str::<R>(&response.body);

        if i64::from(response.status) != STATUS_OK {
            let status_line = response.status_line();
            let mut envelope = match decoded {
                Ok(envelope) => envelope.envelope().clone(),
                Err(_) => Response {
                    status: i64::from(response.status),
                    message: status_line.clone(),
                    raw: None,
                },
            };
            envelope.raw = Some(response);
            warn!(status = %status_line, code = envelope.status, "HTTP request failed");
            return Err(ApiError::Http {
                status_line,
                response: Box::new(envelope),
            });
        }

        let mut envelope = decoded.map_err(|e| ApiError::Deserialization(e.to_string()))?;
        envelope.envelope_mut().raw = Some(response);

        let base = envelope.envelope();
        if !base.is_ok() {
            warn!(code = base.status, message = %base.message, "provider rejected request");
            return Err(ApiError::Provider(Box::new(base.clone())));
        }
        debug!(code = base.status, message = %base.message, "request succeeded");
        Ok(envelope)
    }

    fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(self.base_url.clone()));
        }
        let joined = join_paths(url.path(), path);
        url.set_path(&joined);
        Ok(url)
    }
}

impl<T: Transport> Client<T> {
    /// Send `request` and decode the reply into `R`.
    pub fn execute<R: Envelope>(&self, request: &HttpRequest) -> Result<R, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "executing request");
        let response = self.transport.execute(request)?;
        self.parse_response(response)
    }
}

/// Join two URL paths into one absolute, cleaned path.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment, so
/// `"/json/1.3/"` and `"/registerDevice"` give `"/json/1.3/registerDevice"`.
fn join_paths(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
    use crate::test_support::StubTransport;
    use crate::types::TagsResponse;

    fn client() -> Client<StubTransport> {
        Client::with_transport(ClientConfig::new("APP"), StubTransport::default())
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn new_client_uses_defaults() {
        let c = Client::new("APP");
        assert_eq!(c.base_url(), DEFAULT_BASE_URL);
        assert_eq!(c.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(c.application(), "APP");
        assert_eq!(c.auth_token(), "");
    }

    #[test]
    fn setters_replace_configuration() {
        let mut c = client();
        c.set_application("OTHER");
        c.set_auth_token("token");
        c.set_base_url("http://localhost:3000/json/1.3/");
        c.set_user_agent("tests/1");
        assert_eq!(c.application(), "OTHER");
        assert_eq!(c.auth_token(), "token");
        assert_eq!(c.base_url(), "http://localhost:3000/json/1.3/");
        assert_eq!(c.user_agent(), "tests/1");
    }

    #[test]
    fn new_request_wraps_payload_and_joins_path() {
        #[derive(Serialize)]
        struct Payload {
            testfield: &'static str,
        }

        let req = client()
            .new_request(HttpMethod::Post, "/foo", Some(&Payload { testfield: "test value" }))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{DEFAULT_BASE_URL}foo"));
        assert_eq!(req.header("user-agent"), Some(DEFAULT_USER_AGENT));
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"request": {"testfield": "test value"}}));
    }

    #[test]
    fn new_request_without_payload_has_no_body() {
        let req = client().new_request::<()>(HttpMethod::Post, "/", None).unwrap();
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
        assert_eq!(req.url, "https://cp.pushwoosh.com/json/1.3");
    }

    #[test]
    fn new_request_rejects_non_string_map_keys() {
        let mut invalid = BTreeMap::new();
        invalid.insert((1, 1), 1);
        let err = client()
            .new_request(HttpMethod::Get, "/", Some(&invalid))
            .unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn new_request_rejects_invalid_base_url() {
        let mut c = client();
        c.set_base_url("not a url");
        let err = c.new_request::<()>(HttpMethod::Post, "/setBadge", None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn base_url_path_is_kept_when_joining() {
        let mut c = client();
        c.set_base_url("http://127.0.0.1:8080/json/1.3");
        let req = c.new_request::<()>(HttpMethod::Post, "registerDevice", None).unwrap();
        assert_eq!(req.url, "http://127.0.0.1:8080/json/1.3/registerDevice");

        c.set_base_url("http://127.0.0.1:8080");
        let req = c.new_request::<()>(HttpMethod::Post, "/", None).unwrap();
        assert_eq!(req.url, "http://127.0.0.1:8080/");
    }

    #[test]
    fn join_paths_cleans_segments() {
        assert_eq!(join_paths("/json/1.3/", "/registerDevice"), "/json/1.3/registerDevice");
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("/a/b", "../c"), "/a/c");
        assert_eq!(join_paths("/a//b/", "./c"), "/a/b/c");
    }

    #[test]
    fn parse_success_keeps_raw_response() {
        let resp: Response = client()
            .parse_response(response(200, r#"{"status_code":200,"status_message":"foo"}"#))
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.message, "foo");
        assert_eq!(resp.raw.as_ref().map(|r| r.status), Some(200));
    }

    #[test]
    fn parse_provider_error_returns_envelope() {
        let err = client()
            .parse_response::<Response>(response(
                200,
                r#"{"status_code":210,"status_message":"foo"}"#,
            ))
            .unwrap_err();
        assert_eq!(err.to_string(), "(Code: 210) foo");
        let resp = err.response().unwrap();
        assert_eq!(resp.status, 210);
        assert_eq!(resp.message, "foo");
        assert!(resp.raw.is_some());
    }

    #[test]
    fn parse_http_error_with_plain_body_uses_status_line() {
        let err = client()
            .parse_response::<Response>(response(500, "foo\n"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { .. }));
        assert_eq!(err.to_string(), "500 Internal Server Error");
        let resp = err.response().unwrap();
        assert_eq!(resp.status, 500);
        assert_ne!(resp.message, "foo");
    }

    #[test]
    fn parse_http_error_with_json_body_keeps_embedded_status() {
        let err = client()
            .parse_response::<TagsResponse>(response(
                500,
                r#"{"status_code":514,"status_message":"foo"}"#,
            ))
            .unwrap_err();
        let resp = err.response().unwrap();
        assert_eq!(resp.status, 514);
        assert_eq!(resp.message, "foo");
    }

    #[test]
    fn parse_invalid_json_on_success_status() {
        let err = client()
            .parse_response::<Response>(response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
        assert!(err.response().is_none());
    }

    #[test]
    fn execute_sends_through_transport() {
        let c = client();
        c.transport()
            .reply(200, r#"{"status_code":200,"status_message":"OK"}"#);
        let req = c.new_request::<()>(HttpMethod::Post, "/", None).unwrap();
        let resp: Response = c.execute(&req).unwrap();
        assert_eq!(resp.message, "OK");
        assert_eq!(c.transport().requests(), vec![req]);
    }

    #[test]
    fn execute_propagates_transport_failure() {
        let c = client();
        c.transport().fail("connection refused");
        let req = c.new_request::<()>(HttpMethod::Post, "/", None).unwrap();
        let err = c.execute::<Response>(&req).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
