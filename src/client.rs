//! HTTP request plumbing shared by the token manager and key client

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{KpError, Result};

/// Request body forms used against the remote APIs
#[derive(Debug, Clone)]
pub enum RequestBody {
    None,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A single request to execute
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::None,
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

/// A response as observed on the wire
///
/// Headers are kept raw here; redaction happens at the point the response
/// leaves the process as an error or a log line.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| KpError::invalid_response(format!("invalid response body: {}", e)))
    }

    /// Convert a non-2xx response into the API error variant
    ///
    /// The error carries the status, reason phrase, the complete header
    /// list with `authorization` redacted, and the raw body.
    pub fn ensure_success(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(KpError::api(
                self.status,
                self.reason.clone(),
                redact_headers(&self.headers),
                self.text(),
            ))
        }
    }
}

/// Transport seam for executing requests
///
/// The production implementation is [`HttpTransport`]; tests substitute a
/// recording mock. Transport errors (DNS, TLS, timeouts) surface as
/// network errors; any completed exchange returns `Ok`, including non-2xx.
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    trace_requests: bool,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout));

        if !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            trace_requests: config.trace_requests,
        })
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!("{} {}", request.method, request.url);
        if self.trace_requests {
            trace!("{}", curl_command(&request));
        }

        let mut builder = self.client.request(request.method.clone(), &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        match &request.body {
            RequestBody::None => {}
            RequestBody::Json(value) => builder = builder.json(value),
            RequestBody::Form(fields) => builder = builder.form(fields),
        }

        let response = builder.send().await?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!("response: {} {}", status.as_u16(), reason);

        Ok(ApiResponse {
            status: status.as_u16(),
            reason,
            headers,
            body,
        })
    }
}

/// Copy a header list with any `authorization` value replaced
pub fn redact_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("authorization") {
                (name.clone(), "REDACTED".to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

/// Render a request as an equivalent curl invocation
///
/// Headers are redacted before rendering; this output is only ever emitted
/// at trace level behind the `trace_requests` flag.
pub fn curl_command(request: &ApiRequest) -> String {
    let mut parts = vec![format!("curl -v -X{}", request.method)];

    for (name, value) in redact_headers(&request.headers) {
        parts.push(format!("-H \"{}: {}\"", name, value));
    }

    let url = if request.query.is_empty() {
        request.url.clone()
    } else {
        let query = request
            .query
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", request.url, query)
    };
    parts.push(format!("\"{}\"", url));

    parts.join(" ")
}
