//! HTTP transport types and the sender seam.
//!
//! # Design
//! Requests and responses are plain data. The client builds an `HttpRequest`,
//! hands it to an `HttpSender`, and classifies the `HttpResponse` it gets
//! back. `ReqwestSender` is the production sender; tests plug in scripted
//! senders without touching the network.
//!
//! Header lists keep configuration order and may repeat a name. Senders
//! apply them in order, so the last value for a name wins.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{ApiError, ApiResult};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Write-style methods carry their payload as a JSON body; the others
    /// carry it as query parameters.
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Last value configured for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status code and canonical reason, e.g. `500 Internal Server Error`.
    pub fn status_line(&self) -> String {
        match reqwest::StatusCode::from_u16(self.status) {
            Ok(status) => status.to_string(),
            Err(_) => self.status.to_string(),
        }
    }
}

/// Executes one HTTP round-trip.
///
/// Implementations must not interpret the status code: every response the
/// server produced, including 4xx and 5xx, is returned as `Ok`. Only
/// failures to obtain a response are errors, reported as
/// [`ApiError::Transport`].
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse>;
}

/// `HttpSender` backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn transport<E>(err: E) -> ApiError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ApiError::Transport(Box::new(err))
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(transport)?;
            let value = HeaderValue::from_str(value).map_err(transport)?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(transport)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
