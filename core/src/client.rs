//! Transport client for the petstore API.
//!
//! # Design
//! `Client` holds the immutable transport configuration: base URL, static
//! headers and the `HttpSender`. It is cheap to clone and safe to share
//! between resource clients. Each call is split the same way:
//! `new_request` builds an `HttpRequest`, `execute` dispatches and
//! classifies it, `parse_json` decodes a successful body.
//!
//! A 504 is resent once, in line, with no backoff. A second 504 is returned
//! to the caller as `GatewayTimeout`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpSender, ReqwestSender};
use crate::pets::Pets;

pub const DEFAULT_ADDRESS: &str = "http://localhost:8080";
pub const DEFAULT_BASE_PATH: &str = "/api/v1";
pub const ADDRESS_ENV: &str = "PETSTORE_ADDRESS";
pub const USER_AGENT: &str = "petstore-sdk-v1";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Transport configuration.
///
/// Passed to [`Client::new`], empty fields fall back to [`Config::from_env`].
#[derive(Clone, Default)]
pub struct Config {
    pub address: String,
    pub base_path: String,
    pub headers: Vec<(String, String)>,
    pub sender: Option<Arc<dyn HttpSender>>,
}

impl Config {
    /// Defaults: address from `PETSTORE_ADDRESS` or `http://localhost:8080`,
    /// base path `/api/v1`, JSON content type and the SDK user agent.
    pub fn from_env() -> Self {
        let address = std::env::var(ADDRESS_ENV)
            .ok()
            .filter(|address| !address.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        Self {
            address,
            base_path: DEFAULT_BASE_PATH.to_string(),
            headers: vec![
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()),
            ],
            sender: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn HttpSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Overlay the non-empty parts of `other` onto `self`. Headers append.
    fn merge(mut self, other: Config) -> Self {
        if !other.address.is_empty() {
            self.address = other.address;
        }
        if !other.base_path.is_empty() {
            self.base_path = other.base_path;
        }
        self.headers.extend(other.headers);
        if other.sender.is_some() {
            self.sender = other.sender;
        }
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("base_path", &self.base_path)
            .field("headers", &self.headers)
            .field("custom_sender", &self.sender.is_some())
            .finish()
    }
}

struct Transport {
    base_url: Url,
    headers: Vec<(String, String)>,
    sender: Arc<dyn HttpSender>,
}

/// Client for the petstore API.
#[derive(Clone)]
pub struct Client {
    transport: Arc<Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.transport.base_url.as_str())
            .field("headers", &self.transport.headers)
            .finish()
    }
}

impl Client {
    /// Build a client from `config` merged over [`Config::from_env`].
    pub fn new(config: Config) -> ApiResult<Self> {
        let config = Config::from_env().merge(config);
        let base_url = parse_base_url(&config.address, &config.base_path)?;
        let sender = config
            .sender
            .unwrap_or_else(|| Arc::new(ReqwestSender::default()));

        debug!(base_url = %base_url, "petstore client configured");
        Ok(Self {
            transport: Arc::new(Transport {
                base_url,
                headers: config.headers,
                sender,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.transport.base_url
    }

    /// Resource client for pets.
    pub fn pets(&self) -> Pets {
        Pets::new(self.clone())
    }

    /// Build a request for `path`, relative to the base URL.
    ///
    /// For read-style methods a payload becomes query parameters, appended
    /// to any query already in `path`. For write-style methods it becomes
    /// the JSON body and the content type is forced to JSON.
    pub fn new_request<T>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&T>,
    ) -> ApiResult<HttpRequest>
    where
        T: Serialize + ?Sized,
    {
        let mut url = self
            .transport
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidAddress(format!("{path}: {e}")))?;

        let mut body = None;
        if let Some(payload) = payload {
            if method.carries_body() {
                let json = serde_json::to_string(payload)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                trace!(body = %json, "request body");
                body = Some(json);
            } else {
                let encoded = serde_urlencoded::to_string(payload)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                    _ => encoded,
                };
                if !query.is_empty() {
                    url.set_query(Some(&query));
                }
            }
        }

        let mut headers = self.transport.headers.clone();
        if method.carries_body() {
            headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
        }

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Send `request` and classify the response, resending once on 504.
    pub async fn execute(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<HttpResponse> {
        let response = self.send(request, cancel).await?;
        match check_response(&response) {
            Ok(()) => Ok(response),
            Err(err) if err.is_retryable() => {
                warn!(method = %request.method, url = %request.url, "gateway timeout, retrying once");
                let response = self.send(request, cancel).await?;
                check_response(&response)?;
                Ok(response)
            }
            Err(err) => Err(err),
        }
    }

    /// [`execute`](Self::execute) then decode the body into `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<T> {
        let response = self.execute(request, cancel).await?;
        parse_json(&response)
    }

    async fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = self.transport.sender.send(request) => result,
        };

        match result {
            Ok(response) => {
                debug!(status = response.status, url = %request.url, "received response");
                Ok(response)
            }
            Err(_) if cancel.is_cancelled() => Err(ApiError::Cancelled),
            Err(err) => Err(err),
        }
    }
}

fn parse_base_url(address: &str, base_path: &str) -> ApiResult<Url> {
    let raw = format!(
        "{}/{}/",
        address.trim_end_matches('/'),
        base_path.trim_matches('/')
    );
    let url = Url::parse(&raw).map_err(|e| ApiError::InvalidAddress(format!("{address}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(ApiError::InvalidAddress(format!(
            "{address}: expected an http(s) URL with a host"
        )));
    }
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct ErrorsPayload {
    #[serde(default)]
    errors: Vec<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub fn check_response(response: &HttpResponse) -> ApiResult<()> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        400 => return Err(ApiError::BadRequest),
        404 => return Err(ApiError::NotFound),
        504 => return Err(ApiError::GatewayTimeout),
        _ => {}
    }

    let errors = match serde_json::from_str::<ErrorsPayload>(&response.body) {
        Ok(payload) if !payload.errors.is_empty() => payload.errors,
        _ => {
            debug!(status = %response.status_line(), "no structured error payload");
            return Err(ApiError::Remote(response.status_line()));
        }
    };

    let message = errors
        .iter()
        .map(|e| {
            if e.detail.is_empty() {
                e.title.clone()
            } else {
                format!("{}\n\n{}", e.title, e.detail)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    Err(ApiError::Remote(message))
}

/// Decode a successful response body as JSON.
pub fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> ApiResult<T> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
