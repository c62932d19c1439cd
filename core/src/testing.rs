//! In-process senders for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::{Client, Config};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse, HttpSender};

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

pub(crate) fn client_with<S: HttpSender + 'static>(sender: Arc<S>) -> Client {
    let config = Config::default()
        .with_address("http://localhost:8080")
        .with_sender(sender);
    Client::new(config).unwrap()
}

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedSender {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedSender {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpSender for ScriptedSender {
    async fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("connection refused".into()))
    }
}

/// Never answers.
pub(crate) struct PendingSender;

#[async_trait]
impl HttpSender for PendingSender {
    async fn send(&self, _request: &HttpRequest) -> ApiResult<HttpResponse> {
        std::future::pending().await
    }
}

/// Cancels its token, then fails the send.
pub(crate) struct FailingSender {
    cancel: CancellationToken,
}

impl FailingSender {
    pub(crate) fn cancelling(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl HttpSender for FailingSender {
    async fn send(&self, _request: &HttpRequest) -> ApiResult<HttpResponse> {
        self.cancel.cancel();
        Err(ApiError::Transport("connection reset".into()))
    }
}
