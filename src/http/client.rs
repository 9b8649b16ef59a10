//! Outbound backend client.
//!
//! # Responsibilities
//! - Transmit a signed request to its resolved origin
//! - Buffer the full response body
//! - Classify transport failures (timeout, connect, other)
//!
//! # Design Decisions
//! - One attempt per request; no retries, no redirects followed
//! - The invocation deadline covers headers and body
//! - Connection pool shared by all requests; no per-request state

use std::time::Instant;

use reqwest::redirect::Policy;
use thiserror::Error;

use crate::http::response::BackendResponse;
use crate::resilience::InvocationBudget;
use crate::signing::SignedRequest;

/// Network-level failure after the call was attempted.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("backend call exceeded {0} ms")]
    Timeout(u128),

    #[error("cannot connect to backend: {0}")]
    Connect(String),

    #[error("backend transport error: {0}")]
    Transport(String),
}

impl InvocationError {
    fn from_reqwest(error: reqwest::Error, budget: &InvocationBudget) -> Self {
        if error.is_timeout() {
            InvocationError::Timeout(budget.invocation().as_millis())
        } else if error.is_connect() {
            InvocationError::Connect(error.to_string())
        } else {
            InvocationError::Transport(error.to_string())
        }
    }
}

/// Error building the client.
#[derive(Debug, Error)]
#[error("failed to build backend client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// HTTP client for backend invocation endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    budget: InvocationBudget,
}

impl BackendClient {
    pub fn new(budget: InvocationBudget) -> Result<Self, ClientBuildError> {
        let client = reqwest::Client::builder()
            .connect_timeout(budget.connect())
            .timeout(budget.invocation())
            .redirect(Policy::none())
            .no_proxy()
            .use_rustls_tls()
            .build()?;
        Ok(Self { client, budget })
    }

    pub fn budget(&self) -> &InvocationBudget {
        &self.budget
    }

    /// Send `request` and wait for the complete response.
    pub async fn invoke(&self, request: SignedRequest) -> Result<BackendResponse, InvocationError> {
        let (method, url, headers, body) = request.into_parts();
        let started = Instant::now();

        let call = async {
            let response = self
                .client
                .request(method, url)
                .headers(headers)
                .body(body)
                .send()
                .await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        let (status, headers, body) = match self.budget.run(call).await {
            Ok(Ok(parts)) => parts,
            Ok(Err(e)) => return Err(InvocationError::from_reqwest(e, &self.budget)),
            Err(_) => return Err(InvocationError::Timeout(self.budget.invocation().as_millis())),
        };

        Ok(BackendResponse {
            status,
            headers,
            body,
            latency: started.elapsed(),
        })
    }
}
