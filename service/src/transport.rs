//! Executing `HttpRequest`s over the network.
//!
//! # Design
//! `Transport` is the seam between the deterministic core and real I/O:
//! `ReqwestTransport` sends one request, `Retrying` wraps any transport with
//! the core's `RetryPolicy`. Tests swap in scripted transports.

use std::future::Future;

use reqwest::Method;
use userlist_core::{HttpMethod, HttpRequest, HttpResponse, RetryPolicy};

use crate::config::Config;
use crate::error::TransportError;

pub trait Transport: Send + Sync + 'static {
    /// Send one request. Any received response, whatever its status, is
    /// `Ok`.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self::new(http))
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), &request.path);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
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
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Re-sends a request after retryable transport failures, sleeping between
/// attempts as the policy dictates. Received responses are never retried.
///
/// Only `send` failures are retried; once a status line has arrived, a
/// failed body read is returned as is. Every method is retried, POST
/// included: a create whose response was lost before the status line, after
/// the server stored it, can be submitted twice.
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<T: Transport> Transport for Retrying<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut attempt = 1;
        loop {
            let err = match self.inner.execute(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            let Some(delay) = self.policy.delay_after(attempt) else {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    attempts = attempt,
                    error = %err,
                    "giving up after transport failures"
                );
                return Err(err);
            };

            tracing::warn!(
                method = %request.method,
                path = %request.path,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transport failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
