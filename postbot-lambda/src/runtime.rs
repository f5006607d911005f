//! Minimal client for the Lambda custom runtime API and the invocation loop
//! built on it.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::context::JobContext;
use crate::router;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("AWS_LAMBDA_RUNTIME_API is not set")]
    MissingRuntimeApi,

    #[error("Runtime API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Runtime API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invocation is missing the request id header")]
    MissingRequestId,

    #[error("Invocation {request_id} has an unreadable event: {message}")]
    InvalidEvent { request_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub request_id: String,
    pub event: Value,
}

#[derive(Debug, Serialize)]
struct ErrorReport<'a> {
    #[serde(rename = "errorMessage")]
    error_message: &'a str,
    #[serde(rename = "errorType")]
    error_type: &'a str,
}

#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: Client,
    base_url: String,
}

impl RuntimeClient {
    pub fn from_env() -> Result<Self> {
        let api = std::env::var("AWS_LAMBDA_RUNTIME_API")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(RuntimeError::MissingRuntimeApi)?;
        Ok(Self::with_base_url(format!("http://{}", api)))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        // No timeout: `next` long-polls until an event arrives.
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/runtime/{}", self.base_url, API_VERSION, path)
    }

    pub async fn next_invocation(&self) -> Result<Invocation> {
        let response = self.client.get(self.url("invocation/next")).send().await?;
        let response = check(response).await?;

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(RuntimeError::MissingRequestId)?;
        let raw = response.text().await?;
        let event = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw).map_err(|e| RuntimeError::InvalidEvent {
                request_id: request_id.clone(),
                message: e.to_string(),
            })?
        };

        Ok(Invocation { request_id, event })
    }

    pub async fn send_response<T: Serialize + ?Sized>(
        &self,
        request_id: &str,
        body: &T,
    ) -> Result<()> {
        let url = self.url(&format!("invocation/{}/response", request_id));
        check(self.client.post(url).json(body).send().await?).await?;
        Ok(())
    }

    pub async fn send_error(&self, request_id: &str, message: &str) -> Result<()> {
        let url = self.url(&format!("invocation/{}/error", request_id));
        let report = ErrorReport {
            error_message: message,
            error_type: "Runtime.HandlerError",
        };
        check(self.client.post(url).json(&report).send().await?).await?;
        Ok(())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(RuntimeError::Api { status, body })
}

/// Fetch one invocation, run it, report the result.
///
/// Job failures are not runtime errors: they become a 400/500 response
/// body like any other outcome.
pub async fn process_next(runtime: &RuntimeClient, ctx: &JobContext) -> Result<()> {
    let invocation = match runtime.next_invocation().await {
        Ok(invocation) => invocation,
        Err(RuntimeError::InvalidEvent { request_id, message }) => {
            tracing::error!(request_id = %request_id, "Unreadable event: {}", message);
            return runtime.send_error(&request_id, &message).await;
        }
        Err(e) => return Err(e),
    };
    tracing::info!(request_id = %invocation.request_id, "Received invocation");

    let response = router::handle_invocation(&invocation.event, ctx).await;
    tracing::info!(
        request_id = %invocation.request_id,
        status = response.status_code,
        "Invocation finished"
    );

    if let Err(e) = runtime
        .send_response(&invocation.request_id, &response)
        .await
    {
        tracing::error!(request_id = %invocation.request_id, "Failed to send response: {}", e);
        runtime
            .send_error(&invocation.request_id, &e.to_string())
            .await?;
    }
    Ok(())
}

pub async fn run_runtime_loop(
    runtime: RuntimeClient,
    ctx: JobContext,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    tracing::info!(job = %ctx.config.service.job, "Runtime loop started");

    loop {
        tokio::select! {
            res = process_next(&runtime, &ctx) => {
                if let Err(e) = res {
                    tracing::error!("Invocation cycle failed: {}", e);
                    // Runtime API gone or misbehaving: let the platform
                    // restart the process instead of polling it in a tight loop.
                    if matches!(
                        e,
                        RuntimeError::Http(_) | RuntimeError::Api { .. } | RuntimeError::MissingRequestId
                    ) {
                        return Err(e);
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutting down runtime loop...");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbot_core::{InMemoryParameterStore, PostbotConfig};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_next_invocation_reads_request_id_and_event() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2018-06-01/runtime/invocation/next"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Lambda-Runtime-Aws-Request-Id", "req-1")
                    .set_body_json(serde_json::json!({ "job": "headlines" })),
            )
            .mount(&server)
            .await;

        let invocation = RuntimeClient::with_base_url(server.uri())
            .next_invocation()
            .await
            .unwrap();

        assert_eq!(invocation.request_id, "req-1");
        assert_eq!(invocation.event["job"], "headlines");
    }

    #[tokio::test]
    async fn test_missing_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2018-06-01/runtime/invocation/next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let result = RuntimeClient::with_base_url(server.uri())
            .next_invocation()
            .await;
        assert!(matches!(result, Err(RuntimeError::MissingRequestId)));
    }

    #[tokio::test]
    async fn test_unreadable_event_is_reported_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2018-06-01/runtime/invocation/next"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Lambda-Runtime-Aws-Request-Id", "req-3")
                    .set_body_string("{not json"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2018-06-01/runtime/invocation/req-3/error"))
            .and(body_partial_json(serde_json::json!({ "errorType": "Runtime.HandlerError" })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = JobContext::new(
            PostbotConfig::default(),
            Arc::new(InMemoryParameterStore::new()),
        );
        process_next(&RuntimeClient::with_base_url(server.uri()), &ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_process_next_reports_job_failure_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2018-06-01/runtime/invocation/next"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Lambda-Runtime-Aws-Request-Id", "req-2")
                    .set_body_json(serde_json::json!({ "job": "nope" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2018-06-01/runtime/invocation/req-2/response"))
            .and(body_partial_json(serde_json::json!({ "statusCode": 500 })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = JobContext::new(
            PostbotConfig::default(),
            Arc::new(InMemoryParameterStore::new()),
        );
        process_next(&RuntimeClient::with_base_url(server.uri()), &ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_loop_exits_when_next_returns_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2018-06-01/runtime/invocation/next"))
            .respond_with(ResponseTemplate::new(500).set_body_string("runtime broken"))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = JobContext::new(
            PostbotConfig::default(),
            Arc::new(InMemoryParameterStore::new()),
        );
        let (_tx, rx) = broadcast::channel(1);
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_runtime_loop(RuntimeClient::with_base_url(server.uri()), ctx, rx),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(RuntimeError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2018-06-01/runtime/invocation/next"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(30)))
            .mount(&server)
            .await;

        let ctx = JobContext::new(
            PostbotConfig::default(),
            Arc::new(InMemoryParameterStore::new()),
        );
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_runtime_loop(
            RuntimeClient::with_base_url(server.uri()),
            ctx,
            rx,
        ));
        tx.send(()).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
