use async_stream::stream;
use async_trait::async_trait;
use futures_util::stream::TryStreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use super::{FragmentStream, GenerationChunk, GenerationRequest, Generator};
use crate::config::GenerationConfig;
use crate::errors::{describe_request_error, AegisError};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for an Ollama-compatible `/api/generate` endpoint
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.base_url.clone()).with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn health_check(&self) -> Result<(), AegisError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                log::error!("Generation service at {} is not reachable: {}", self.base_url, e);
                AegisError::from(e)
            })?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, AegisError> {
        let payload = request.clone().with_stream(false);
        let url = self.generate_url();
        log::debug!("Sending non-streaming request for model {} to {}", payload.model, url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("HTTP request to generation service failed: {}", e);
                AegisError::from(e)
            })?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        parse_full_response(&body)
    }

    async fn stream(&self, request: &GenerationRequest) -> FragmentStream {
        let payload = request.clone().with_stream(true);
        let url = self.generate_url();
        log::debug!("Sending streaming request for model {} to {}", payload.model, url);

        let pending = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send();

        Box::pin(stream! {
            let response = match pending.await {
                Ok(response) => response,
                Err(e) => {
                    log::error!("HTTP request to generation service failed: {}", e);
                    yield Err(AegisError::from(e));
                    return;
                }
            };
            let response = match ensure_success(response).await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let body = response
                .bytes_stream()
                .map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::Interrupted, describe_request_error(&e))
                });
            let mut lines = StreamReader::new(body).lines();

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(read_error(e));
                        return;
                    }
                };

                let record = line.trim();
                if record.is_empty() {
                    continue;
                }

                let chunk = match parse_chunk(record) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                if let Some(text) = chunk.response {
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                if chunk.done {
                    log::debug!("Generation service signalled completion");
                    break;
                }
            }
        })
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AegisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    log::error!("Generation service responded with {}: {}", status, body);
    Err(AegisError::TransportError(format!(
        "HTTP {}: {}",
        status,
        body.trim()
    )))
}

fn read_error(err: std::io::Error) -> AegisError {
    if err.kind() == std::io::ErrorKind::InvalidData {
        AegisError::MalformedResponse(err.to_string())
    } else {
        AegisError::TransportError(err.to_string())
    }
}

fn parse_chunk(record: &str) -> Result<GenerationChunk, AegisError> {
    serde_json::from_str(record).map_err(|e| {
        log::error!("Failed to parse response line {:?}: {}", record, e);
        AegisError::MalformedResponse(format!("{}: {}", e, record))
    })
}

fn parse_full_response(body: &str) -> Result<String, AegisError> {
    let value: Value = serde_json::from_str(body.trim())?;
    value
        .get("response")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(AegisError::MissingResponseField)
}
