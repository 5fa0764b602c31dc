//! Text generation against a local language-model server.
//!
//! The server speaks the Ollama `/api/generate` protocol: a JSON request with
//! `model`, `prompt` and `stream`, answered either by one JSON object or by a
//! newline-delimited sequence of objects, each carrying the next piece of text
//! in its `response` field.

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::errors::AegisError;

pub mod aggregator;
pub mod ollama;

pub use aggregator::{drain, render_failure, render_failures, Transcript, ERROR_MARKER};
pub use ollama::OllamaClient;

/// Lazy, finite, non-restartable sequence of generated text fragments.
///
/// A failure is delivered as an `Err` item and is always the last item.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AegisError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// One decoded record of a generation response.
///
/// Unknown fields (timings, context tokens, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationChunk {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Check that the server is reachable before talking to it
    async fn health_check(&self) -> Result<(), AegisError>;

    /// Send the request with streaming disabled and return the whole answer
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AegisError>;

    /// Send the request with streaming enabled and yield fragments as they arrive
    async fn stream(&self, request: &GenerationRequest) -> FragmentStream;
}
