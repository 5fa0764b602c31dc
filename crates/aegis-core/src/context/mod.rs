//! Retrieval of context passages for prompts
//!
//! The assistant grounds its analysis in passages retrieved from the policy
//! guidelines and the document corpus. Retrieval sits behind the
//! [`ContextProvider`] trait so the lexical in-memory provider here can be
//! swapped for an external similarity-search service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AegisError;

pub mod in_memory;
pub mod splitter;

pub use in_memory::InMemoryContextProvider;
pub use splitter::TextSplitter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub source: String,
    pub score: f32,
}

impl Passage {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score: 0.0,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }
}

#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Passages most relevant to `query`, best first, at most `top_k` of them
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, AegisError>;
}

/// Passage texts separated by a blank line, in retrieval order.
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|passage| passage.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Trims and lowercases; a missing value becomes the empty string.
pub fn clean_text(text: Option<&str>) -> String {
    text.map(|value| value.trim().to_lowercase())
        .unwrap_or_default()
}
