//! Core library for Aegis, a local assistant for reading legal documents.
//!
//! Aegis pairs a document with retrieved policy context and sends the composed
//! prompt to a locally running, Ollama-compatible generation server. This crate
//! holds everything except the terminal front-end:
//!
//! - **Generation**: the HTTP client and the streaming aggregator that turns a
//!   newline-delimited JSON body into a lazy sequence of text fragments
//! - **Sessions**: the in-process store of independent conversations
//! - **Context**: the retrieval seam plus a lexical, in-memory provider
//! - **Documents and prompts**: the document folder, uploads and prompt templates
//! - **Configuration**: YAML configuration with environment overrides

pub mod config;
pub mod context;
pub mod core_types;
pub mod documents;
pub mod errors;
pub mod generation;
pub mod prompts;
pub mod session;

pub use config::*;
pub use context::{ContextProvider, InMemoryContextProvider, Passage};
pub use core_types::{Message, Role};
pub use documents::{DocumentLibrary, UploadedDocument};
pub use errors::AegisError;
pub use generation::{FragmentStream, GenerationRequest, Generator, OllamaClient};
pub use session::{Session, SessionId, SessionStore};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
