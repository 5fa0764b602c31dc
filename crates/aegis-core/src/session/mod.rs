//! Conversation sessions
//!
//! A session is one independent conversation: its messages, the document the
//! user attached to it, and the name it is listed under. Sessions live for the
//! lifetime of the process and are never persisted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core_types::{Message, Role};
use crate::errors::AegisError;

pub mod store;

pub use store::SessionStore;

pub const DEFAULT_DISPLAY_NAME: &str = "New Chat";

const SESSION_ID_PREFIX: &str = "chat_";

/// Identifier derived from the creation time in milliseconds.
///
/// Ordering by id is ordering by creation time, since the store hands out
/// strictly increasing stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(i64);

impl SessionId {
    pub(crate) fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SESSION_ID_PREFIX, self.0)
    }
}

impl FromStr for SessionId {
    type Err = AegisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(SESSION_ID_PREFIX).unwrap_or(trimmed);
        digits
            .parse::<i64>()
            .map(SessionId)
            .map_err(|_| AegisError::UnknownSession(trimmed.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    messages: Vec<Message>,
    document_context: Option<String>,
    display_name: String,
}

impl Session {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            document_context: None,
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.id.millis())
            .single()
            .unwrap_or_default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn document_context(&self) -> Option<&str> {
        self.document_context.as_deref()
    }

    pub fn has_document(&self) -> bool {
        self.document_context.is_some()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub(crate) fn push(&mut self, role: Role, content: String) {
        self.messages.push(Message::new(role, content));
    }

    pub(crate) fn replace_document(&mut self, text: String, display_name: String) {
        self.document_context = Some(text);
        self.display_name = display_name;
    }
}
