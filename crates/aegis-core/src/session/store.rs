use chrono::Utc;
use std::collections::HashMap;

use super::{Session, SessionId};
use crate::core_types::Role;
use crate::errors::AegisError;

/// In-process registry of conversations with a single current session.
///
/// The store is created with one session already current, so there is always
/// something to address. Sessions are only ever added.
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    current: SessionId,
    last_stamp: i64,
}

impl SessionStore {
    pub fn new() -> Self {
        let mut store = Self {
            sessions: HashMap::new(),
            current: SessionId::from_millis(0),
            last_stamp: i64::MIN,
        };
        let first = store.create_session();
        store.current = first;
        store
    }

    /// Allocates a fresh session without making it current.
    pub fn create_session(&mut self) -> SessionId {
        let id = SessionId::from_millis(self.next_stamp());
        self.sessions.insert(id, Session::new(id));
        log::debug!("Created session {}", id);
        id
    }

    pub fn switch(&mut self, id: SessionId) -> Result<(), AegisError> {
        if !self.sessions.contains_key(&id) {
            log::warn!("Refusing to switch to unknown session {}", id);
            return Err(AegisError::UnknownSession(id.to_string()));
        }
        self.current = id;
        Ok(())
    }

    /// Sessions ordered newest first.
    pub fn list_sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| b.id().cmp(&a.id()));
        sessions
    }

    pub fn append_message(
        &mut self,
        id: SessionId,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), AegisError> {
        self.get_mut(id)?.push(role, content.into());
        Ok(())
    }

    /// Replaces, never accumulates, the document attached to a session.
    pub fn set_document_context(
        &mut self,
        id: SessionId,
        text: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), AegisError> {
        let session = self.get_mut(id)?;
        session.replace_document(text.into(), display_name.into());
        log::info!(
            "Attached document '{}' to session {}",
            session.display_name(),
            id
        );
        Ok(())
    }

    pub fn current_id(&self) -> SessionId {
        self.current
    }

    pub fn current(&self) -> &Session {
        // `current` always names a stored session: it is set only by `new`
        // and by a successful `switch`, and nothing is ever removed.
        &self.sessions[&self.current]
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut Session, AegisError> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| AegisError::UnknownSession(id.to_string()))
    }

    fn next_stamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let stamp = if now > self.last_stamp {
            now
        } else {
            self.last_stamp + 1
        };
        self.last_stamp = stamp;
        stamp
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Message;
    use std::collections::HashSet;

    #[test]
    fn test_new_store_has_one_current_session() {
        let store = SessionStore::new();
        assert_eq!(store.len(), 1);
        assert_eq!(store.current().id(), store.current_id());
        assert_eq!(store.current().display_name(), "New Chat");
    }

    #[test]
    fn test_three_sessions_are_distinct_and_listed_newest_first() {
        let mut store = SessionStore::new();
        let first = store.current_id();
        let a = store.create_session();
        let b = store.create_session();
        let c = store.create_session();

        let ids: HashSet<SessionId> = [a, b, c].into_iter().collect();
        assert_eq!(ids.len(), 3);

        let listed: Vec<SessionId> = store.list_sessions().iter().map(|s| s.id()).collect();
        assert_eq!(listed, vec![c, b, a, first]);
    }

    #[test]
    fn test_many_rapid_creations_stay_strictly_ordered() {
        let mut store = SessionStore::new();
        let created: Vec<SessionId> = (0..200).map(|_| store.create_session()).collect();

        let listed: Vec<SessionId> = store.list_sessions().iter().map(|s| s.id()).collect();
        let mut expected = created.clone();
        expected.reverse();
        assert_eq!(&listed[..200], expected.as_slice());
        for pair in listed.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_create_session_does_not_switch() {
        let mut store = SessionStore::new();
        let first = store.current_id();
        store.create_session();
        assert_eq!(store.current_id(), first);
    }

    #[test]
    fn test_switch_to_unknown_session_keeps_current() {
        let mut store = SessionStore::new();
        let created = store.create_session();
        store.switch(created).unwrap();

        let bogus = SessionId::from_millis(1);
        let result = store.switch(bogus);

        assert_eq!(
            result,
            Err(AegisError::UnknownSession("chat_1".to_string()))
        );
        assert_eq!(store.current_id(), created);
    }

    #[test]
    fn test_append_preserves_prior_messages() {
        let mut store = SessionStore::new();
        let id = store.current_id();
        store.append_message(id, Role::User, "What is the term?").unwrap();
        store
            .append_message(id, Role::Assistant, "Two years.")
            .unwrap();
        store.append_message(id, Role::User, "Thanks").unwrap();

        assert_eq!(
            store.current().messages(),
            &[
                Message::user("What is the term?"),
                Message::assistant("Two years."),
                Message::user("Thanks"),
            ]
        );
    }

    #[test]
    fn test_append_to_unknown_session_fails() {
        let mut store = SessionStore::new();
        let result = store.append_message(SessionId::from_millis(7), Role::User, "hi");
        assert!(matches!(result, Err(AegisError::UnknownSession(_))));
    }

    #[test]
    fn test_set_document_context_overwrites() {
        let mut store = SessionStore::new();
        let id = store.current_id();
        store.set_document_context(id, "A", "nda").unwrap();
        store.set_document_context(id, "B", "lease").unwrap();

        let session = store.get(id).unwrap();
        assert_eq!(session.document_context(), Some("B"));
        assert_eq!(session.display_name(), "lease");
    }

    #[test]
    fn test_document_context_is_per_session() {
        let mut store = SessionStore::new();
        let first = store.current_id();
        let second = store.create_session();
        store.set_document_context(second, "contract", "contract").unwrap();

        assert!(!store.get(first).unwrap().has_document());
        assert!(store.get(second).unwrap().has_document());
    }
}
