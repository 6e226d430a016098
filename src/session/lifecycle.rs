//! Session lifecycle: create or resume on startup, remove on exit

use std::path::PathBuf;

use crate::core::AgentResult;

use super::session::ConversationSession;
use super::storage::SessionStorage;

#[derive(Debug, Clone)]
pub struct SessionManager {
    storage: SessionStorage,
    agent_name: String,
    model: String,
}

impl SessionManager {
    pub fn new(root: impl Into<PathBuf>, agent_name: impl Into<String>) -> Self {
        Self {
            storage: SessionStorage::with_dir(root),
            agent_name: agent_name.into(),
            model: String::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.storage.session_dir(session_id)
    }

    /// Resume a saved session or start a new one
    pub fn create_or_load(&self, session_id: &str) -> AgentResult<ConversationSession> {
        if let Some(session) =
            ConversationSession::load_with_storage(session_id, self.storage.clone())?
        {
            tracing::info!(
                "[SessionManager] Resumed session {} ({} messages)",
                session_id,
                session.history().len()
            );
            return Ok(session);
        }

        tracing::info!("[SessionManager] Created session {}", session_id);
        ConversationSession::new_with_storage(
            session_id,
            &self.agent_name,
            &self.model,
            self.storage.clone(),
        )
    }

    /// Remove the session directory. Never fails: problems are logged.
    pub fn clear(&self, session_id: &str) {
        let dir = self.session_dir(session_id);
        tracing::info!("[SessionManager] Cleaning session files: {}", dir.display());

        match self.storage.delete_session(session_id) {
            Ok(true) => tracing::info!(
                "[SessionManager] All files in {} cleared for session {}",
                dir.display(),
                session_id
            ),
            Ok(false) => {
                tracing::info!("[SessionManager] Directory not found: {}", dir.display())
            }
            Err(e) => tracing::error!(
                "[SessionManager] Failed to delete {}. Reason: {}",
                dir.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;
    use tempfile::TempDir;

    #[test]
    fn test_create_then_resume() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::new(temp.path(), "main").with_model("model-x");

        let mut session = manager.create_or_load("main-001").unwrap();
        session.replace_messages(vec![Message::user("hi"), Message::assistant("hello")]);
        session.save().unwrap();

        let resumed = manager.create_or_load("main-001").unwrap();
        assert_eq!(resumed.history().len(), 2);
        assert_eq!(resumed.metadata.model, "model-x");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::new(temp.path(), "main");

        manager.create_or_load("s1").unwrap();
        assert!(manager.session_dir("s1").is_dir());

        manager.clear("s1");
        assert!(!manager.session_dir("s1").exists());

        manager.clear("s1");
        manager.clear("never-created");
    }
}
