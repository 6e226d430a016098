//! The orchestrator's transcript plus its metadata, bound to one storage root.

use crate::core::AgentResult;
use crate::llm::Message;

use super::metadata::SessionMetadata;
use super::storage::SessionStorage;

#[derive(Debug)]
pub struct ConversationSession {
    pub metadata: SessionMetadata,
    messages: Vec<Message>,
    storage: SessionStorage,
}

impl ConversationSession {
    /// Create a new session with an empty transcript.
    ///
    /// The metadata is persisted immediately.
    pub fn new_with_storage(
        session_id: impl Into<String>,
        agent_name: impl Into<String>,
        model: impl Into<String>,
        storage: SessionStorage,
    ) -> AgentResult<Self> {
        let metadata = SessionMetadata::new(session_id, agent_name, model);
        storage.save_metadata(&metadata)?;

        Ok(Self {
            metadata,
            messages: Vec::new(),
            storage,
        })
    }

    /// Load a saved session, `None` when it does not exist
    pub fn load_with_storage(
        session_id: &str,
        storage: SessionStorage,
    ) -> AgentResult<Option<Self>> {
        let Some(metadata) = storage.load_metadata(session_id)? else {
            return Ok(None);
        };
        let messages = storage.load_messages(session_id)?;

        Ok(Some(Self {
            metadata,
            messages,
            storage,
        }))
    }

    pub fn session_id(&self) -> &str {
        &self.metadata.session_id
    }

    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Replace the in-memory transcript; call `save()` to persist
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Persist the transcript, then the metadata describing it
    pub fn save(&mut self) -> AgentResult<()> {
        self.storage
            .save_messages(&self.metadata.session_id, &self.messages)?;
        self.metadata.touch();
        self.metadata.message_count = self.messages.len();
        self.storage.save_metadata(&self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (SessionStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = SessionStorage::with_dir(temp_dir.path());
        (storage, temp_dir)
    }

    #[test]
    fn test_new_session() {
        let (storage, _temp) = create_test_storage();

        let session =
            ConversationSession::new_with_storage("test_session", "main", "model-x", storage.clone())
                .unwrap();

        assert_eq!(session.session_id(), "test_session");
        assert!(session.history().is_empty());
        assert!(storage.session_exists("test_session"));
    }

    #[test]
    fn test_save_and_reload() {
        let (storage, _temp) = create_test_storage();

        let mut session =
            ConversationSession::new_with_storage("msg_session", "main", "", storage.clone()).unwrap();
        session.replace_messages(vec![Message::user("Hello"), Message::assistant("Hi there")]);
        session.save().unwrap();

        let reloaded = ConversationSession::load_with_storage("msg_session", storage)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.history().len(), 2);
        assert_eq!(reloaded.metadata.message_count, 2);
    }

    #[test]
    fn test_load_missing() {
        let (storage, _temp) = create_test_storage();
        assert!(ConversationSession::load_with_storage("nope", storage)
            .unwrap()
            .is_none());
    }
}
