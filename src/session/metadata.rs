//! Session metadata types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a conversation session
///
/// This is persisted separately from the transcript for quick access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Unique session ID
    pub session_id: String,

    /// Agent that owns the transcript (e.g., "main")
    pub agent_name: String,

    /// Model used by the owning agent
    #[serde(default)]
    pub model: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session was last updated
    pub updated_at: DateTime<Utc>,

    /// Messages in the persisted transcript
    #[serde(default)]
    pub message_count: usize,
}

impl SessionMetadata {
    pub fn new(
        session_id: impl Into<String>,
        agent_name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            agent_name: agent_name.into(),
            model: model.into(),
            created_at: now,
            updated_at: now,
            message_count: 0,
        }
    }

    /// Update the updated_at timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
