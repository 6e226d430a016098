//! Session management for the orchestrator
//!
//! This module provides `ConversationSession` for the persisted transcript,
//! `SlidingWindow` for bounding it, and `SessionManager` for the
//! create-or-resume / clear-on-exit lifecycle.

pub mod lifecycle;
pub mod metadata;
pub mod session;
pub mod storage;
pub mod window;

pub use lifecycle::SessionManager;
pub use metadata::SessionMetadata;
pub use session::ConversationSession;
pub use storage::SessionStorage;
pub use window::SlidingWindow;
