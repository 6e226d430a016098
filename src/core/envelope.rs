//! Response envelope returned by every sub-agent
//!
//! Serialized form is either `{"status":"success","response":...}` or
//! `{"status":"error","reason":...}`.

use serde::{Deserialize, Serialize};

use super::error::AgentError;

/// Reason used when the reasoning backend returns nothing usable
pub const EMPTY_RESULT_REASON: &str = "Error but I couldn't process this request due a problem. \
Please check if your query is clearly stated or try rephrasing it.";

/// Reason used when no identity token is available
pub const AUTH_MISSING_REASON: &str = "Error, I couldn't process No JWT token available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseEnvelope {
    Success { response: String },
    Error { reason: String },
}

impl ResponseEnvelope {
    pub fn success(response: impl Into<String>) -> Self {
        ResponseEnvelope::Success {
            response: response.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        ResponseEnvelope::Error {
            reason: reason.into(),
        }
    }

    /// Map a failed invocation onto the user-facing error envelope
    pub fn from_error(err: &AgentError) -> Self {
        match err {
            AgentError::AuthMissing => Self::error(AUTH_MISSING_REASON),
            AgentError::EmptyResult => Self::error(EMPTY_RESULT_REASON),
            AgentError::LoopGuardTripped(reason) => {
                Self::error(format!("Transaction aborted: {}", reason))
            }
            other => Self::error(format!("Error processing your query: {}", other)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// The response text or the error reason
    pub fn message(&self) -> &str {
        match self {
            ResponseEnvelope::Success { response } => response,
            ResponseEnvelope::Error { reason } => reason,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
