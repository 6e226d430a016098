//! Core types for the orchestrator
//!
//! This module provides the fundamental types used throughout the crate:
//! - `InvocationContext` / `SecurityContext` - Caller identity and trace data
//! - `TraceContext` - W3C trace propagation
//! - `TokenStore` - Slot holding the caller's identity token
//! - `ResponseEnvelope` - Sub-agent result contract
//! - `AgentError` - Error types

pub mod context;
pub mod envelope;
pub mod error;
pub mod token;
pub mod trace;

pub use context::{InvocationContext, SecurityContext};
pub use envelope::ResponseEnvelope;
pub use error::{AgentError, AgentResult};
pub use token::TokenStore;
pub use trace::TraceContext;
