//! # MediScreen Core
//!
//! Domain types, traits, and error definitions for the MediScreen clinical
//! intake pipeline.
//!
//! Every external collaborator (model provider, tools, session store, note
//! store, tracer) is a trait here; implementations live in the other crates.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod agent;
pub mod patient;
pub mod transcript;
pub mod session;
pub mod note;
pub mod trace;

pub use error::{Error, Result};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use agent::{Agent, AgentReply, AgentRole, ToolInvocation};
pub use patient::{PatientContext, PatientId};
pub use transcript::{Speaker, Transcript, Turn};
pub use session::{Session, SessionId, SessionStore};
pub use note::{ClinicalNote, NoteStore};
pub use trace::{TraceEvent, TraceRecord, Tracer};
