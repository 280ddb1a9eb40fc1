//! Conversation tracers for MediScreen.
//!
//! Implementations of `mediscreen_core::Tracer`: a daily append-only trace
//! file for operators and an in-memory tracer for tests. Neither writes to
//! the patient-facing console.

pub mod file;
pub mod format;
pub mod memory;

pub use file::FileTracer;
pub use format::{TraceLevel, render_event};
pub use memory::MemoryTracer;
