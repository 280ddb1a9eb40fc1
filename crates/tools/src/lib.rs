//! Intake tools for MediScreen.
//!
//! The intake coordinator is the only agent with tools: it looks up patient
//! history, reads the intake protocol, and signals the hand-off to the
//! symptom specialist.

pub mod handoff;
pub mod history;
pub mod intake_protocol;

use mediscreen_core::tool::ToolRegistry;
use std::sync::Arc;

pub use handoff::{HANDOFF_TO_SPECIALIST, HandoffTool};
pub use history::{
    GET_PATIENT_HISTORY, GetPatientHistoryTool, HistoryError, HistoryLookup, PatientArchive,
};
pub use intake_protocol::{GET_INTAKE_PROTOCOL, INTAKE_PROTOCOL, IntakeProtocolTool};

/// Tool registry for the intake coordinator.
pub fn intake_registry(archive: Arc<PatientArchive>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetPatientHistoryTool::new(archive)));
    registry.register(Box::new(IntakeProtocolTool));
    registry.register(Box::new(HandoffTool));
    registry
}
