//! Agents and the turn controller for MediScreen intake sessions.
//!
//! A session is handled by three agents in sequence:
//!
//! 1. **IntakeCoordinator** identifies the patient and takes the complaint
//! 2. **SymptomSpecialist** runs the OPQRST symptom interview
//! 3. **ClinicalScribe** turns the transcript into a SOAP note
//!
//! Each agent is an [`AgentRunner`] over a language model provider. The
//! [`TurnController`] decides which agent hears the next patient line and
//! when to hand over.

pub mod controller;
pub mod crew;
pub mod history;
pub mod prompts;
pub mod routing;
pub mod runner;

#[cfg(test)]
mod test_helpers;

pub use controller::{AgentSet, IntakeState, TurnController, TurnOutcome, Utterance};
pub use crew::{build_agent_set, routing_rules};
pub use history::SharedHistory;
pub use routing::RoutingRules;
pub use runner::AgentRunner;
