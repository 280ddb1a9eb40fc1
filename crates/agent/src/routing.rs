//! Routing rules applied to agent replies.
//!
//! Structured signals (tool invocations) are checked first when enabled;
//! free-text phrase matching is the fallback and the only rule when they
//! are disabled.

use mediscreen_core::agent::AgentReply;
use mediscreen_core::patient::{PatientContext, PatientId};
use mediscreen_core::transcript::Transcript;
use mediscreen_tools::{GET_PATIENT_HISTORY, HANDOFF_TO_SPECIALIST};

/// Completion marker emitted by the symptom specialist. Case-sensitive.
pub const COMPLETION_MARKER: &str = "SUMMARY_COMPLETE";

/// Hidden instruction that makes the coordinator speak first.
pub const WARM_START_INSTRUCTION: &str =
    "The user has connected. Introduce yourself and ask for their Patient ID.";

/// The coordinator confirmed it found the patient's file.
pub fn confirms_file(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    lower.contains("thank you,") && lower.contains("i see your file")
}

/// The coordinator announced the hand-off to the specialist.
pub fn requests_handoff(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    lower.contains("specialist") && lower.contains("connect you")
}

/// The specialist finished the interview.
pub fn signals_completion(reply: &str) -> bool {
    reply.contains(COMPLETION_MARKER)
}

/// Hidden message that opens the specialist's part of the conversation.
pub fn handoff_message(patient: &PatientContext, complaint: &str) -> String {
    format!(
        "Patient ID: {} is on the line. Complaint: {}.",
        patient.label(),
        complaint
    )
}

/// Input for the scribe: the whole transcript on one line.
pub fn scribe_prompt(transcript: &Transcript) -> String {
    format!("GENERATE SOAP NOTE.\n[LOGS]: {}", transcript.render())
}

#[derive(Debug, Clone, Copy)]
pub struct RoutingRules {
    pub structured_signals: bool,
}

impl RoutingRules {
    pub fn new(structured_signals: bool) -> Self {
        Self { structured_signals }
    }

    /// Identifier to record after a coordinator turn, if any.
    ///
    /// Structured: the `patient_id` argument of a successful history lookup.
    /// Fallback: a `PT-<digits>` token in the last patient utterance, but
    /// only when the reply confirms the file.
    pub fn capture_patient_id(
        &self,
        reply: &AgentReply,
        last_patient: Option<&str>,
    ) -> Option<PatientId> {
        if self.structured_signals {
            let from_tool = reply
                .tool_invocations
                .iter()
                .rev()
                .filter(|inv| inv.name == GET_PATIENT_HISTORY && inv.success)
                .find_map(|inv| inv.arguments["patient_id"].as_str().and_then(PatientId::parse));
            if from_tool.is_some() {
                return from_tool;
            }
        }

        if confirms_file(&reply.text) {
            return last_patient.and_then(PatientId::find_in);
        }
        None
    }

    /// Whether a coordinator turn hands the conversation to the specialist.
    pub fn hands_off(&self, reply: &AgentReply) -> bool {
        (self.structured_signals && reply.invocation(HANDOFF_TO_SPECIALIST).is_some())
            || requests_handoff(&reply.text)
    }
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self::new(true)
    }
}
