//! Human-readable rendering of trace events.

use mediscreen_core::trace::TraceEvent;

/// Severity printed in the trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    Info,
    Error,
}

impl std::fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Trace lines for one event. Messages never contain a newline.
pub fn render_event(event: &TraceEvent) -> Vec<(TraceLevel, String)> {
    use TraceLevel::*;

    match event {
        TraceEvent::AgentTurnStart { agent, input } => vec![
            (Info, format!("[AGENT START] Agent: {agent}")),
            (Info, format!("[INPUT] {}", single_line(input))),
        ],
        TraceEvent::ModelResponse { agent, response } => vec![(
            Info,
            format!("[MODEL RESPONSE] {agent}: {}", single_line(response)),
        )],
        TraceEvent::ToolInvocation { tool, arguments } => vec![(
            Info,
            format!("[TOOL USE] Calling: {tool} | Args: {arguments}"),
        )],
        TraceEvent::Error { context, detail } => vec![(
            Error,
            format!("[ERROR] {context}: {}", single_line(detail)),
        )],
        TraceEvent::System { message } => vec![(Info, single_line(message))],
    }
}

fn single_line(text: &str) -> String {
    text.replace('\n', "\\n")
}
