//! Assemble the three intake agents from configuration.

use mediscreen_config::{AgentOverride, AppConfig};
use mediscreen_core::agent::AgentRole;
use mediscreen_core::provider::Provider;
use mediscreen_core::tool::ToolRegistry;
use mediscreen_core::trace::Tracer;
use mediscreen_tools::{GetPatientHistoryTool, IntakeProtocolTool, PatientArchive, intake_registry};
use std::sync::Arc;
use tracing::debug;

use crate::controller::AgentSet;
use crate::history::SharedHistory;
use crate::prompts::system_prompt;
use crate::routing::RoutingRules;
use crate::runner::AgentRunner;

pub fn routing_rules(config: &AppConfig) -> RoutingRules {
    RoutingRules::new(config.routing.structured_signals)
}

/// Coordinator tools. The hand-off directive tool is only offered when
/// structured routing signals are enabled.
fn coordinator_tools(archive: Arc<PatientArchive>, structured: bool) -> ToolRegistry {
    if structured {
        return intake_registry(archive);
    }
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetPatientHistoryTool::new(archive)));
    registry.register(Box::new(IntakeProtocolTool));
    registry
}

/// Build the coordinator, specialist and scribe over one provider.
///
/// All three share a single session history.
pub fn build_agent_set(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    archive: Arc<PatientArchive>,
    tracer: Arc<dyn Tracer>,
) -> AgentSet {
    let history = SharedHistory::new();
    let structured = config.routing.structured_signals;

    let runner = |role: AgentRole, overrides: &AgentOverride| {
        let settings = config.model_settings(overrides);
        debug!(
            agent = %role,
            model = %settings.model,
            temperature = settings.temperature,
            "Building agent"
        );
        AgentRunner::new(
            role,
            provider.clone(),
            settings.model,
            system_prompt(role, structured),
            history.clone(),
            tracer.clone(),
        )
        .with_temperature(settings.temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_iterations(config.max_tool_iterations)
    };

    let intake = runner(AgentRole::IntakeCoordinator, &config.agents.intake)
        .with_tools(Arc::new(coordinator_tools(archive, structured)));
    let specialist = runner(AgentRole::SymptomSpecialist, &config.agents.specialist);
    let scribe = runner(AgentRole::ClinicalScribe, &config.agents.scribe);

    AgentSet {
        intake: Arc::new(intake),
        specialist: Arc::new(specialist),
        scribe: Arc::new(scribe),
    }
}
