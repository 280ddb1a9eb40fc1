//! End-to-end tests for a MediScreen intake session.
//!
//! These drive the turn controller over real agent runners, the bundled
//! patient archive and a temp-dir note store. Only the model is scripted.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use mediscreen_agent::{IntakeState, TurnController, TurnOutcome, build_agent_set, routing_rules};
use mediscreen_config::AppConfig;
use mediscreen_core::error::ProviderError;
use mediscreen_core::message::{Message, MessageToolCall};
use mediscreen_core::provider::{Provider, ProviderRequest, ProviderResponse};
use mediscreen_core::session::{Session, SessionStore};
use mediscreen_core::trace::TraceEvent;
use mediscreen_storage::{FileNoteStore, InMemorySessionStore};
use mediscreen_telemetry::MemoryTracer;
use mediscreen_tools::PatientArchive;

// ── Scripted model ──────────────────────────────────────────────────────────────

/// One provider shared by all three agents; answers in call order.
struct ScriptedModel {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedModel {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedModel exhausted")
    }
}

fn text(content: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        message: Message::assistant(content),
        usage: None,
        model: "mock-model".into(),
    })
}

fn tool(name: &str, args: serde_json::Value) -> Result<ProviderResponse, ProviderError> {
    let mut message = Message::assistant("");
    message.tool_calls = vec![MessageToolCall {
        id: format!("call_{name}"),
        name: name.into(),
        arguments: args.to_string(),
    }];
    Ok(ProviderResponse {
        message,
        usage: None,
        model: "mock-model".into(),
    })
}

// ── Session harness ─────────────────────────────────────────────────────────────

struct Harness {
    controller: TurnController,
    model: Arc<ScriptedModel>,
    tracer: Arc<MemoryTracer>,
    sessions: Arc<InMemorySessionStore>,
    logs: PathBuf,
    _dir: tempfile::TempDir,
}

fn patient_data() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/mock_patients.json")
}

fn harness(structured: bool, responses: Vec<Result<ProviderResponse, ProviderError>>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");

    let mut config = AppConfig::default();
    config.routing.structured_signals = structured;

    let model = Arc::new(ScriptedModel::new(responses));
    let tracer = Arc::new(MemoryTracer::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let agents = build_agent_set(
        &config,
        model.clone(),
        Arc::new(PatientArchive::new(patient_data())),
        tracer.clone(),
    );

    let controller = TurnController::new(
        agents,
        Session::new(&config.session.app_name, &config.session.user_id),
        routing_rules(&config),
        tracer.clone(),
        sessions.clone(),
        Arc::new(FileNoteStore::new(&logs)),
    );

    Harness {
        controller,
        model,
        tracer,
        sessions,
        logs,
        _dir: dir,
    }
}

fn lines(outcome: TurnOutcome) -> Vec<String> {
    match outcome {
        TurnOutcome::Replies(replies) => replies.iter().map(|u| u.render()).collect(),
        other => panic!("expected replies, got {other:?}"),
    }
}

fn note_files(logs: &PathBuf) -> Vec<String> {
    match std::fs::read_dir(logs) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_intake_with_structured_signals() {
    let mut h = harness(
        true,
        vec![
            text(
                "Hello, I'm MediScreen AI and I'll be assisting you today. What is your Patient ID?",
            ),
            tool("get_patient_history", serde_json::json!({"patient_id": "PT-1004"})),
            text(
                "Thank you, Jane Doe. I see your file. What is the main reason for your visit today?",
            ),
            tool("handoff_to_specialist", serde_json::json!({"reason": "headache"})),
            text("Understood. One moment please."),
            text("Hi Jane, I'm sorry to hear about the headache. When did it start?"),
            text("Thank you. Please wait for the doctor's review. SUMMARY_COMPLETE"),
            text("**SUBJECTIVE:**\n* **CC:** Headache"),
        ],
    );

    let greeting = h.controller.start().await;
    assert!(greeting[0].render().starts_with("IntakeCoordinator: Hello, I'm MediScreen AI"));

    let out = lines(h.controller.handle_input("my id is pt-1004").await);
    assert_eq!(out.len(), 1);
    assert_eq!(h.controller.patient().label(), "PT-1004");

    // Hand-off is driven by the directive tool even without the phrase
    let out = lines(h.controller.handle_input("I've had a headache since yesterday").await);
    assert_eq!(out.len(), 2);
    assert!(out[1].starts_with("SymptomSpecialist: Hi Jane"));
    assert_eq!(h.controller.state(), IntakeState::Symptom);

    let handoff_request = &h.model.requests()[5];
    let last = handoff_request.messages.last().unwrap();
    assert_eq!(
        last.content,
        "Patient ID: PT-1004 is on the line. Complaint: I've had a headache since yesterday."
    );
    // Specialist sees the coordinator's part of the conversation
    assert!(handoff_request.messages.iter().any(|m| m.content.contains("I see your file")));

    match h.controller.handle_input("no, that's everything").await {
        TurnOutcome::Completed { replies, note, location } => {
            assert_eq!(replies.len(), 1);
            assert_eq!(note.subject(), "PT-1004");
            let path = location.unwrap();
            assert!(path.contains("PT-1004_SOAP_Note_"));
            assert_eq!(
                std::fs::read_to_string(path).unwrap(),
                "**SUBJECTIVE:**\n* **CC:** Headache"
            );
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(h.controller.state(), IntakeState::Complete);

    let scribe_request = h.model.requests().last().unwrap().clone();
    let payload = &scribe_request.messages.last().unwrap().content;
    assert!(payload.starts_with("GENERATE SOAP NOTE.\n[LOGS]: IntakeCoordinator: Hello"));
    assert!(payload.ends_with(
        "SymptomSpecialist: Thank you. Please wait for the doctor's review. SUMMARY_COMPLETE"
    ));

    assert_eq!(
        h.tracer.system_messages()[1..],
        [
            "Patient ID successfully extracted and set to: PT-1004".to_string(),
            "Handing off to SymptomSpecialist".to_string(),
            "Interview Complete. Generating Note for Doctor to review.".to_string(),
            format!("SOAP note saved to {}", h.logs.join(note_files(&h.logs)[0].clone()).display()),
        ]
    );
    assert!(h.tracer.events().iter().any(|e| matches!(
        e,
        TraceEvent::ToolInvocation { tool, .. } if tool == "get_patient_history"
    )));

    let id = h.controller.session().id.clone();
    assert_eq!(h.sessions.turns(&id).await.unwrap().len(), h.controller.transcript().len());
}

#[tokio::test]
async fn full_intake_with_phrase_rules_only() {
    let mut h = harness(
        false,
        vec![
            text("Hello, what is your Patient ID?"),
            tool("get_patient_history", serde_json::json!({"patient_id": "PT-1004"})),
            text("Thank you, Jane Doe. I see your file. What brings you in today?"),
            text("Understood. I'm going to connect you with our triage specialist now."),
            text("When did the cough start?"),
            text("Got it. SUMMARY_COMPLETE"),
            text("SOAP"),
        ],
    );

    h.controller.start().await;
    h.controller.handle_input("PT-1004").await;
    assert_eq!(h.controller.patient().label(), "PT-1004");

    let out = lines(h.controller.handle_input("a cough").await);
    assert_eq!(
        out,
        vec![
            "IntakeCoordinator: Understood. I'm going to connect you with our triage specialist now."
                .to_string(),
            "SymptomSpecialist: When did the cough start?".to_string(),
        ]
    );

    assert!(matches!(
        h.controller.handle_input("two days ago").await,
        TurnOutcome::Completed { .. }
    ));
    let files = note_files(&h.logs);
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("PT-1004_SOAP_Note_") && files[0].ends_with(".txt"));
}

#[tokio::test]
async fn unknown_patient_keeps_placeholder() {
    let mut h = harness(
        true,
        vec![
            tool("get_patient_history", serde_json::json!({"patient_id": "PT-9999"})),
            text("I'm sorry, I couldn't find that Patient ID. Could you check it?"),
        ],
    );

    let out = lines(h.controller.handle_input("PT-9999").await);
    assert!(out[0].contains("couldn't find"));
    assert_eq!(h.controller.patient().label(), "patient_cli_user");

    // The model saw the lookup's not-found text
    let second = &h.model.requests()[1];
    assert!(second
        .messages
        .iter()
        .any(|m| m.content == "Error: Patient ID 'PT-9999' not found."));
}

#[tokio::test]
async fn quit_mid_interview_writes_no_note() {
    let mut h = harness(
        false,
        vec![
            text("Hello, what is your Patient ID?"),
            text("I'm going to connect you with our triage specialist now."),
            text("When did it start?"),
        ],
    );
    h.controller.start().await;
    h.controller.handle_input("stomach ache").await;
    assert_eq!(h.controller.state(), IntakeState::Symptom);

    assert!(matches!(h.controller.handle_input("exit").await, TurnOutcome::Exit));
    assert!(note_files(&h.logs).is_empty());
    assert_eq!(h.model.requests().len(), 3);
}

#[tokio::test]
async fn model_failure_recovers_on_next_input() {
    let mut h = harness(
        true,
        vec![
            Err(ProviderError::RateLimited { retry_after_secs: 5 }),
            text("Thank you, Jane Doe. I see your file."),
        ],
    );

    let out = lines(h.controller.handle_input("PT-1004").await);
    assert_eq!(out.len(), 1);
    assert!(out[0].starts_with(
        "IntakeCoordinator: [ I encountered an error processing your request System Error: "
    ));
    assert_eq!(h.controller.state(), IntakeState::Intake);
    assert_eq!(h.tracer.error_count(), 1);

    h.controller.handle_input("PT-1004").await;
    assert_eq!(h.controller.patient().label(), "PT-1004");
}

#[tokio::test]
async fn empty_input_never_reaches_the_model() {
    let mut h = harness(true, vec![]);
    for input in ["", "   ", "\t"] {
        assert!(matches!(
            h.controller.handle_input(input).await,
            TurnOutcome::Reprompt(_)
        ));
    }
    assert!(h.model.requests().is_empty());
    assert!(h.controller.transcript().is_empty());
}
