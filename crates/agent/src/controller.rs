//! The turn controller: one intake session driven one patient line at a time.
//!
//! ```text
//!  Intake ──hand-off──▶ Symptom ──SUMMARY_COMPLETE──▶ Complete
//!    │                    │
//!    └──── quit/exit ─────┴──▶ (session closed, no note)
//! ```
//!
//! The controller owns the session state (active agent, transcript,
//! patient context) and never processes two inputs at once. Agent failures
//! become an in-band apology and leave the state where it was.

use mediscreen_core::agent::{Agent, AgentReply, AgentRole};
use mediscreen_core::error::SessionError;
use mediscreen_core::note::{ClinicalNote, NoteStore};
use mediscreen_core::patient::PatientContext;
use mediscreen_core::session::{Session, SessionStore};
use mediscreen_core::trace::Tracer;
use mediscreen_core::transcript::{Transcript, Turn};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::routing::{self, RoutingRules, WARM_START_INSTRUCTION};

pub const REPROMPT: &str = "I didn't catch that. Please type your response.";

/// Which agent is authoritative over the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    Intake,
    Symptom,
    Complete,
}

impl IntakeState {
    pub fn active_role(&self) -> AgentRole {
        match self {
            Self::Intake => AgentRole::IntakeCoordinator,
            Self::Symptom => AgentRole::SymptomSpecialist,
            Self::Complete => AgentRole::ClinicalScribe,
        }
    }
}

/// The three agents of a session, one per role.
#[derive(Clone)]
pub struct AgentSet {
    pub intake: Arc<dyn Agent>,
    pub specialist: Arc<dyn Agent>,
    pub scribe: Arc<dyn Agent>,
}

impl AgentSet {
    pub fn get(&self, role: AgentRole) -> &Arc<dyn Agent> {
        match role {
            AgentRole::IntakeCoordinator => &self.intake,
            AgentRole::SymptomSpecialist => &self.specialist,
            AgentRole::ClinicalScribe => &self.scribe,
        }
    }
}

/// A line to show the patient, attributed to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub speaker: AgentRole,
    pub text: String,
}

impl Utterance {
    pub fn new(speaker: AgentRole, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    /// `<AgentName>: <text>`
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker, self.text)
    }
}

/// What the caller should do after one patient input.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Input was blank. Show the prompt and read again.
    Reprompt(Utterance),
    /// Show these lines and read the next input.
    Replies(Vec<Utterance>),
    /// The patient asked to leave. No note is written.
    Exit,
    /// The interview finished and the note was generated.
    /// `location` is `None` when the note could not be written.
    Completed {
        replies: Vec<Utterance>,
        note: ClinicalNote,
        location: Option<String>,
    },
}

pub fn apology(detail: &str) -> String {
    format!("[ I encountered an error processing your request System Error: {detail} ]")
}

fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit")
}

pub struct TurnController {
    agents: AgentSet,
    state: IntakeState,
    transcript: Transcript,
    patient: PatientContext,
    session: Session,
    rules: RoutingRules,
    tracer: Arc<dyn Tracer>,
    sessions: Arc<dyn SessionStore>,
    notes: Arc<dyn NoteStore>,
}

impl TurnController {
    pub fn new(
        agents: AgentSet,
        session: Session,
        rules: RoutingRules,
        tracer: Arc<dyn Tracer>,
        sessions: Arc<dyn SessionStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        let patient = PatientContext::placeholder(session.user_id.clone());
        Self {
            agents,
            state: IntakeState::Intake,
            transcript: Transcript::new(),
            patient,
            session,
            rules,
            tracer,
            sessions,
            notes,
        }
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn patient(&self) -> &PatientContext {
        &self.patient
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create the backing session. An existing session is reused; any
    /// other store failure is logged and the conversation goes on without
    /// persistence.
    pub async fn ensure_session(&self) {
        match self.sessions.create_session(&self.session).await {
            Ok(()) => debug!(
                session = %self.session.id,
                store = self.sessions.name(),
                "Session created"
            ),
            Err(SessionError::AlreadyExists(_)) => {
                debug!(session = %self.session.id, "Session already exists")
            }
            Err(e) => warn!(session = %self.session.id, error = %e, "Failed to create session"),
        }
    }

    /// Open the session and let the coordinator speak first.
    pub async fn start(&mut self) -> Vec<Utterance> {
        self.ensure_session().await;
        self.tracer
            .system(&format!("Initializing Session: {}", self.session.id));
        self.warm_start().await
    }

    /// Send the hidden greeting instruction to the coordinator.
    pub async fn warm_start(&mut self) -> Vec<Utterance> {
        let role = AgentRole::IntakeCoordinator;
        let traced = format!("SYSTEM_TRIGGER: {WARM_START_INSTRUCTION}");
        let mut replies = Vec::new();
        match self.dispatch(role, WARM_START_INSTRUCTION, &traced).await {
            Ok(reply) => self.emit(role, &reply, &mut replies).await,
            Err(apology) => replies.push(apology),
        }
        replies
    }

    /// Process one line of patient input.
    pub async fn handle_input(&mut self, input: &str) -> TurnOutcome {
        if self.state == IntakeState::Complete {
            return TurnOutcome::Exit;
        }

        // Only blank detection looks past whitespace; everything else sees
        // the line exactly as typed.
        if input.trim().is_empty() {
            return TurnOutcome::Reprompt(Utterance::new(self.state.active_role(), REPROMPT));
        }
        if is_exit_command(input) {
            info!(session = %self.session.id, "Session closed by patient");
            self.tracer.system("Session closed by patient");
            return TurnOutcome::Exit;
        }

        self.append(Turn::patient(input)).await;

        match self.state {
            IntakeState::Intake => self.intake_turn(input).await,
            IntakeState::Symptom => self.symptom_turn(input).await,
            IntakeState::Complete => TurnOutcome::Exit,
        }
    }

    async fn intake_turn(&mut self, input: &str) -> TurnOutcome {
        let role = AgentRole::IntakeCoordinator;
        let reply = match self.dispatch(role, input, input).await {
            Ok(reply) => reply,
            Err(apology) => return TurnOutcome::Replies(vec![apology]),
        };

        let mut replies = Vec::new();
        self.emit(role, &reply, &mut replies).await;

        let captured = self
            .rules
            .capture_patient_id(&reply, self.transcript.last_patient_utterance());
        if let Some(id) = captured {
            info!(patient = %id, "Patient identified");
            self.tracer
                .system(&format!("Patient ID successfully extracted and set to: {id}"));
            self.patient.identify(id);
        }

        if self.rules.hands_off(&reply) {
            self.tracer.system("Handing off to SymptomSpecialist");
            self.state = IntakeState::Symptom;

            let specialist = AgentRole::SymptomSpecialist;
            let message = routing::handoff_message(&self.patient, input);
            match self.dispatch(specialist, &message, &message).await {
                Ok(greeting) => self.emit(specialist, &greeting, &mut replies).await,
                Err(apology) => replies.push(apology),
            }
        }

        TurnOutcome::Replies(replies)
    }

    async fn symptom_turn(&mut self, input: &str) -> TurnOutcome {
        let role = AgentRole::SymptomSpecialist;
        let reply = match self.dispatch(role, input, input).await {
            Ok(reply) => reply,
            Err(apology) => return TurnOutcome::Replies(vec![apology]),
        };

        let mut replies = Vec::new();
        self.emit(role, &reply, &mut replies).await;

        if !routing::signals_completion(&reply.text) {
            return TurnOutcome::Replies(replies);
        }

        self.tracer
            .system("Interview Complete. Generating Note for Doctor to review.");
        let prompt = routing::scribe_prompt(&self.transcript);
        let written = match self.dispatch(AgentRole::ClinicalScribe, &prompt, &prompt).await {
            Ok(reply) => reply,
            Err(apology) => {
                replies.push(apology);
                return TurnOutcome::Replies(replies);
            }
        };

        let note = ClinicalNote::new(self.patient.label(), written.text);
        let location = match self.notes.persist(&note).await {
            Ok(path) => {
                info!(path = %path, "SOAP note saved");
                self.tracer.system(&format!("SOAP note saved to {path}"));
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save SOAP note");
                self.tracer.on_error("note persistence", &e.to_string());
                None
            }
        };

        self.state = IntakeState::Complete;
        TurnOutcome::Completed {
            replies,
            note,
            location,
        }
    }

    /// Invoke one agent with tracing. Failures come back as the apology
    /// line to show in place of a reply.
    async fn dispatch(
        &self,
        role: AgentRole,
        input: &str,
        traced_input: &str,
    ) -> Result<AgentReply, Utterance> {
        let name = role.display_name();
        self.tracer.agent_turn_start(name, traced_input);

        match self.agents.get(role).invoke(input).await {
            Ok(reply) => {
                self.tracer.model_response(name, &reply.text);
                Ok(reply)
            }
            Err(e) => {
                warn!(agent = name, error = %e, "Agent turn failed");
                self.tracer.on_error(name, &e.to_string());
                Err(Utterance::new(role, apology(&e.to_string())))
            }
        }
    }

    /// Show and transcribe a reply unless it is blank.
    async fn emit(&mut self, role: AgentRole, reply: &AgentReply, out: &mut Vec<Utterance>) {
        if reply.is_blank() {
            debug!(agent = %role, "Blank reply not shown");
            return;
        }
        self.append(Turn::agent(role, reply.text.clone())).await;
        out.push(Utterance::new(role, reply.text.clone()));
    }

    async fn append(&mut self, turn: Turn) {
        if let Err(e) = self.sessions.append_turn(&self.session.id, &turn).await {
            warn!(session = %self.session.id, error = %e, "Failed to persist turn");
        }
        self.transcript.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedAgent;
    use async_trait::async_trait;
    use mediscreen_core::error::{NoteError, ProviderError};
    use mediscreen_core::transcript::Speaker;
    use mediscreen_storage::{FileNoteStore, InMemorySessionStore};
    use mediscreen_telemetry::MemoryTracer;

    struct Fixture {
        controller: TurnController,
        intake: Arc<ScriptedAgent>,
        specialist: Arc<ScriptedAgent>,
        scribe: Arc<ScriptedAgent>,
        tracer: Arc<MemoryTracer>,
        sessions: Arc<InMemorySessionStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture(intake: ScriptedAgent, specialist: ScriptedAgent, scribe: ScriptedAgent) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let intake = Arc::new(intake);
        let specialist = Arc::new(specialist);
        let scribe = Arc::new(scribe);
        let tracer = Arc::new(MemoryTracer::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let agents = AgentSet {
            intake: intake.clone(),
            specialist: specialist.clone(),
            scribe: scribe.clone(),
        };
        let controller = TurnController::new(
            agents,
            Session::new("mediscreen_ai", "patient_cli_user"),
            RoutingRules::new(false),
            tracer.clone(),
            sessions.clone(),
            Arc::new(FileNoteStore::new(dir.path().join("logs"))),
        );
        Fixture {
            controller,
            intake,
            specialist,
            scribe,
            tracer,
            sessions,
            _dir: dir,
        }
    }

    fn empty(role: AgentRole) -> ScriptedAgent {
        ScriptedAgent::texts(role, &[])
    }

    fn replies(outcome: TurnOutcome) -> Vec<Utterance> {
        match outcome {
            TurnOutcome::Replies(r) => r,
            other => panic!("expected replies, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn warm_start_greets_and_transcribes() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["Hello, I'm MediScreen AI. Your Patient ID?"],
            ),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        let greeting = f.controller.start().await;

        assert_eq!(greeting.len(), 1);
        assert_eq!(
            greeting[0].render(),
            "IntakeCoordinator: Hello, I'm MediScreen AI. Your Patient ID?"
        );
        assert_eq!(f.intake.inputs(), vec![WARM_START_INSTRUCTION.to_string()]);
        assert_eq!(f.controller.transcript().len(), 1);
        let warm_start_traced = f.tracer.events().iter().any(|e| {
            matches!(
                e,
                mediscreen_core::trace::TraceEvent::AgentTurnStart { input, .. }
                    if input.starts_with("SYSTEM_TRIGGER: ")
            )
        });
        assert!(warm_start_traced);
        let id = f.controller.session().id.clone();
        assert!(f.sessions.get_session(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn blank_input_reprompts_without_agent() {
        let mut f = fixture(
            empty(AgentRole::IntakeCoordinator),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        match f.controller.handle_input("   ").await {
            TurnOutcome::Reprompt(u) => assert_eq!(
                u.render(),
                "IntakeCoordinator: I didn't catch that. Please type your response."
            ),
            other => panic!("expected reprompt, got {other:?}"),
        }
        assert!(f.controller.transcript().is_empty());
        assert_eq!(f.controller.state(), IntakeState::Intake);
        assert!(f.intake.inputs().is_empty());
    }

    #[tokio::test]
    async fn quit_is_case_insensitive_and_writes_nothing() {
        let mut f = fixture(
            empty(AgentRole::IntakeCoordinator),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        assert!(matches!(f.controller.handle_input("QUIT").await, TurnOutcome::Exit));
        assert!(matches!(f.controller.handle_input("Exit").await, TurnOutcome::Exit));
        assert!(f.controller.transcript().is_empty());
    }

    #[tokio::test]
    async fn padded_quit_is_an_ordinary_utterance() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["Could you share your Patient ID?"],
            ),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        let out = replies(f.controller.handle_input(" quit ").await);
        assert_eq!(out.len(), 1);
        assert_eq!(f.intake.inputs(), vec![" quit ".to_string()]);
        assert_eq!(f.controller.transcript().turns()[0].text, " quit ");
        assert_eq!(f.controller.state(), IntakeState::Intake);
    }

    #[tokio::test]
    async fn patient_id_captured_from_confirmation() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["Thank you, Jane Doe. I see your file. What brings you in today?"],
            ),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        let out = replies(f.controller.handle_input("pt-1004").await);
        assert_eq!(out.len(), 1);
        assert_eq!(f.controller.patient().label(), "PT-1004");
        assert_eq!(f.controller.state(), IntakeState::Intake);
        assert!(f
            .tracer
            .system_messages()
            .contains(&"Patient ID successfully extracted and set to: PT-1004".to_string()));
    }

    #[tokio::test]
    async fn confirmation_without_token_leaves_context() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["Thank you, Jane. I see your file."],
            ),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        f.controller.handle_input("it's Jane").await;
        assert_eq!(f.controller.patient().label(), "patient_cli_user");
    }

    #[tokio::test]
    async fn handoff_sends_hidden_message_and_surfaces_greeting() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["Understood. I'm going to connect you with our triage specialist now."],
            ),
            ScriptedAgent::texts(AgentRole::SymptomSpecialist, &["Hi, when did the pain start?"]),
            empty(AgentRole::ClinicalScribe),
        );
        let out = replies(f.controller.handle_input("headache").await);

        assert_eq!(f.controller.state(), IntakeState::Symptom);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].speaker, AgentRole::SymptomSpecialist);
        assert_eq!(
            f.specialist.inputs(),
            vec!["Patient ID: patient_cli_user is on the line. Complaint: headache.".to_string()]
        );
        // patient, coordinator, specialist greeting
        let speakers: Vec<Speaker> =
            f.controller.transcript().turns().iter().map(|t| t.speaker).collect();
        assert_eq!(
            speakers,
            vec![
                Speaker::Patient,
                Speaker::Agent(AgentRole::IntakeCoordinator),
                Speaker::Agent(AgentRole::SymptomSpecialist),
            ]
        );
    }

    #[tokio::test]
    async fn agent_failure_apologises_and_keeps_state() {
        let mut f = fixture(
            ScriptedAgent::with_results(
                AgentRole::IntakeCoordinator,
                vec![Err(ProviderError::Network("connection reset".into()))],
            ),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        let out = replies(f.controller.handle_input("PT-1004").await);

        assert_eq!(out.len(), 1);
        assert!(
            out[0]
                .text
                .starts_with("[ I encountered an error processing your request System Error: ")
        );
        assert!(out[0].text.contains("connection reset"));
        assert_eq!(f.controller.state(), IntakeState::Intake);
        assert_eq!(f.tracer.error_count(), 1);
        // Only the patient's line was transcribed
        assert_eq!(f.controller.transcript().len(), 1);
    }

    #[tokio::test]
    async fn blank_reply_is_not_shown() {
        let mut f = fixture(
            ScriptedAgent::texts(AgentRole::IntakeCoordinator, &["  "]),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        let out = replies(f.controller.handle_input("hello").await);
        assert!(out.is_empty());
        assert_eq!(f.controller.transcript().len(), 1);
    }

    #[tokio::test]
    async fn completion_generates_and_saves_note() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["I'll connect you with the specialist."],
            ),
            ScriptedAgent::texts(
                AgentRole::SymptomSpecialist,
                &["When did it start?", "Thank you. Please wait for the doctor. SUMMARY_COMPLETE"],
            ),
            ScriptedAgent::texts(AgentRole::ClinicalScribe, &["**SUBJECTIVE:** headache"]),
        );
        f.controller.handle_input("headache").await;

        match f.controller.handle_input("yesterday").await {
            TurnOutcome::Completed { replies, note, location } => {
                assert_eq!(replies.len(), 1);
                assert_eq!(note.body(), "**SUBJECTIVE:** headache");
                assert_eq!(note.subject(), "patient_cli_user");
                let path = location.unwrap();
                assert_eq!(std::fs::read_to_string(&path).unwrap(), "**SUBJECTIVE:** headache");
            }
            other => panic!("expected completion, got {other:?}"),
        }

        assert_eq!(f.controller.state(), IntakeState::Complete);
        let scribe_input = &f.scribe.inputs()[0];
        assert!(scribe_input.starts_with("GENERATE SOAP NOTE.\n[LOGS]: Patient: headache"));
        // No further agent turns after completion
        assert!(matches!(f.controller.handle_input("hello?").await, TurnOutcome::Exit));
    }

    #[tokio::test]
    async fn scribe_failure_stays_in_symptom() {
        let mut f = fixture(
            ScriptedAgent::texts(
                AgentRole::IntakeCoordinator,
                &["Let me connect you with a specialist."],
            ),
            ScriptedAgent::texts(
                AgentRole::SymptomSpecialist,
                &["Hello.", "Thanks. SUMMARY_COMPLETE"],
            ),
            ScriptedAgent::with_results(
                AgentRole::ClinicalScribe,
                vec![Err(ProviderError::Timeout("scribe".into()))],
            ),
        );
        f.controller.handle_input("cough").await;
        let out = replies(f.controller.handle_input("no, nothing else").await);

        assert_eq!(out.len(), 2);
        assert_eq!(out[1].speaker, AgentRole::ClinicalScribe);
        assert_eq!(f.controller.state(), IntakeState::Symptom);
    }

    struct BrokenNotes;

    #[async_trait]
    impl NoteStore for BrokenNotes {
        async fn persist(&self, note: &ClinicalNote) -> Result<String, NoteError> {
            Err(NoteError::WriteFailed {
                path: note.file_name(),
                reason: "disk full".into(),
            })
        }
    }

    #[tokio::test]
    async fn unsaved_note_still_completes() {
        let f = fixture(
            ScriptedAgent::texts(AgentRole::IntakeCoordinator, &[]),
            ScriptedAgent::texts(AgentRole::SymptomSpecialist, &["SUMMARY_COMPLETE"]),
            ScriptedAgent::texts(AgentRole::ClinicalScribe, &["note"]),
        );
        let mut controller = TurnController {
            notes: Arc::new(BrokenNotes),
            state: IntakeState::Symptom,
            ..f.controller
        };

        match controller.handle_input("that's all").await {
            TurnOutcome::Completed { location, note, .. } => {
                assert!(location.is_none());
                assert_eq!(note.body(), "note");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(f.tracer.error_count(), 1);
    }

    #[tokio::test]
    async fn turns_are_mirrored_to_session_store() {
        let mut f = fixture(
            ScriptedAgent::texts(AgentRole::IntakeCoordinator, &["Hello!", "What brings you in?"]),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        f.controller.start().await;
        f.controller.handle_input("PT-1004").await;

        let id = f.controller.session().id.clone();
        let stored = f.sessions.turns(&id).await.unwrap();
        assert_eq!(stored, f.controller.transcript().turns().to_vec());
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn ensure_session_tolerates_existing() {
        let f = fixture(
            empty(AgentRole::IntakeCoordinator),
            empty(AgentRole::SymptomSpecialist),
            empty(AgentRole::ClinicalScribe),
        );
        f.controller.ensure_session().await;
        f.controller.ensure_session().await;
        let id = f.controller.session().id.clone();
        assert!(f.sessions.get_session(&id).await.unwrap().is_some());
    }
}
