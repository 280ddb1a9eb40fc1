//! `mediscreen run`: Interactive patient intake session.

use std::sync::Arc;

use mediscreen_agent::{TurnController, TurnOutcome, Utterance, build_agent_set, routing_rules};
use mediscreen_config::AppConfig;
use mediscreen_core::note::ClinicalNote;
use mediscreen_core::session::Session;
use mediscreen_core::trace::Tracer;
use mediscreen_storage::{FileNoteStore, open_session_store};
use mediscreen_telemetry::FileTracer;
use mediscreen_tools::PatientArchive;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

const RULE_WIDTH: usize = 50;

/// Providers that run locally and accept an empty key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp"];

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub(crate) fn banner() -> String {
    format!("\n{}\n🏥  MEDISCREEN AI  |  System Online\n{}\n", rule(), rule())
}

pub(crate) fn framed_note(note: &ClinicalNote) -> String {
    format!("{}\n{}\n{}", rule(), note.body(), rule())
}

pub(crate) fn needs_api_key(config: &AppConfig) -> bool {
    !KEYLESS_PROVIDERS.contains(&config.default_provider.as_str()) && !config.has_api_key()
}

fn say(out: &mut impl Write, utterance: &Utterance) -> io::Result<()> {
    writeln!(out, "\n{}\n", utterance.render())
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "Patient: ")?;
    out.flush()
}

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ending {
    /// The note was generated; `saved` is false when it could not be written.
    Completed { saved: bool },
    PatientLeft,
    EndOfInput,
    Interrupted,
}

/// Drive `controller` from `input` until the session ends.
///
/// `shutdown` is polled for the whole session, including while an agent
/// turn is in flight; when it fires the current turn is abandoned.
pub(crate) async fn converse<R, W>(
    controller: &mut TurnController,
    input: R,
    out: &mut W,
    shutdown: impl Future<Output = ()>,
) -> io::Result<Ending>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    tokio::pin!(shutdown);

    let greeting = tokio::select! {
        greeting = controller.start() => greeting,
        () = &mut shutdown => return interrupted(out),
    };
    for utterance in &greeting {
        say(out, utterance)?;
    }

    let mut lines = input.lines();
    loop {
        prompt(out)?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut shutdown => return interrupted(out),
        };
        let Some(line) = line else {
            writeln!(out)?;
            return Ok(Ending::EndOfInput);
        };

        let outcome = tokio::select! {
            outcome = controller.handle_input(&line) => outcome,
            () = &mut shutdown => return interrupted(out),
        };

        match outcome {
            TurnOutcome::Reprompt(utterance) => say(out, &utterance)?,
            TurnOutcome::Replies(replies) => {
                for utterance in &replies {
                    say(out, utterance)?;
                }
            }
            TurnOutcome::Exit => {
                writeln!(out, "\nClosing Session. Goodbye!")?;
                return Ok(Ending::PatientLeft);
            }
            TurnOutcome::Completed {
                replies,
                note,
                location,
            } => {
                for utterance in &replies {
                    say(out, utterance)?;
                }
                writeln!(out, "{}", framed_note(&note))?;
                return Ok(Ending::Completed {
                    saved: location.is_some(),
                });
            }
        }
    }
}

fn interrupted(out: &mut impl Write) -> io::Result<Ending> {
    writeln!(out, "\nSystem forced shutdown.")?;
    out.flush()?;
    Ok(Ending::Interrupted)
}

/// Resolves on the first Ctrl+C. If the handler cannot be installed the
/// session simply runs without one.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if needs_api_key(&config) {
        eprintln!();
        eprintln!("  ERROR: No API key configured for '{}'!", config.default_provider);
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    GEMINI_API_KEY     = '...'   (default provider)");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'");
        eprintln!("    MEDISCREEN_API_KEY = '...'   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let tracer = Arc::new(FileTracer::daily(&config.paths.logs_dir));
    tracer.system("--- SYSTEM STARTUP ---");

    let sessions = open_session_store(&config.session).await?;
    let notes = Arc::new(FileNoteStore::new(&config.paths.logs_dir));
    let archive = Arc::new(PatientArchive::new(&config.paths.patient_data));

    let router = mediscreen_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    tracing::debug!(
        provider = %config.default_provider,
        model = %config.default_model,
        "Starting intake session"
    );
    let agents = build_agent_set(&config, provider, archive, tracer.clone());
    let mut controller = TurnController::new(
        agents,
        Session::new(&config.session.app_name, &config.session.user_id),
        routing_rules(&config),
        tracer.clone(),
        sessions,
        notes,
    );

    println!("{}", banner());
    let stdin = BufReader::new(tokio::io::stdin());
    let ending = converse(&mut controller, stdin, &mut io::stdout(), ctrl_c()).await?;
    match ending {
        Ending::Interrupted => tracer.system("System forced shutdown."),
        Ending::Completed { saved: false } => {
            eprintln!(
                "  ⚠️  The note could not be saved to {}",
                config.paths.logs_dir.display()
            );
        }
        Ending::Completed { saved: true } | Ending::PatientLeft | Ending::EndOfInput => {}
    }

    Ok(())
}
