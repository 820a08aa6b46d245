use std::io::{self, BufRead, Write};

use anyhow::Context;
use homeworth_core::audit::{AuditContext, NoopAuditSink};
use homeworth_core::config::{AppConfig, LoadOptions, LogFormat};
use homeworth_core::domain::session::SessionId;
use homeworth_core::errors::ApplicationError;
use homeworth_core::pricing::{LinearPriceModel, PricePredictor};
use homeworth_core::DialogueEngine;
use homeworth_db::{InMemorySessionRepository, SessionRepository};

use crate::commands::CommandResult;

const BANNER: &str = "Say 'hi' to start. Type 'quit' to leave.";

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let model = match LinearPriceModel::load_or_baseline(config.model.path.as_deref()) {
        Ok(model) => model,
        Err(error) => return CommandResult::failure("chat", "model_load", error.to_string(), 3),
    };
    let engine = DialogueEngine::new(model).with_purchase_url(&config.dialogue.purchase_url);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let sessions = InMemorySessionRepository::default();
    let session_id = SessionId::generate();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = runtime.block_on(converse(
        &engine,
        &sessions,
        &session_id,
        stdin.lock(),
        &mut stdout,
    ));

    match result {
        Ok(_) => CommandResult { exit_code: 0, output: String::new() },
        Err(error) => CommandResult::failure("chat", "io", format!("{error:#}"), 5),
    }
}

/// Drive one session from `input` until EOF or `quit`, returning the number of turns.
pub async fn converse<P, R, W>(
    engine: &DialogueEngine<P>,
    sessions: &dyn SessionRepository,
    session_id: &SessionId,
    input: R,
    output: &mut W,
) -> anyhow::Result<usize>
where
    P: PricePredictor,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{BANNER}")?;
    let mut turns = 0;

    for line in input.lines() {
        let line = line.context("failed to read from stdin")?;
        let utterance = line.trim();
        if matches!(utterance.to_ascii_lowercase().as_str(), "quit" | "exit") {
            break;
        }
        if utterance.is_empty() {
            continue;
        }

        let state = sessions.load(session_id).await?.unwrap_or_default();
        let audit = AuditContext::new(Some(session_id.clone()), format!("cli-{turns}"), "cli");
        match engine.handle_with_audit(&state, utterance, &NoopAuditSink, &audit) {
            Ok(turn) => {
                sessions.save(session_id, &turn.state).await?;
                tracing::debug!(
                    event_name = turn.outcome.event_name(),
                    session_id = %session_id,
                    phase = turn.phase().as_str(),
                    "chat turn handled"
                );
                writeln!(output, "bot: {}", turn.reply)?;
            }
            Err(error) => {
                let interface = ApplicationError::from(error).into_interface(audit.correlation_id);
                tracing::warn!(
                    event_name = "dialogue.cli.turn_failed",
                    session_id = %session_id,
                    error = %interface,
                    "chat turn failed"
                );
                writeln!(output, "bot: {}", interface.user_message())?;
            }
        }
        turns += 1;
    }

    output.flush()?;
    Ok(turns)
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
