//! Interactive console: prompt loop and live rendering of session events.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::error::{Result, ThinkcapError};
use crate::session::{Session, SessionEvent};

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Exit,
    Reset,
    Skip,
    Message(String),
}

pub fn parse_input(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Skip;
    }
    match line.to_lowercase().as_str() {
        "/exit" => ConsoleCommand::Exit,
        "/reset" => ConsoleCommand::Reset,
        _ => ConsoleCommand::Message(line.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Thinking,
    Answer,
}

/// Writes reasoning under `Thinking: ` and the answer under `Assistant: `.
pub struct ConsoleRenderer<W: Write + Send> {
    state: Mutex<(W, Option<Section>)>,
}

impl<W: Write + Send> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new((out, None)),
        }
    }

    pub fn handle(&self, event: SessionEvent) {
        let Ok(mut guard) = self.state.lock() else {
            return;
        };
        let (out, section) = &mut *guard;
        match event {
            SessionEvent::ReasoningDelta { text } | SessionEvent::EarlyStopInjected { directive: text } => {
                enter(out, section, Section::Thinking, "Thinking: ");
                let _ = write!(out, "{text}");
            }
            SessionEvent::AnswerDelta { text } => {
                enter(out, section, Section::Answer, "Assistant: ");
                let _ = write!(out, "{text}");
            }
            SessionEvent::TurnCommitted { outcome } => {
                if section.take().is_some() {
                    let _ = writeln!(out);
                }
                if outcome.answer_truncated {
                    let _ = writeln!(out, "[answer cut off at the answer budget]");
                }
                if outcome.termination_unknown {
                    let _ = writeln!(out, "[stream ended without a stop reason]");
                }
            }
            SessionEvent::TurnFailed { .. } => {
                if section.take().is_some() {
                    let _ = writeln!(out);
                }
            }
            SessionEvent::PassStarted { .. } | SessionEvent::PassFinished { .. } => {}
        }
        let _ = out.flush();
    }

    pub fn into_inner(self) -> W {
        match self.state.into_inner() {
            Ok((out, _)) => out,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

fn enter<W: Write>(out: &mut W, section: &mut Option<Section>, next: Section, header: &str) {
    if *section == Some(next) {
        return;
    }
    if section.is_some() {
        let _ = writeln!(out);
    }
    let _ = write!(out, "{header}");
    *section = Some(next);
}

/// Run the prompt loop until `/exit`, EOF, or Ctrl-C at the prompt.
///
/// Ctrl-C while a turn is streaming cancels only that turn.
pub async fn run(config: SessionConfig) -> Result<()> {
    let renderer = ConsoleRenderer::new(std::io::stdout());
    let mut session = Session::from_config(config)?
        .with_event_sink(Arc::new(move |event: SessionEvent| renderer.handle(event)));

    tracing::debug!(
        session_id = %session.id(),
        endpoint = %session.config().endpoint,
        model = %session.config().model,
        "console session started"
    );
    println!("Chat CLI started. Type '/exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match parse_input(&line) {
            ConsoleCommand::Exit => break,
            ConsoleCommand::Skip => continue,
            ConsoleCommand::Reset => {
                session.reset();
                println!("Conversation cleared.");
            }
            ConsoleCommand::Message(text) => {
                let cancel = CancellationToken::new();
                let watcher = {
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    })
                };
                let result = session.submit_turn_with_cancel(&text, cancel).await;
                watcher.abort();

                match result {
                    Ok(_) => {}
                    Err(ThinkcapError::Cancelled) => eprintln!("(turn cancelled)"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }
    }

    Ok(())
}
