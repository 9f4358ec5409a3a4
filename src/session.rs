//! The generate / confirm loop.
//!
//! A run moves through explicit states: generate a candidate, ask the user,
//! then commit, edit, regenerate or cancel. [`transition`] is the pure part of
//! that machine; [`run_session`] performs the side effects for each state.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{GitError, SessionError};
use crate::llm::{Provider, generate_with_retry};
use crate::prompt::{NeutralMessage, PromptMessages, conventional_reminder, extract_commit_message};

pub use crate::ui::Decision;

/// Where the loop currently is. Candidates travel with the state that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Generating,
    AwaitingConfirmation(String),
    Committing(String),
    Editing(String),
    Regenerating,
    Cancelling,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Committing(_) | State::Cancelling)
    }
}

/// Apply a user decision. Only a candidate awaiting confirmation reacts to decisions.
pub fn transition(state: State, decision: Decision) -> State {
    match state {
        State::AwaitingConfirmation(candidate) => match decision {
            Decision::Commit => State::Committing(candidate),
            Decision::Edit => State::Editing(candidate),
            Decision::Regenerate => State::Regenerating,
            Decision::Cancel => State::Cancelling,
        },
        other => other,
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    WroteHookFile(PathBuf),
    Cancelled,
}

/// The user-facing side of the loop.
pub trait Interaction {
    /// Show `candidate` and ask what to do with it.
    fn confirm(&mut self, candidate: &str) -> Result<Decision, SessionError>;

    /// Let the user rewrite `candidate`. Returning it unchanged is fine.
    fn edit(&mut self, candidate: &str) -> Result<String, SessionError>;

    /// Show `message` with activity feedback until [`Interaction::finish_progress`].
    fn start_progress(&mut self, message: &str);

    fn finish_progress(&mut self);

    fn notice(&mut self, message: &str);

    fn warn(&mut self, message: &str);
}

/// Records a confirmed message.
#[cfg_attr(test, mockall::automock)]
pub trait CommitSink {
    fn commit(&self, message: &str) -> Result<(), GitError>;
}

/// Commits through the system git binary in a repository root.
pub struct GitCommitter {
    root: PathBuf,
}

impl GitCommitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CommitSink for GitCommitter {
    fn commit(&self, message: &str) -> Result<(), GitError> {
        crate::git::commit(&self.root, message)
    }
}

/// Per-run settings for [`run_session`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub temperature: f64,
    /// Append the Conventional Commits reminder to every request.
    pub conventional: bool,
    /// Hook mode: write the accepted message here instead of committing.
    pub hook_file: Option<PathBuf>,
}

/// The messages sent on every attempt: the base pair plus the optional reminder.
pub fn request_messages(base: &PromptMessages, conventional: bool) -> Vec<NeutralMessage> {
    let mut messages = base.to_vec();
    if conventional {
        messages.push(conventional_reminder());
    }
    messages
}

/// Drive generation and confirmation until the user commits or cancels.
pub async fn run_session<P, I, C>(
    provider: &P,
    base: &PromptMessages,
    options: &SessionOptions,
    ui: &mut I,
    sink: &C,
) -> Result<Outcome, SessionError>
where
    P: Provider + ?Sized,
    I: Interaction,
    C: CommitSink,
{
    let messages = request_messages(base, options.conventional);
    let mut state = State::Generating;

    loop {
        state = match state {
            State::Generating => {
                ui.start_progress("Generating commit message...");
                let generated =
                    generate_with_retry(provider, &messages, options.temperature, |attempt, max| {
                        ui.warn(&format!(
                            "Provider returned no choices. Retrying ({attempt}/{max})..."
                        ));
                    })
                    .await;
                ui.finish_progress();
                let raw = generated?;

                let extraction = extract_commit_message(&raw);
                if !extraction.well_formed {
                    ui.warn("Model formatting issue (raw output shown below)");
                }
                debug!("Candidate message is {} bytes", extraction.message.len());
                State::AwaitingConfirmation(extraction.message)
            }
            State::AwaitingConfirmation(candidate) => {
                let decision = ui.confirm(&candidate)?;
                debug!("User chose {decision:?}");
                transition(State::AwaitingConfirmation(candidate), decision)
            }
            State::Editing(candidate) => State::AwaitingConfirmation(ui.edit(&candidate)?),
            State::Regenerating => {
                ui.notice("Regenerating...");
                State::Generating
            }
            State::Committing(message) => {
                return match &options.hook_file {
                    Some(path) => {
                        write_hook_file(path, &message)?;
                        ui.notice("Message generated for git hook.");
                        Ok(Outcome::WroteHookFile(path.clone()))
                    }
                    None => {
                        sink.commit(&message)?;
                        info!("Committed");
                        Ok(Outcome::Committed)
                    }
                };
            }
            State::Cancelling => {
                ui.notice("Cancelled.");
                return if options.hook_file.is_some() {
                    Err(SessionError::Cancelled)
                } else {
                    Ok(Outcome::Cancelled)
                };
            }
        };
    }
}

fn write_hook_file(path: &Path, message: &str) -> Result<(), SessionError> {
    std::fs::write(path, message).map_err(|source| SessionError::WriteHookFile {
        path: path.to_path_buf(),
        source,
    })
}
