//! Terminal interaction for the confirm loop using dialoguer and console.

use std::time::Duration;

use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Editor, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::SessionError;
use crate::session::Interaction;

/// What the user wants done with a candidate message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Commit,
    Edit,
    Regenerate,
    Cancel,
}

impl Decision {
    /// Menu order shown to the user.
    pub const ALL: [Decision; 4] = [
        Decision::Commit,
        Decision::Edit,
        Decision::Regenerate,
        Decision::Cancel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Commit => "Commit",
            Decision::Edit => "Edit",
            Decision::Regenerate => "Regenerate",
            Decision::Cancel => "Cancel",
        }
    }
}

/// dialoguer-backed [`Interaction`] writing to stderr.
pub struct TerminalUi {
    term: Term,
    theme: ColorfulTheme,
    spinner: Option<ProgressBar>,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
            spinner: None,
        }
    }

    fn print(&self, line: &str) {
        // A closed stderr leaves nothing useful to report to.
        let write = || {
            let _ = self.term.write_line(line);
        };
        match &self.spinner {
            Some(spinner) => spinner.suspend(write),
            None => write(),
        }
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction for TerminalUi {
    fn confirm(&mut self, candidate: &str) -> Result<Decision, SessionError> {
        self.print("");
        self.print(&style("Suggested commit message:").bold().to_string());
        self.print(&style("─".repeat(50)).dim().to_string());
        for line in candidate.lines() {
            self.print(&style(line).cyan().to_string());
        }
        self.print(&style("─".repeat(50)).dim().to_string());

        let labels: Vec<&str> = Decision::ALL.iter().map(Decision::label).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_on(&self.term)
            .map_err(|e| SessionError::Ui(e.to_string()))?;

        Ok(Decision::ALL
            .get(selection)
            .copied()
            .unwrap_or(Decision::Cancel))
    }

    fn edit(&mut self, candidate: &str) -> Result<String, SessionError> {
        let edited = Editor::new()
            .require_save(true)
            .edit(candidate)
            .map_err(|e| SessionError::Ui(e.to_string()))?;

        // Closing the editor without saving keeps the current text.
        Ok(edited
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| candidate.to_string()))
    }

    fn start_progress(&mut self, message: &str) {
        self.finish_progress();

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(spinner);
    }

    fn finish_progress(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn notice(&mut self, message: &str) {
        self.print(&style(message).dim().to_string());
    }

    fn warn(&mut self, message: &str) {
        self.print(&format!("{} {}", style("warning:").yellow().bold(), message));
    }
}
