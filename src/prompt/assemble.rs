//! Assembles the system instruction and user payload from collected repository data.
//!
//! The output is a pure function of [`PromptData`]: no timestamps, no randomness and
//! no size enforcement. Callers truncate oversized diffs and content beforehand.

use std::fmt::Write as _;

use crate::prompt::message::NeutralMessage;

/// One staged file as it appears in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub diff: String,
    /// Already rendered as an attachment block.
    pub attachment: String,
}

/// Everything the assembler needs for one generation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptData {
    pub repository_name: String,
    pub branch_name: String,
    pub recent_user_commits: Vec<String>,
    pub recent_repo_commits: Vec<String>,
    pub changes: Vec<FileChange>,
    pub custom_instructions: Option<String>,
    pub system_prompt_template: Option<String>,
}

/// The base message pair: exactly one system and one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessages {
    pub system: NeutralMessage,
    pub user: NeutralMessage,
}

impl PromptMessages {
    pub fn to_vec(&self) -> Vec<NeutralMessage> {
        vec![self.system.clone(), self.user.clone()]
    }
}

impl From<PromptMessages> for Vec<NeutralMessage> {
    fn from(messages: PromptMessages) -> Self {
        vec![messages.system, messages.user]
    }
}

const SYSTEM_PROMPT: &str = "You are an AI programming assistant, helping a software developer to come with the best git commit message for their code changes.
You excel in interpreting the purpose behind code changes to craft succinct, clear commit messages that adhere to the repository's guidelines.

# First, think step-by-step:
1. Analyze the CODE CHANGES thoroughly to understand what's been modified.
2. Use the ORIGINAL CODE to understand the context of the CODE CHANGES. Use the line numbers to map the CODE CHANGES to the ORIGINAL CODE.
3. Identify the purpose of the changes to answer the *why* for the commit messages, also considering the optionally provided RECENT USER COMMITS.
4. Review the provided RECENT REPOSITORY COMMITS to identify established commit message conventions. Focus on the format and style, ignoring commit-specific details like refs, tags, and authors.
5. Generate a thoughtful and succinct commit message for the given CODE CHANGES. It MUST follow the established writing conventions.
6. Remove any meta information like issue references, tags, or author names from the commit message. The developer will add them.
7. Now only show your message, wrapped with a single markdown ```text codeblock! Do not provide any explanations or details
Follow Microsoft content policies.
Avoid content that violates copyrights.
If you are asked to generate content that is harmful, hateful, racist, sexist, lewd, or violent, only respond with \"Sorry, I can't assist with that.\"
Keep your answers short and impersonal.
";

const REMINDER: &str = "Now generate a commit messages that describe the CODE CHANGES.
DO NOT COPY commits from RECENT COMMITS, but use it as reference for the commit style.
ONLY return a single markdown code block, NO OTHER PROSE!
```text
commit message goes here
```
";

/// Build the system and user messages for `data`.
pub fn build_messages(data: &PromptData) -> PromptMessages {
    PromptMessages {
        system: NeutralMessage::system(system_text(data)),
        user: NeutralMessage::user(user_text(data)),
    }
}

/// The built-in instruction, or the override template with repository placeholders filled in.
fn system_text(data: &PromptData) -> String {
    match data
        .system_prompt_template
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        Some(template) => render_template(template, data),
        None => SYSTEM_PROMPT.to_string(),
    }
}

fn render_template(template: &str, data: &PromptData) -> String {
    template
        .replace("{{.RepositoryName}}", &data.repository_name)
        .replace("{{RepositoryName}}", &data.repository_name)
        .replace("{{.BranchName}}", &data.branch_name)
        .replace("{{BranchName}}", &data.branch_name)
}

fn user_text(data: &PromptData) -> String {
    let mut out = String::new();

    out.push_str("<repository-context>\n# REPOSITORY DETAILS:\n");
    let _ = writeln!(out, "Repository name: {}", data.repository_name);
    let _ = writeln!(out, "Branch name: {}\n", data.branch_name);
    out.push_str("</repository-context>\n");

    push_commit_section(
        &mut out,
        "user-commits",
        "# RECENT USER COMMITS (For reference only, do not copy!):",
        &data.recent_user_commits,
    );
    push_commit_section(
        &mut out,
        "recent-commits",
        "# RECENT REPOSITORY COMMITS (For reference only, do not copy!):",
        &data.recent_repo_commits,
    );

    out.push_str("<changes>\n");
    for change in &data.changes {
        out.push_str("<original-code>\n# ORIGINAL CODE:\n");
        out.push_str(&change.attachment);
        out.push_str("\n</original-code>\n");

        out.push_str("<code-changes>\n# CODE CHANGES:\n```diff\n");
        out.push_str(change.diff.trim_end_matches('\n'));
        out.push_str("\n```\n</code-changes>\n");
    }
    out.push_str("\n</changes>\n");

    out.push_str("<reminder>\n");
    out.push_str(REMINDER);
    out.push_str("</reminder>\n");

    out.push_str("<custom-instructions>\n");
    if let Some(instructions) = data
        .custom_instructions
        .as_deref()
        .filter(|i| !i.trim().is_empty())
    {
        out.push_str(instructions.trim_end_matches('\n'));
        out.push('\n');
    }
    out.push_str("\n</custom-instructions>\n");

    out
}

/// Append a bulleted commit list wrapped in `<tag>`; nothing is written for an empty list.
fn push_commit_section(out: &mut String, tag: &str, heading: &str, commits: &[String]) {
    if commits.is_empty() {
        return;
    }
    let _ = writeln!(out, "<{tag}>\n{heading}");
    for commit in commits {
        let _ = writeln!(out, "- {commit}");
    }
    let _ = writeln!(out, "\n</{tag}>");
}
