//! Provider-neutral chat messages and the prompt dump.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in the shape every backend adapter translates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeutralMessage {
    pub role: Role,
    pub parts: Vec<String>,
}

impl NeutralMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![text.into()],
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// All parts joined in order.
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

const CONVENTIONAL_REMINDER: &str = "CRITICAL INSTRUCTION: You must strictly follow the Conventional Commits specification (e.g. 'feat: add spinner', 'fix: resolve bug').\nDo not just describe the change; prefix it with the type.";

/// Trailing user message that pushes the model toward `type: description` subjects.
pub fn conventional_reminder() -> NeutralMessage {
    NeutralMessage::user(CONVENTIONAL_REMINDER)
}

/// Write `messages` as indented JSON to `path`, or to stdout when no path is given.
pub fn dump_messages(messages: &[NeutralMessage], path: Option<&Path>) -> io::Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_messages(messages, &mut writer)?;
            writer.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_messages(messages, &mut lock)?;
            lock.flush()
        }
    }
}

fn write_messages<W: Write>(messages: &[NeutralMessage], writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, messages).map_err(io::Error::other)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&NeutralMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","parts":["hi"]}"#);
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_text_concatenates_parts() {
        let msg = NeutralMessage {
            role: Role::User,
            parts: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(msg.text(), "ab");
    }

    #[test]
    fn test_conventional_reminder_is_user_message() {
        let reminder = conventional_reminder();
        assert_eq!(reminder.role, Role::User);
        assert!(reminder.text().contains("Conventional Commits"));
    }

    #[test]
    fn test_write_messages_is_indented_json() {
        let messages = vec![NeutralMessage::system("sys"), NeutralMessage::user("usr")];
        let mut buf = Vec::new();
        write_messages(&messages, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.starts_with("[\n  {\n    \"role\": \"system\""));
        let parsed: Vec<NeutralMessage> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, messages);
    }

    #[test]
    fn test_dump_messages_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.json");
        dump_messages(&[NeutralMessage::user("x")], Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"role\": \"user\""));
    }
}
