//! Prompt construction: attachments, message assembly and answer extraction.

pub mod assemble;
pub mod attachment;
pub mod extract;
pub mod message;

pub use assemble::{FileChange, PromptData, PromptMessages, build_messages};
pub use attachment::build_attachment;
pub use extract::{Extraction, extract_commit_message};
pub use message::{NeutralMessage, Role, conventional_reminder, dump_messages};
