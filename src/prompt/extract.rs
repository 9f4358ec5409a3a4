//! Extraction of the commit message from a model response.
//!
//! Models are asked for exactly one fenced code block. Responses that don't comply
//! are passed through as trimmed text and flagged so the caller can warn.

/// Extracted candidate text and whether the response honoured the single-block format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub message: String,
    pub well_formed: bool,
}

/// Pull the contents of the single fenced code block out of `raw`.
///
/// Prose around the fence is ignored. No fence, an unterminated fence or more
/// than one block yields the trimmed input with `well_formed == false`.
pub fn extract_commit_message(raw: &str) -> Extraction {
    let trimmed = raw.trim();

    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in trimmed.lines() {
        let fence = line.trim();
        if current.is_none() {
            if is_opening_fence(fence) {
                current = Some(Vec::new());
            }
        } else if is_closing_fence(fence) {
            blocks.extend(current.take());
        } else if let Some(block) = current.as_mut() {
            block.push(line);
        }
    }

    if current.is_none()
        && let [block] = blocks.as_slice()
    {
        let inner = block.join("\n").trim().to_string();
        if !inner.is_empty() {
            return Extraction {
                message: inner,
                well_formed: true,
            };
        }
    }

    Extraction {
        message: trimmed.to_string(),
        well_formed: false,
    }
}

/// "```" optionally followed by a word-like language tag.
fn is_opening_fence(line: &str) -> bool {
    line.strip_prefix("```").is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '+')
    })
}

fn is_closing_fence(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '`')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_text_block() {
        let result = extract_commit_message("```text\nfeat: add X\n```");
        assert_eq!(
            result,
            Extraction {
                message: "feat: add X".to_string(),
                well_formed: true
            }
        );
    }

    #[test]
    fn test_no_fence_returns_trimmed_input() {
        let result = extract_commit_message("  no code fence here \n");
        assert_eq!(result.message, "no code fence here");
        assert!(!result.well_formed);
    }

    #[test]
    fn test_prose_around_fence_is_ignored() {
        let raw = "Here is your message:\n\n```\nfix(parser): handle empty input\n\nBody line.\n```\nHope that helps!";
        let result = extract_commit_message(raw);
        assert_eq!(result.message, "fix(parser): handle empty input\n\nBody line.");
        assert!(result.well_formed);
    }

    #[test]
    fn test_unterminated_fence_is_not_well_formed() {
        let result = extract_commit_message("```text\nfeat: add X");
        assert_eq!(result.message, "```text\nfeat: add X");
        assert!(!result.well_formed);
    }

    #[test]
    fn test_multiple_blocks_are_not_well_formed() {
        let raw = "```text\nfeat: one\n```\n```text\nfeat: two\n```";
        let result = extract_commit_message(raw);
        assert_eq!(result.message, raw);
        assert!(!result.well_formed);
    }

    #[test]
    fn test_empty_block_is_not_well_formed() {
        let result = extract_commit_message("```text\n\n```");
        assert!(!result.well_formed);
    }

    #[test]
    fn test_crlf_response() {
        let result = extract_commit_message("```text\r\nchore: bump deps\r\n```\r\n");
        assert_eq!(result.message, "chore: bump deps");
        assert!(result.well_formed);
    }
}
