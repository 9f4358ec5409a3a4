//! Line-numbered attachments of a file's pre-change content.
//!
//! With summarization enabled the content is condensed by file category:
//! documentation keeps its head, block-structured source keeps its skeleton
//! with function bodies collapsed, and anything else keeps a head/tail window.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Lines kept for documentation and data files (plus the final line).
const DOC_HEAD_LINES: usize = 25;

/// Head/tail window for files without a dedicated strategy.
const FALLBACK_HEAD_LINES: usize = 80;
const FALLBACK_TAIL_LINES: usize = 5;

/// Placeholder appended to a collapsed function signature.
const COLLAPSED_BODY: &str = " {…}";

const DOC_EXTENSIONS: &[&str] = &["md", "txt", "json", "yml", "yaml"];

const BLOCK_SOURCE_EXTENSIONS: &[&str] = &[
    "go", "rs", "c", "h", "cc", "cpp", "hpp", "java", "kt", "swift", "cs", "js", "jsx", "ts",
    "tsx", "scala", "php", "dart",
];

/// Kept lines keyed by 1-based line number. Overlapping windows collapse into one entry.
type KeptLines = BTreeMap<usize, String>;

/// Render `content` as an attachment block for `relative_path` inside `repo_root`.
pub fn build_attachment(
    repo_root: &Path,
    relative_path: &str,
    content: &str,
    summarize: bool,
) -> String {
    let base = Path::new(relative_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| relative_path.to_string());
    let abs = repo_root.join(relative_path);

    let lines = split_lines(content);
    let kept = if summarize {
        summarize_by_type(relative_path, &lines)
    } else {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.to_string()))
            .collect()
    };

    let largest = kept.keys().next_back().copied().unwrap_or(0);
    let width = largest.to_string().len().max(2);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<attachment id=\"{base}\" isSummarized=\"{summarize}\">"
    );
    out.push_str(&filepath_comment(relative_path, &abs));
    for (number, line) in &kept {
        let _ = writeln!(out, "{number:>width$}: {line}");
    }
    out.push_str("</attachment>\n");
    out
}

/// Split on `\n` after normalising CRLF; stray trailing `\r` is dropped per line.
fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn filepath_comment(relative_path: &str, abs: &Path) -> String {
    let abs = abs.display();
    match extension(relative_path).as_str() {
        "md" | "html" | "xml" | "yaml" | "yml" | "json" => {
            format!("<!-- filepath: {abs} -->\n")
        }
        "py" | "sh" | "rb" | "toml" => format!("# filepath: {abs}\n"),
        _ => format!("// filepath: {abs}\n"),
    }
}

fn summarize_by_type(relative_path: &str, lines: &[&str]) -> KeptLines {
    let ext = extension(relative_path);
    if DOC_EXTENSIONS.contains(&ext.as_str()) {
        head_plus_last(lines, DOC_HEAD_LINES)
    } else if BLOCK_SOURCE_EXTENSIONS.contains(&ext.as_str()) {
        summarize_block_source(lines)
    } else {
        head_tail(lines, FALLBACK_HEAD_LINES, FALLBACK_TAIL_LINES)
    }
}

fn head_plus_last(lines: &[&str], head: usize) -> KeptLines {
    let mut kept: KeptLines = lines
        .iter()
        .take(head)
        .enumerate()
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect();
    keep_last_line(lines, &mut kept);
    kept
}

fn head_tail(lines: &[&str], head: usize, tail: usize) -> KeptLines {
    let n = lines.len();
    let tail_start = n.saturating_sub(tail);
    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i < head || *i >= tail_start)
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

fn keep_last_line(lines: &[&str], kept: &mut KeptLines) {
    if let Some(last) = lines.last() {
        kept.insert(lines.len(), last.to_string());
    }
}

/// What the scanner is currently inside of.
enum Scan {
    /// Top level or inside a container body (class, impl, trait, ...).
    Structure,
    /// A declaration or import block kept verbatim until its brackets balance.
    KeepBlock { depth: i64 },
    /// A function signature spanning lines, waiting for its opening brace.
    Signature { line: usize },
    /// A function body being dropped until its braces balance.
    SkipBody { depth: i64 },
}

/// Condense brace-delimited source: keep imports, declarations, comments and
/// blank lines, collapse each function body to `signature {…}`.
///
/// Depth is tracked by counting brackets, so brackets inside string literals
/// or block comments can throw it off.
fn summarize_block_source(lines: &[&str]) -> KeptLines {
    let mut kept = KeptLines::new();
    let mut state = Scan::Structure;

    for (idx, line) in lines.iter().enumerate() {
        let number = idx + 1;
        let trimmed = line.trim();

        state = match state {
            Scan::KeepBlock { depth } => {
                kept.insert(number, line.to_string());
                let depth = depth + bracket_balance(line);
                if depth > 0 {
                    Scan::KeepBlock { depth }
                } else {
                    Scan::Structure
                }
            }
            Scan::SkipBody { depth } => {
                let depth = depth + brace_balance(line);
                if depth > 0 {
                    Scan::SkipBody { depth }
                } else {
                    Scan::Structure
                }
            }
            Scan::Signature { line: sig_line } => {
                if let Some(open) = line.find('{') {
                    if let Some(sig) = kept.get_mut(&sig_line) {
                        let head = sig.trim_end().to_string();
                        *sig = format!("{head}{COLLAPSED_BODY}");
                    }
                    body_state(&line[open..])
                } else if trimmed.ends_with(';') {
                    // Prototype or abstract declaration: no body follows.
                    Scan::Structure
                } else {
                    Scan::Signature { line: sig_line }
                }
            }
            Scan::Structure => scan_structure_line(number, line, trimmed, &mut kept),
        };
    }

    keep_last_line(lines, &mut kept);
    kept
}

fn scan_structure_line(number: usize, line: &str, trimmed: &str, kept: &mut KeptLines) -> Scan {
    if trimmed.is_empty() || is_comment(trimmed) || is_closing_line(trimmed) {
        kept.insert(number, line.to_string());
        return Scan::Structure;
    }

    let decl = strip_modifiers(trimmed);

    if is_import(decl) {
        kept.insert(number, line.to_string());
        return keep_block_state(line);
    }

    if is_function_start(decl) {
        return match line.find('{') {
            Some(open) => {
                let head = line[..open].trim_end();
                kept.insert(number, format!("{head}{COLLAPSED_BODY}"));
                body_state(&line[open..])
            }
            None => {
                kept.insert(number, line.to_string());
                if trimmed.ends_with(';') {
                    Scan::Structure
                } else {
                    Scan::Signature { line: number }
                }
            }
        };
    }

    if is_container(decl) {
        kept.insert(number, line.to_string());
        return Scan::Structure;
    }

    if is_declaration(decl) {
        kept.insert(number, line.to_string());
        return keep_block_state(line);
    }

    Scan::Structure
}

/// State after an opening brace that starts a function body.
fn body_state(from_open_brace: &str) -> Scan {
    let depth = brace_balance(from_open_brace);
    if depth > 0 {
        Scan::SkipBody { depth }
    } else {
        Scan::Structure
    }
}

fn keep_block_state(line: &str) -> Scan {
    let depth = bracket_balance(line);
    if depth > 0 {
        Scan::KeepBlock { depth }
    } else {
        Scan::Structure
    }
}

fn brace_balance(text: &str) -> i64 {
    text.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

fn bracket_balance(text: &str) -> i64 {
    text.chars().fold(0, |acc, c| match c {
        '{' | '(' | '[' => acc + 1,
        '}' | ')' | ']' => acc - 1,
        _ => acc,
    })
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with("*")
        || trimmed.starts_with('#')
        || trimmed.starts_with('@')
}

fn is_closing_line(trimmed: &str) -> bool {
    trimmed.starts_with('}') && trimmed.chars().all(|c| "})];,".contains(c))
}

const MODIFIERS: &[&str] = &[
    "pub", "export", "default", "public", "private", "protected", "internal", "abstract",
    "final", "async", "unsafe", "override", "open", "sealed", "inline", "virtual", "extern",
    "data",
];

/// Drop leading visibility and qualifier keywords, including `pub(crate)`-style scopes.
fn strip_modifiers(mut decl: &str) -> &str {
    loop {
        let before = decl;
        for modifier in MODIFIERS {
            if let Some(rest) = decl.strip_prefix(modifier) {
                if rest.starts_with(' ') {
                    decl = rest.trim_start();
                    break;
                }
                if rest.starts_with('(')
                    && let Some(close) = rest.find(')')
                {
                    decl = rest[close + 1..].trim_start();
                    break;
                }
            }
        }
        if decl == before {
            return decl;
        }
    }
}

fn starts_with_keyword(decl: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| {
        decl.strip_prefix(kw)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '(', '{', '<', '"']))
    })
}

fn is_import(decl: &str) -> bool {
    starts_with_keyword(decl, &["package", "import", "use", "using", "require", "library"])
        || decl.starts_with("extern crate")
}

fn is_container(decl: &str) -> bool {
    starts_with_keyword(
        decl,
        &[
            "class",
            "interface",
            "trait",
            "impl",
            "mod",
            "namespace",
            "object",
            "extension",
            "protocol",
        ],
    )
}

fn is_declaration(decl: &str) -> bool {
    starts_with_keyword(
        decl,
        &[
            "type", "const", "var", "let", "struct", "enum", "static", "union", "typedef",
            "record",
        ],
    )
}

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "match", "return", "catch", "do", "try", "new",
    "throw", "case", "loop", "defer", "go", "select",
];

fn is_function_start(decl: &str) -> bool {
    if starts_with_keyword(decl, &["func", "fn", "function", "fun", "def"]) {
        return true;
    }

    // `static void main(...)`, `const fn`, `static inline int f(...)`
    for prefix in ["static ", "const "] {
        if let Some(rest) = decl.strip_prefix(prefix) {
            let rest = strip_modifiers(rest.trim_start());
            if starts_with_keyword(rest, &["fn", "func", "function"]) {
                return true;
            }
            if prefix == "static " {
                return is_function_start(rest);
            }
        }
    }

    // Arrow functions bound to a name.
    if starts_with_keyword(decl, &["const", "let", "var"]) {
        return decl.contains("=>") && decl.trim_end().ends_with('{');
    }

    if starts_with_keyword(decl, CONTROL_KEYWORDS) || is_declaration(decl) || is_container(decl)
    {
        return false;
    }

    // C-family signature: `int main(int argc) {`, `void run()`, `Foo::bar(x,`
    let Some(paren) = decl.find('(') else {
        return false;
    };
    let head = &decl[..paren];
    if head.contains('=') || head.trim().is_empty() {
        return false;
    }
    let tail = decl.trim_end();
    tail.ends_with(['{', ')', ',', '(', ';'])
}
