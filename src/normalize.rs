//! Prompt-text cleanup shared by the local cleaner and the union stage.
//!
//! The transform runs three steps in order: drop a leading block of import
//! statements, unwrap a surrounding code fence, and collapse whitespace. The
//! pipeline is repeated until the text stops changing, so normalizing a
//! normalized prompt is a no-op.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::normalize::CODE_FENCE;
use crate::utils::normalize_inline_whitespace;

static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:from\s+\w+(?:\.\w+)*\s+import\s+.*|import\s+[\w.,\s*]+)\s*$")
        .expect("import-line pattern is valid")
});

static FENCE_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w+#.-]*$").expect("fence-info pattern is valid"));

/// Normalize free-form prompt text. Always returns a string, possibly empty.
pub fn normalize_prompt(text: &str) -> String {
    let mut current = normalize_once(text);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// True when a normalized prompt is long enough and not blank.
pub fn is_acceptable_prompt(prompt: &str, min_chars: usize) -> bool {
    !prompt.trim().is_empty() && prompt.chars().count() >= min_chars
}

fn normalize_once(text: &str) -> String {
    let without_imports = strip_leading_imports(text);
    let unfenced = strip_code_fence(&without_imports);
    normalize_inline_whitespace(unfenced)
}

/// Remove the contiguous import block at the start of `text`.
///
/// Only newline-terminated lines count as imports, so a final line of prose
/// that happens to start with "import" is kept. Blank lines inside the block
/// are removed with it. When the text opens
/// with a fence line, the block is looked for right after that line and the
/// fence line itself is kept for [`strip_code_fence`].
pub fn strip_leading_imports(text: &str) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let start = match lines.first() {
        Some(first) if is_fence_opener_line(first) => 1,
        _ => 0,
    };

    let mut end = start;
    let mut imports = 0usize;
    while end < lines.len() {
        let line = lines[end];
        if line.ends_with('\n') && IMPORT_LINE.is_match(line) {
            imports += 1;
        } else if !line.trim().is_empty() {
            break;
        }
        end += 1;
    }
    if imports == 0 {
        return text.to_string();
    }

    let mut kept = String::with_capacity(text.len());
    for line in lines[..start].iter().chain(lines[end..].iter()) {
        kept.push_str(line);
    }
    kept
}

/// Remove a code-fence marker at the start and at the end of `text`.
///
/// An opening fence followed by a language word on its own line drops the
/// whole line. Content between the fences is left as-is.
pub fn strip_code_fence(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(CODE_FENCE) {
        body = match rest.split_once('\n') {
            Some((info, after)) if FENCE_INFO.is_match(info.trim()) => after,
            _ => rest,
        };
    }
    let body = body.trim_end();
    let body = body.strip_suffix(CODE_FENCE).unwrap_or(body);
    body.trim().to_string()
}

fn is_fence_opener_line(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(CODE_FENCE)
        .is_some_and(|info| line.ends_with('\n') && FENCE_INFO.is_match(info.trim()))
}
