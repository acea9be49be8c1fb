//! Shared prompt pieces: the fixed preamble and diff sanitizing.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Diffs are cut to this many bytes before they reach a prompt.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// Prepended to every model request.
pub const SYSTEM_PREAMBLE: &str = "You are a senior software engineer helping a developer \
prepare their work for code review. You write precise, conventional commit messages and clear \
pull request descriptions. Base every statement on the provided diff; never invent changes. \
Respond with a single JSON object exactly matching the requested shape, with no markdown \
fences and no commentary.";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid ANSI regex"));

static INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(ignore|disregard|forget)\s+(all\s+)?(previous|prior|above)\s+(instructions|prompts?|context)",
    )
    .expect("valid injection regex")
});

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid blank-line regex"));

/// Prefix a task prompt with [`SYSTEM_PREAMBLE`].
pub fn with_preamble(task: &str) -> String {
    format!("{SYSTEM_PREAMBLE}\n\n{task}")
}

/// A diff after sanitizing, with whether it had to be cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedDiff {
    pub text: String,
    pub truncated: bool,
}

/// Clean diff text for a prompt.
///
/// Strips control characters (keeping newlines and tabs) and ANSI escapes,
/// defuses "ignore previous instructions" style lines, collapses long blank
/// runs and truncates to `max_len` bytes on a char boundary.
pub fn sanitize_diff(text: &str, max_len: usize) -> SanitizedDiff {
    let without_ansi = ANSI_ESCAPE.replace_all(text, "");
    let printable: String = without_ansi
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let defused = INJECTION.replace_all(&printable, "[filtered]");
    let mut result = BLANK_RUNS.replace_all(&defused, "\n\n\n").into_owned();

    let truncated = result.len() > max_len;
    if truncated {
        let mut end = max_len;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }

    SanitizedDiff {
        text: result,
        truncated,
    }
}

/// A fenced diff section for a prompt, with a note when it was cut.
pub fn diff_section(heading: &str, diff: &str) -> String {
    let sanitized = sanitize_diff(diff, MAX_DIFF_LENGTH);
    let note = if sanitized.truncated {
        "\n\nNote: the diff was truncated due to size. Focus on the visible changes."
    } else {
        ""
    };
    format!("## {heading}\n```diff\n{}\n```{note}", sanitized.text.trim_end())
}
