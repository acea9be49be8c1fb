//! Diff collection for model prompts, with ignored paths filtered out.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::error::GitError;
use crate::git::{IgnoreSet, VersionControl};

/// Diff text ready for a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedDiff {
    pub text: String,
    /// Paths whose changes are in `text`.
    pub files: Vec<String>,
    /// Paths that had no computable diff.
    pub skipped: Vec<String>,
}

impl CollectedDiff {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn from_unified(text: &str, ignore: &IgnoreSet) -> Self {
        let mut kept = String::new();
        let mut files = Vec::new();

        for section in split_sections(text) {
            match section.path.as_deref() {
                Some(path) if ignore.is_ignored(path) => {
                    debug!(path, "dropping ignored path from diff");
                }
                path => {
                    if let Some(path) = path {
                        files.push(path.to_string());
                    }
                    kept.push_str(section.text);
                }
            }
        }

        Self {
            text: kept,
            files,
            skipped: Vec::new(),
        }
    }
}

/// One `diff --git` section of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section<'a> {
    path: Option<Cow<'a, str>>,
    text: &'a str,
}

/// Split unified diff text at each file header.
fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut starts: Vec<usize> = text
        .match_indices("diff --")
        .map(|(idx, _)| idx)
        .filter(|&idx| idx == 0 || text.as_bytes()[idx - 1] == b'\n')
        .collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let ends: Vec<usize> = starts.iter().skip(1).copied().chain([text.len()]).collect();

    starts
        .iter()
        .zip(&ends)
        .filter(|(start, end)| start < end)
        .map(|(&start, &end)| {
            let chunk = &text[start..end];
            let header = chunk.lines().next().unwrap_or("");
            Section {
                path: header_path(header),
                text: chunk,
            }
        })
        .collect()
}

/// Post-image path from a `diff --git a/x b/y` or `diff --cc x` header.
///
/// git quotes paths holding special bytes (`"b/caf\303\251.ts"`); those are
/// unescaped.
fn header_path(header: &str) -> Option<Cow<'_, str>> {
    if let Some(rest) = header.strip_prefix("diff --git ") {
        if let Some(quoted) = rest.strip_suffix('"') {
            let idx = quoted.rfind(" \"b/")?;
            return Some(unquote(&quoted[idx + 4..]));
        }
        return rest.rfind(" b/").map(|idx| Cow::Borrowed(&rest[idx + 3..]));
    }
    let path = header
        .strip_prefix("diff --cc ")
        .or_else(|| header.strip_prefix("diff --combined "))?;
    match path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(quoted) => Some(unquote(quoted)),
        None => Some(Cow::Borrowed(path)),
    }
}

/// Undo git's C-style path quoting; the surrounding quotes are already gone.
fn unquote(quoted: &str) -> Cow<'_, str> {
    if !quoted.contains('\\') {
        return Cow::Borrowed(quoted);
    }

    let mut bytes = Vec::with_capacity(quoted.len());
    let mut rest = quoted.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        rest = tail;
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let Some((&escaped, tail)) = rest.split_first() else {
            bytes.push(byte);
            break;
        };
        rest = tail;
        match escaped {
            b'0'..=b'7' => {
                let digits: Vec<u8> = std::iter::once(escaped)
                    .chain(rest.iter().copied().take(2).take_while(|b| (b'0'..=b'7').contains(b)))
                    .collect();
                rest = &rest[digits.len() - 1..];
                let value = digits
                    .iter()
                    .fold(0u32, |acc, &d| acc * 8 + u32::from(d - b'0'));
                bytes.push(value as u8);
            }
            b'a' => bytes.push(0x07),
            b'b' => bytes.push(0x08),
            b'f' => bytes.push(0x0c),
            b'n' => bytes.push(b'\n'),
            b'r' => bytes.push(b'\r'),
            b't' => bytes.push(b'\t'),
            b'v' => bytes.push(0x0b),
            other => bytes.push(other),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads diffs through a [`VersionControl`] and drops ignored paths.
pub struct DiffCollector<'a> {
    git: &'a dyn VersionControl,
    ignore: &'a IgnoreSet,
}

impl<'a> DiffCollector<'a> {
    pub fn new(git: &'a dyn VersionControl, ignore: &'a IgnoreSet) -> Self {
        Self { git, ignore }
    }

    /// Staged plus unstaged diff of each non-ignored path.
    ///
    /// A path whose diff is empty or cannot be read is recorded in
    /// `skipped` and does not abort collection.
    pub async fn uncommitted_diff(&self, paths: &[String]) -> CollectedDiff {
        let mut collected = CollectedDiff::default();

        for path in paths {
            if self.ignore.is_ignored(path) {
                debug!(path = %path, "ignored path left out of commit context");
                continue;
            }

            let mut text = String::new();
            let mut failed = false;
            for staged in [true, false] {
                match self.git.diff_path(path, staged).await {
                    Ok(diff) => text.push_str(&diff),
                    Err(e) => {
                        warn!(path = %path, staged, "could not diff path: {e}");
                        failed = true;
                    }
                }
            }

            // A staged rename can carry a section for its old path.
            let text = CollectedDiff::from_unified(&text, self.ignore).text;
            if text.trim().is_empty() {
                if !failed {
                    warn!(path = %path, "no diff available for changed path");
                }
                collected.skipped.push(path.clone());
                continue;
            }

            collected.text.push_str(&text);
            if !text.ends_with('\n') {
                collected.text.push('\n');
            }
            collected.files.push(path.clone());
        }

        collected
    }

    /// Diff between `from` and `to` with ignored paths removed.
    pub async fn range_diff(&self, from: &str, to: &str) -> Result<CollectedDiff, GitError> {
        let raw = self
            .git
            .diff_range(from, to, &self.ignore.pathspecs())
            .await?;
        Ok(CollectedDiff::from_unified(&raw, self.ignore))
    }

    /// Patch of a single commit with ignored paths removed.
    pub async fn single_commit_diff(&self, hash: &str) -> Result<CollectedDiff, GitError> {
        let raw = self.git.show(hash, &self.ignore.pathspecs()).await?;
        Ok(CollectedDiff::from_unified(&raw, self.ignore))
    }
}
