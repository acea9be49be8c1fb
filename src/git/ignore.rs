//! Paths that never reach a model prompt.
//!
//! The same pattern list feeds both the git pathspec excludes and the
//! in-process matcher, so uncommitted-change diffs and range diffs are
//! filtered identically.

use std::sync::LazyLock;

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Lock files, generated output, images and type-config artifacts.
pub const IGNORE_PATTERNS: &[&str] = &[
    // lock files
    "**/package-lock.json",
    "**/pnpm-lock.yaml",
    "**/yarn.lock",
    "**/bun.lockb",
    "**/Cargo.lock",
    "**/composer.lock",
    "**/Gemfile.lock",
    "**/poetry.lock",
    "**/go.sum",
    "**/*.lock",
    // generated
    "**/dist/**",
    "**/*.min.js",
    "**/*.min.css",
    "**/*.map",
    "**/*.generated.*",
    // images
    "**/*.png",
    "**/*.jpg",
    "**/*.jpeg",
    "**/*.gif",
    "**/*.svg",
    "**/*.ico",
    "**/*.webp",
    "**/*.bmp",
    // type-config
    "**/*.d.ts",
    "**/*.tsbuildinfo",
];

static STANDARD: LazyLock<IgnoreSet> = LazyLock::new(|| {
    IgnoreSet::from_patterns(IGNORE_PATTERNS).expect("built-in ignore patterns are valid globs")
});

/// Matcher over [`IGNORE_PATTERNS`].
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl IgnoreSet {
    /// The built-in set.
    pub fn standard() -> &'static IgnoreSet {
        &STANDARD
    }

    pub fn from_patterns(patterns: &[&str]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            globs: builder.build()?,
        })
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.globs.is_match(path.trim_start_matches("./"))
    }

    /// Git pathspecs excluding every pattern.
    pub fn pathspecs(&self) -> Vec<String> {
        self.patterns
            .iter()
            .map(|p| format!(":(exclude,glob){p}"))
            .collect()
    }
}
