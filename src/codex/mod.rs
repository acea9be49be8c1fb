//! Codex CLI integration.

pub mod subprocess;

pub use subprocess::{CodexProvider, check_codex_installed};
