//! Claude CLI integration.

pub mod subprocess;

pub use subprocess::{ClaudeProvider, check_claude_installed};
