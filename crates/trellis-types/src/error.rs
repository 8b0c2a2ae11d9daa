//! Error types for trellis.

use std::io;

/// Errors produced by the trellis framework outside of command dispatch.
///
/// Dispatch failures (no match, handler errors) never surface as a
/// `ShellError`; sessions report those on their own output.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("config error: {0}")]
    Config(String),

    #[error("history error: {0}")]
    History(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
