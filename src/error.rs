//! Error types for ultimux.
//!
//! All errors in ultimux are represented by [`UltimuxError`], which covers
//! config loading, session validation, ssh resolution and tmux replay. Every
//! error is fatal to the current run.

use std::path::PathBuf;
use thiserror::Error;

/// All possible errors that can occur in ultimux.
#[derive(Error, Debug)]
pub enum UltimuxError {
    /// Config file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Could not determine the user's config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Config file extension is neither YAML nor TOML.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Failed to read a file from disk or talk to a child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// YAML parsing failed.
    #[error("Failed to parse YAML config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Session name contains one of tmux's target separators.
    #[error("Invalid session name '{0}': may not be empty or contain '.', ':' or spaces")]
    InvalidSessionName(String),

    /// Focus is not of the form `<window>.<pane>`.
    #[error("Invalid focus '{0}': must be {{number}}.{{number}}")]
    InvalidFocusFormat(String),

    /// The session description cannot be turned into windows and panes.
    #[error("Malformed config: {0}")]
    MalformedConfig(String),

    /// A command entry asked for a split other than horizontal or vertical.
    #[error("Invalid split direction '{0}': use horizontal (-h) or vertical (-v)")]
    InvalidSplitDirection(String),

    /// An ssh block was given somewhere but no level names a server.
    #[error("Ssh server must be specified ({0})")]
    SshServerMissing(String),

    /// The reachability probe for a destination failed or timed out.
    #[error("Failed connectivity check: {destination}")]
    SshConnectivityFailed {
        /// The `[user@]server` that could not be reached.
        destination: String,
    },

    /// Requested session does not exist in config.
    #[error("Session not found: {0}")]
    SessionLookupMiss(String),

    /// No session key was given and the file does not hold exactly one.
    #[error("No session specified; choose one with --session (available: {0})")]
    NoSessionSelected(String),

    /// A tmux command could not be started.
    #[error("Tmux error: {0}")]
    TmuxError(String),

    /// The user declined the interactive confirmation.
    #[error("Aborted by user")]
    Aborted,
}

/// Convenient Result type alias for ultimux operations.
pub type Result<T> = std::result::Result<T, UltimuxError>;
