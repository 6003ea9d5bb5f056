//! Tmux command vocabulary.
//!
//! The emitter produces a list of [`TmuxCommand`] values. Each one knows its
//! tmux argument vector (used for replay) and renders as a copy-pasteable
//! shell line (used for previews and debug output).
//!
//! # Targets
//!
//! Session-wide commands target the session name; key-sends, focus and
//! attach target a pane coordinate `session:window.pane`. Indices follow
//! creation order starting at 0.

use crate::config::Layout;
use crate::error::{Result, UltimuxError};
use crate::session::{PaneCoordinate, SessionName, SplitDirection};
use std::fmt;
use std::process::Command;

/// Key sent after a command to execute it.
pub const ENTER_KEY: &str = "C-m";

/// Status bar style applied once the session is built.
pub const STATUS_STYLE: &str = "bg=blue";

/// Terminal type advertised inside the session (256 colors).
pub const DEFAULT_TERMINAL: &str = "screen-256color";

/// Check if tmux is on `PATH`.
pub fn is_installed() -> bool {
    which::which("tmux").is_ok()
}

/// Check if we're running inside a tmux session.
///
/// Checks for the `TMUX` environment variable, which tmux sets when active.
pub fn in_tmux() -> bool {
    std::env::var("TMUX").is_ok()
}

/// One tmux control command.
#[derive(Debug, Clone, PartialEq)]
pub enum TmuxCommand {
    /// Start the detached session together with its first window.
    NewSession { session: SessionName, window: String },
    /// Add a window to the running session.
    NewWindow { session: SessionName, window: String },
    /// Full-width split creating a new row of panes.
    SplitRow { session: SessionName },
    /// Split the current pane.
    SplitPane {
        session: SessionName,
        direction: SplitDirection,
    },
    /// Type `text` into a pane, optionally followed by Enter.
    SendKeys {
        target: PaneCoordinate,
        text: String,
        enter: bool,
    },
    /// Toggle mirrored input across the panes of the current window.
    SetSynchronize { session: SessionName, on: bool },
    SelectLayout { session: SessionName, layout: Layout },
    /// Set a global (`-g`) option.
    SetGlobalOption { option: String, value: String },
    SelectPane { target: PaneCoordinate },
    Attach { target: PaneCoordinate },
}

impl TmuxCommand {
    /// Arguments passed to the `tmux` binary.
    pub fn args(&self) -> Vec<String> {
        match self {
            TmuxCommand::NewSession { session, window } => owned(&[
                "new-session",
                "-d",
                "-A",
                "-s",
                session.as_str(),
                "-n",
                window.as_str(),
            ]),
            TmuxCommand::NewWindow { session, window } => {
                owned(&["new-window", "-t", session.as_str(), "-n", window.as_str()])
            }
            TmuxCommand::SplitRow { session } => {
                owned(&["split-window", "-f", "-t", session.as_str()])
            }
            TmuxCommand::SplitPane { session, direction } => {
                owned(&["split-window", direction.flag(), "-t", session.as_str()])
            }
            TmuxCommand::SendKeys {
                target,
                text,
                enter,
            } => {
                let mut args = vec!["send-keys".to_string(), "-t".to_string(), target.to_string()];
                args.push(text.clone());
                if *enter {
                    args.push(ENTER_KEY.to_string());
                }
                args
            }
            TmuxCommand::SetSynchronize { session, on } => owned(&[
                "set-option",
                "-t",
                session.as_str(),
                "synchronize-panes",
                if *on { "on" } else { "off" },
            ]),
            TmuxCommand::SelectLayout { session, layout } => owned(&[
                "select-layout",
                "-t",
                session.as_str(),
                layout.to_tmux_layout(),
            ]),
            TmuxCommand::SetGlobalOption { option, value } => {
                owned(&["set-option", "-g", option.as_str(), value.as_str()])
            }
            TmuxCommand::SelectPane { target } => {
                vec!["select-pane".to_string(), "-t".to_string(), target.to_string()]
            }
            TmuxCommand::Attach { target } => {
                vec!["attach".to_string(), "-t".to_string(), target.to_string()]
            }
        }
    }

    /// Short name of the command, as used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TmuxCommand::NewSession { .. } => "create-session",
            TmuxCommand::NewWindow { .. } => "create-window",
            TmuxCommand::SplitRow { .. } => "split-row",
            TmuxCommand::SplitPane { .. } => "split-pane",
            TmuxCommand::SendKeys { .. } => "send-keys",
            TmuxCommand::SetSynchronize { .. } => "set-sync",
            TmuxCommand::SelectLayout { .. } => "select-layout",
            TmuxCommand::SetGlobalOption { .. } => "set-option",
            TmuxCommand::SelectPane { .. } => "select-pane",
            TmuxCommand::Attach { .. } => "attach",
        }
    }

    /// Whether this command adds a pane to an existing window.
    pub fn is_split(&self) -> bool {
        matches!(
            self,
            TmuxCommand::SplitRow { .. } | TmuxCommand::SplitPane { .. }
        )
    }
}

impl fmt::Display for TmuxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tmux")?;
        for arg in self.args() {
            write!(f, " {}", shell_quote(&arg))?;
        }
        Ok(())
    }
}

fn owned(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Quote `s` for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-.,:/=@%+".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Runs tmux commands during replay.
pub trait CommandRunner {
    /// Run one command. Returns whether tmux reported success.
    fn run(&mut self, command: &TmuxCommand) -> Result<bool>;
}

/// Runner that invokes the `tmux` binary with inherited stdio.
#[derive(Debug, Default)]
pub struct TmuxRunner;

impl CommandRunner for TmuxRunner {
    fn run(&mut self, command: &TmuxCommand) -> Result<bool> {
        let status = Command::new("tmux")
            .args(command.args())
            .status()
            .map_err(|e| UltimuxError::TmuxError(format!("{}: {}", command.kind(), e)))?;
        Ok(status.success())
    }
}
