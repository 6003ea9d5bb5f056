//! Canonical session tree.
//!
//! These are the shapes the emitter walks once [`crate::normalize`] has
//! resolved every shorthand: a validated session name, at least one window,
//! and panes whose shell is always a list of [`CommandEntry`].

use crate::config::Layout;
use crate::error::{Result, UltimuxError};
use crate::ssh::SshFragment;
use std::fmt;
use std::str::FromStr;

/// A tmux session name.
///
/// `.`, `:` and spaces are tmux target separators, so they are rejected at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionName(String);

impl SessionName {
    /// Validate and wrap a session name.
    ///
    /// # Errors
    ///
    /// Returns [`UltimuxError::InvalidSessionName`] for empty names or names
    /// containing `.`, `:` or a space.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(['.', ':', ' ']) {
            return Err(UltimuxError::InvalidSessionName(name));
        }
        Ok(SessionName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pane to focus and attach to, written `<window>.<pane>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneFocus {
    pub window: u32,
    pub pane: u32,
}

impl FromStr for PaneFocus {
    type Err = UltimuxError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || UltimuxError::InvalidFocusFormat(s.to_string());
        let (window, pane) = s.split_once('.').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(window) || !digits(pane) {
            return Err(invalid());
        }
        Ok(PaneFocus {
            window: window.parse().map_err(|_| invalid())?,
            pane: pane.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for PaneFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.window, self.pane)
    }
}

/// Address of one tmux pane: `session:window.pane`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneCoordinate {
    pub session: SessionName,
    pub window: u32,
    pub pane: u32,
}

impl PaneCoordinate {
    pub fn new(session: &SessionName, window: u32, pane: u32) -> Self {
        PaneCoordinate {
            session: session.clone(),
            window,
            pane,
        }
    }
}

impl fmt::Display for PaneCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.session, self.window, self.pane)
    }
}

/// Direction of a `split-window`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitDirection {
    /// New pane to the right (tmux `-h`).
    #[default]
    Horizontal,
    /// New pane below (tmux `-v`).
    Vertical,
}

impl SplitDirection {
    /// The `split-window` flag for this direction.
    pub fn flag(&self) -> &'static str {
        match self {
            SplitDirection::Horizontal => "-h",
            SplitDirection::Vertical => "-v",
        }
    }
}

impl FromStr for SplitDirection {
    type Err = UltimuxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "horizontal" | "h" | "-h" => Ok(SplitDirection::Horizontal),
            "vertical" | "v" | "-v" => Ok(SplitDirection::Vertical),
            other => Err(UltimuxError::InvalidSplitDirection(other.to_string())),
        }
    }
}

/// One command of a pane's shell list. Every entry after the first gets its
/// own tmux pane, created with `split`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: String,
    /// Split direction as written; validated when the entry is emitted.
    pub split: Option<String>,
}

impl CommandEntry {
    pub fn new(command: impl Into<String>) -> Self {
        CommandEntry {
            command: command.into(),
            split: None,
        }
    }

    /// Resolve the requested split direction, horizontal when unspecified.
    pub fn split_direction(&self) -> Result<SplitDirection> {
        match &self.split {
            Some(split) => split.parse(),
            None => Ok(SplitDirection::default()),
        }
    }
}

/// A pane after normalization. Unset fields inherit from the window and
/// then the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pane {
    pub shell: Option<Vec<CommandEntry>>,
    pub dir: Option<String>,
    pub ssh: Option<SshFragment>,
}

/// A window after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub name: String,
    pub panes: Vec<Pane>,
    pub shell: Option<Vec<CommandEntry>>,
    pub dir: Option<String>,
    pub ssh: Option<SshFragment>,
    pub layout: Option<Layout>,
    pub synchronize: Option<bool>,
}

/// A session after normalization, ready for [`crate::emitter::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub name: SessionName,
    /// Never empty.
    pub windows: Vec<Window>,
    pub shell: Option<Vec<CommandEntry>>,
    pub dir: Option<String>,
    pub ssh: Option<SshFragment>,
    pub layout: Option<Layout>,
    pub synchronize: Option<bool>,
    pub focus: PaneFocus,
    pub interactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name_rejects_separators() {
        for bad in ["a.b", "a:b", "a b", ""] {
            assert!(matches!(
                SessionName::new(bad),
                Err(UltimuxError::InvalidSessionName(_))
            ));
        }
        assert_eq!(SessionName::new("dev_20240101").unwrap().as_str(), "dev_20240101");
    }

    #[test]
    fn test_focus_format() {
        assert_eq!("0.0".parse::<PaneFocus>().unwrap(), PaneFocus::default());
        assert_eq!(
            "2.13".parse::<PaneFocus>().unwrap(),
            PaneFocus { window: 2, pane: 13 }
        );
        for bad in ["0", "a.b", "1.", ".1", "1.2.3", " 1.2", "-1.0", "+1.0"] {
            assert!(
                matches!(bad.parse::<PaneFocus>(), Err(UltimuxError::InvalidFocusFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_coordinate_display() {
        let name = SessionName::new("dev").unwrap();
        assert_eq!(PaneCoordinate::new(&name, 1, 3).to_string(), "dev:1.3");
    }

    #[test]
    fn test_split_direction() {
        assert_eq!(CommandEntry::new("ls").split_direction().unwrap(), SplitDirection::Horizontal);
        let entry = CommandEntry {
            command: "ls".into(),
            split: Some("-v".into()),
        };
        assert_eq!(entry.split_direction().unwrap(), SplitDirection::Vertical);
        assert!(matches!(
            "diagonal".parse::<SplitDirection>(),
            Err(UltimuxError::InvalidSplitDirection(_))
        ));
    }
}
