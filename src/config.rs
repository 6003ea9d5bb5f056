//! Configuration types for ultimux.
//!
//! This module defines the raw, loosely-typed shapes a config file may take.
//! A config file maps session keys to session descriptions. Descriptions are
//! forgiving: the windows level may be omitted, panes may be bare strings or
//! lists, ssh may be a bare server name, and older files use `cmds` and
//! `sections` where current ones use `shell` and `panes`.
//!
//! The [`crate::normalize`] module turns these shapes into the canonical
//! tree the emitter walks.
//!
//! # Config Format
//!
//! ```yaml
//! dev:
//!   ssh:
//!     server: build01
//!     user: deploy
//!   synchronize: true
//!   windows:
//!     - name: logs
//!       layout: tiled
//!       panes:
//!         - tail -f /var/log/syslog
//!         - shell: ["htop", { shell: "df -h", split: vertical }]
//!           dir: /srv/app
//!     - name: local
//!       panes:
//!         - shell: git status
//!           ssh: { server: localhost, login_only: true }
//! ```

use crate::error::{Result, UltimuxError};
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::BTreeMap;

/// Shell field that accepts either a single string or a list of entries.
///
/// ```yaml
/// shell: "single command"
/// # or
/// shell: ["command 1", { shell: "command 2", split: vertical }]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Shell {
    /// A single command string.
    Single(String),
    /// Multiple entries, each one becoming its own tmux pane.
    Multiple(Vec<ShellEntry>),
}

/// One entry of a shell list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShellEntry {
    /// A plain command string, split horizontally from its predecessor.
    Bare(String),
    /// A command with an explicit split direction.
    Structured(StructuredEntry),
}

/// A shell entry written as a mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StructuredEntry {
    /// Command text. Also accepted as `command`.
    #[serde(alias = "command")]
    pub shell: Option<String>,
    /// Legacy spelling of `shell`.
    pub cmds: Option<String>,
    /// Split direction used to create this entry's pane.
    #[serde(alias = "split_direction", alias = "splitDirection")]
    pub split: Option<String>,
}

/// Ssh field that accepts either a bare server or a mapping.
///
/// ```yaml
/// ssh: build01
/// # or
/// ssh: { server: build01, user: deploy, login_only: true }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SshSpec {
    /// Only the server name.
    Server(String),
    /// A sequence. Kept so it is not read positionally into the mapping.
    List(Vec<IgnoredAny>),
    /// Any subset of the ssh options.
    Options(SshFields),
}

/// Ssh options written as a mapping. Every field is optional because levels
/// are merged field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SshFields {
    pub server: Option<String>,
    pub user: Option<String>,
    #[serde(alias = "loginOnly")]
    pub login_only: Option<bool>,
}

/// Panes field. Anything that is not a list is kept so the normalizer can
/// report it instead of failing inside the parser.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Panes {
    List(Vec<PaneSpec>),
    Other(IgnoredAny),
}

/// A single pane in any of its accepted shorthands.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaneSpec {
    /// `- htop`
    Bare(String),
    /// `- ["htop", "df -h"]`
    List(Vec<ShellEntry>),
    /// `- { shell: htop, dir: /tmp, ssh: build01 }`
    Structured(PaneFields),
    /// Numbers, booleans and other values that cannot describe a pane.
    Other(IgnoredAny),
}

/// A pane written as a mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaneFields {
    pub shell: Option<Shell>,
    /// Legacy spelling of `shell`.
    pub cmds: Option<Shell>,
    pub dir: Option<String>,
    pub ssh: Option<SshSpec>,
}

/// A window in any of its accepted shorthands.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WindowSpec {
    /// A bare window name; panes come from the session.
    Named(String),
    /// A sequence. Kept so it is not read positionally into the mapping.
    List(Vec<IgnoredAny>),
    Structured(WindowFields),
    Other(IgnoredAny),
}

/// A window written as a mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WindowFields {
    pub name: Option<String>,
    pub panes: Option<Panes>,
    /// Legacy spelling of `panes`.
    pub sections: Option<Panes>,
    pub shell: Option<Shell>,
    /// Legacy spelling of `shell`.
    pub cmds: Option<Shell>,
    pub dir: Option<String>,
    pub ssh: Option<SshSpec>,
    pub layout: Option<Layout>,
    pub synchronize: Option<bool>,
}

/// A session description as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSpec {
    /// Base name of the tmux session. Defaults to the session key.
    pub name: Option<String>,
    pub windows: Option<Vec<WindowSpec>>,
    pub panes: Option<Panes>,
    /// Legacy spelling of `panes`.
    pub sections: Option<Panes>,
    pub shell: Option<Shell>,
    /// Legacy spelling of `shell`.
    pub cmds: Option<Shell>,
    pub dir: Option<String>,
    pub ssh: Option<SshSpec>,
    pub layout: Option<Layout>,
    pub synchronize: Option<bool>,
    /// Pane to focus and attach to, as `<window>.<pane>`.
    pub focus: Option<String>,
    /// Ask for confirmation before replaying commands.
    pub interactive: Option<bool>,
}

/// Layout options for tmux panes.
///
/// Maps to tmux's built-in layout algorithms. The shorthands `vertical`
/// (side-by-side panes) and `horizontal` (stacked panes) are accepted as
/// aliases for the two `even-*` layouts.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Spread panes evenly (tmux: "tiled").
    Tiled,
    /// Side-by-side panes (tmux: "even-horizontal").
    #[serde(alias = "vertical")]
    EvenHorizontal,
    /// Stacked panes (tmux: "even-vertical").
    #[serde(alias = "horizontal")]
    EvenVertical,
    MainHorizontal,
    MainVertical,
}

impl Layout {
    /// Convert to the tmux layout name used by `select-layout`.
    pub fn to_tmux_layout(&self) -> &'static str {
        match self {
            Layout::Tiled => "tiled",
            Layout::EvenHorizontal => "even-horizontal",
            Layout::EvenVertical => "even-vertical",
            Layout::MainHorizontal => "main-horizontal",
            Layout::MainVertical => "main-vertical",
        }
    }
}

/// Top-level configuration structure: session key -> session description.
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub sessions: BTreeMap<String, SessionSpec>,
}

impl ConfigFile {
    /// Parse config from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`UltimuxError::YamlParse`] if the YAML is malformed or a
    /// value has a shape no session field accepts.
    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        if yaml_str.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        let sessions: BTreeMap<String, SessionSpec> = serde_yaml::from_str(yaml_str)?;
        Ok(ConfigFile { sessions })
    }

    /// Parse config from a TOML string. Every top-level table is a session.
    ///
    /// # Errors
    ///
    /// Returns [`UltimuxError::TomlParse`] if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let sessions: BTreeMap<String, SessionSpec> = toml::from_str(toml_str)?;
        Ok(ConfigFile { sessions })
    }

    /// Look up a session by key.
    ///
    /// # Errors
    ///
    /// Returns [`UltimuxError::SessionLookupMiss`] if no session has that key.
    pub fn session(&self, key: &str) -> Result<&SessionSpec> {
        self.sessions
            .get(key)
            .ok_or_else(|| UltimuxError::SessionLookupMiss(key.to_string()))
    }

    /// Pick the session to run: the requested key, or the only session in
    /// the file when none was requested.
    pub fn select(&self, key: Option<&str>) -> Result<(&str, &SessionSpec)> {
        match key {
            Some(key) => {
                let (key, spec) = self
                    .sessions
                    .get_key_value(key)
                    .ok_or_else(|| UltimuxError::SessionLookupMiss(key.to_string()))?;
                Ok((key.as_str(), spec))
            }
            None => match self.sessions.iter().next() {
                Some((key, spec)) if self.sessions.len() == 1 => Ok((key.as_str(), spec)),
                _ if self.sessions.is_empty() => {
                    Err(UltimuxError::NoSessionSelected("none".to_string()))
                }
                _ => Err(UltimuxError::NoSessionSelected(
                    self.list_sessions().join(", "),
                )),
            },
        }
    }

    /// List all session keys, sorted alphabetically.
    pub fn list_sessions(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
web:
  ssh: web01
  panes:
    - htop
    - ["w", "whoami"]
    - shell: uptime
      dir: /srv
      ssh: { user: ops }
    - 42
legacy:
  sections:
    - cmds: ls
"#;

    #[test]
    fn test_yaml_pane_shorthands() {
        let config = ConfigFile::from_yaml_str(YAML).unwrap();
        let web = config.session("web").unwrap();

        let Some(Panes::List(panes)) = &web.panes else {
            panic!("expected pane list");
        };
        assert!(matches!(&panes[0], PaneSpec::Bare(s) if s == "htop"));
        assert!(matches!(&panes[1], PaneSpec::List(v) if v.len() == 2));
        match &panes[2] {
            PaneSpec::Structured(fields) => {
                assert_eq!(fields.dir.as_deref(), Some("/srv"));
                assert!(matches!(
                    &fields.ssh,
                    Some(SshSpec::Options(SshFields { user: Some(u), server: None, .. }))
                        if u == "ops"
                ));
            }
            other => panic!("expected structured pane, got {:?}", other),
        }
        assert!(matches!(&panes[3], PaneSpec::Other(_)));
        assert!(matches!(&web.ssh, Some(SshSpec::Server(s)) if s == "web01"));
    }

    #[test]
    fn test_yaml_legacy_keys_are_kept_apart() {
        let config = ConfigFile::from_yaml_str(YAML).unwrap();
        let legacy = config.session("legacy").unwrap();
        assert!(legacy.panes.is_none());
        let Some(Panes::List(panes)) = &legacy.sections else {
            panic!("expected legacy sections");
        };
        assert!(matches!(&panes[0], PaneSpec::Structured(f) if f.cmds.is_some()));
    }

    #[test]
    fn test_toml_sessions() {
        let config = ConfigFile::from_toml_str(
            r#"
[dev]
shell = "cargo watch"
layout = "vertical"

[[dev.windows]]
name = "editor"
panes = ["nvim", "cargo test"]
"#,
        )
        .unwrap();
        let dev = config.session("dev").unwrap();
        assert_eq!(dev.layout, Some(Layout::EvenHorizontal));
        assert!(matches!(&dev.shell, Some(Shell::Single(s)) if s == "cargo watch"));
        assert_eq!(dev.windows.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_session_lookup_miss() {
        let config = ConfigFile::from_yaml_str(YAML).unwrap();
        assert!(matches!(
            config.session("nope"),
            Err(UltimuxError::SessionLookupMiss(key)) if key == "nope"
        ));
        assert_eq!(config.list_sessions(), vec!["legacy", "web"]);
    }

    #[test]
    fn test_select_requires_key_when_ambiguous() {
        let config = ConfigFile::from_yaml_str(YAML).unwrap();
        let err = config.select(None).unwrap_err();
        assert!(matches!(&err, UltimuxError::NoSessionSelected(keys) if keys == "legacy, web"));
        assert!(err.to_string().contains("legacy, web"));
        assert_eq!(config.select(Some("web")).unwrap().0, "web");

        let single = ConfigFile::from_yaml_str("only:\n  shell: ls\n").unwrap();
        assert_eq!(single.select(None).unwrap().0, "only");
    }

    #[test]
    fn test_select_on_empty_file() {
        let config = ConfigFile::from_yaml_str("").unwrap();
        assert!(matches!(
            config.select(None),
            Err(UltimuxError::NoSessionSelected(keys)) if keys == "none"
        ));
    }

    #[test]
    fn test_sequences_are_not_read_as_mappings() {
        let config =
            ConfigFile::from_yaml_str("s:\n  ssh: [host, user]\n  windows:\n    - [foo]\n")
                .unwrap();
        let s = config.session("s").unwrap();
        assert!(matches!(&s.ssh, Some(SshSpec::List(_))));
        assert!(matches!(
            s.windows.as_deref(),
            Some([WindowSpec::List(_)])
        ));
    }

    #[test]
    fn test_layout_names() {
        assert_eq!(Layout::EvenVertical.to_tmux_layout(), "even-vertical");
        let config = ConfigFile::from_yaml_str("s:\n  layout: main-vertical\n").unwrap();
        assert_eq!(config.session("s").unwrap().layout, Some(Layout::MainVertical));
    }
}
