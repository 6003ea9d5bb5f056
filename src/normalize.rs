//! Session normalization.
//!
//! Turns a raw [`SessionSpec`] into a canonical [`SessionConfig`]:
//!
//! 1. Detect whether the description uses the legacy key names (`cmds`,
//!    `sections`) and, if so, migrate them on the typed tree.
//! 2. Validate the session name and focus.
//! 3. Synthesize the implicit window when the windows level is missing.
//! 4. Expand pane and shell shorthands into [`Pane`] and [`CommandEntry`].

use crate::config::{
    Panes, PaneFields, PaneSpec, SessionSpec, Shell, ShellEntry, SshSpec, WindowFields,
    WindowSpec,
};
use crate::error::{Result, UltimuxError};
use crate::session::{CommandEntry, Pane, PaneFocus, SessionConfig, SessionName, Window};
use crate::ssh::SshFragment;

/// Name of the window synthesized for sessions without a windows list.
pub const DEFAULT_WINDOW_NAME: &str = "ultimux";

/// Which generation of key names a session description uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// `cmds` for commands, `sections` for panes.
    Legacy,
    /// `shell` for commands, `panes` for panes.
    Current,
}

impl SchemaVersion {
    /// Report [`SchemaVersion::Legacy`] if any node of the tree carries a
    /// legacy key.
    pub fn detect(spec: &SessionSpec) -> Self {
        let legacy = spec.cmds.is_some()
            || spec.sections.is_some()
            || panes_have_legacy(spec.panes.as_ref())
            || shell_has_legacy(spec.shell.as_ref())
            || spec.windows.iter().flatten().any(|window| match window {
                WindowSpec::Structured(fields) => {
                    fields.cmds.is_some()
                        || fields.sections.is_some()
                        || panes_have_legacy(fields.panes.as_ref())
                        || shell_has_legacy(fields.shell.as_ref())
                }
                _ => false,
            });

        if legacy {
            SchemaVersion::Legacy
        } else {
            SchemaVersion::Current
        }
    }
}

fn panes_have_legacy(panes: Option<&Panes>) -> bool {
    let Some(Panes::List(panes)) = panes else {
        return false;
    };
    panes.iter().any(|pane| match pane {
        PaneSpec::Structured(fields) => {
            fields.cmds.is_some() || shell_has_legacy(fields.shell.as_ref())
        }
        PaneSpec::List(entries) => entries_have_legacy(entries),
        _ => false,
    })
}

fn shell_has_legacy(shell: Option<&Shell>) -> bool {
    matches!(shell, Some(Shell::Multiple(entries)) if entries_have_legacy(entries))
}

fn entries_have_legacy(entries: &[ShellEntry]) -> bool {
    entries
        .iter()
        .any(|entry| matches!(entry, ShellEntry::Structured(e) if e.cmds.is_some()))
}

/// Move a legacy field into its canonical slot.
fn adopt<T>(canonical: &mut Option<T>, legacy: &mut Option<T>, what: &str) -> Result<()> {
    if let Some(value) = legacy.take() {
        if canonical.is_some() {
            return Err(UltimuxError::MalformedConfig(format!(
                "both legacy and current key given for {}",
                what
            )));
        }
        *canonical = Some(value);
    }
    Ok(())
}

/// Rename `cmds` to `shell` and `sections` to `panes` throughout the tree.
///
/// # Errors
///
/// Returns [`UltimuxError::MalformedConfig`] if a node sets both spellings.
pub fn migrate_legacy(spec: &mut SessionSpec) -> Result<()> {
    adopt(&mut spec.shell, &mut spec.cmds, "session shell (cmds)")?;
    adopt(&mut spec.panes, &mut spec.sections, "session panes (sections)")?;
    migrate_shell(spec.shell.as_mut())?;
    migrate_panes(spec.panes.as_mut())?;

    for window in spec.windows.iter_mut().flatten() {
        if let WindowSpec::Structured(fields) = window {
            migrate_window(fields)?;
        }
    }
    Ok(())
}

fn migrate_window(fields: &mut WindowFields) -> Result<()> {
    adopt(&mut fields.shell, &mut fields.cmds, "window shell (cmds)")?;
    adopt(&mut fields.panes, &mut fields.sections, "window panes (sections)")?;
    migrate_shell(fields.shell.as_mut())?;
    migrate_panes(fields.panes.as_mut())
}

fn migrate_panes(panes: Option<&mut Panes>) -> Result<()> {
    let Some(Panes::List(panes)) = panes else {
        return Ok(());
    };
    for pane in panes {
        match pane {
            PaneSpec::Structured(fields) => {
                adopt(&mut fields.shell, &mut fields.cmds, "pane shell (cmds)")?;
                migrate_shell(fields.shell.as_mut())?;
            }
            PaneSpec::List(entries) => migrate_entries(entries)?,
            _ => {}
        }
    }
    Ok(())
}

fn migrate_shell(shell: Option<&mut Shell>) -> Result<()> {
    match shell {
        Some(Shell::Multiple(entries)) => migrate_entries(entries),
        _ => Ok(()),
    }
}

fn migrate_entries(entries: &mut [ShellEntry]) -> Result<()> {
    for entry in entries {
        if let ShellEntry::Structured(e) = entry {
            adopt(&mut e.shell, &mut e.cmds, "command entry (cmds)")?;
        }
    }
    Ok(())
}

/// Normalize a raw session description.
///
/// `name` is the tmux session name; it is validated before anything else.
///
/// # Errors
///
/// - [`UltimuxError::InvalidSessionName`] for names tmux cannot target
/// - [`UltimuxError::InvalidFocusFormat`] if `focus` is not `<int>.<int>`
/// - [`UltimuxError::MalformedConfig`] for panes, windows or entries that
///   cannot be interpreted
pub fn normalize(name: &str, spec: &SessionSpec) -> Result<SessionConfig> {
    let name = SessionName::new(name)?;

    let mut spec = spec.clone();
    if SchemaVersion::detect(&spec) == SchemaVersion::Legacy {
        tracing::info!(session = %name, "migrating legacy cmds/sections keys");
        migrate_legacy(&mut spec)?;
    }

    let focus = match &spec.focus {
        Some(focus) => focus.parse::<PaneFocus>()?,
        None => PaneFocus::default(),
    };

    let session_panes = normalize_panes(spec.panes.as_ref(), "session")?;

    let windows = match &spec.windows {
        Some(windows) if !windows.is_empty() => windows
            .iter()
            .enumerate()
            .map(|(index, window)| normalize_window(index, window, session_panes.as_deref()))
            .collect::<Result<Vec<_>>>()?,
        _ => vec![Window {
            name: DEFAULT_WINDOW_NAME.to_string(),
            panes: session_panes.clone().unwrap_or_else(|| vec![Pane::default()]),
            shell: None,
            dir: None,
            ssh: None,
            layout: None,
            synchronize: None,
        }],
    };

    Ok(SessionConfig {
        name,
        windows,
        shell: spec.shell.as_ref().map(normalize_shell).transpose()?,
        dir: spec.dir.clone(),
        ssh: ssh_fragment(spec.ssh.as_ref())?,
        layout: spec.layout,
        synchronize: spec.synchronize,
        focus,
        interactive: spec.interactive.unwrap_or(false),
    })
}

fn ssh_fragment(spec: Option<&SshSpec>) -> Result<Option<SshFragment>> {
    spec.map(SshFragment::try_from).transpose()
}

fn normalize_window(
    index: usize,
    window: &WindowSpec,
    session_panes: Option<&[Pane]>,
) -> Result<Window> {
    let fallback_panes = || {
        session_panes
            .map(<[Pane]>::to_vec)
            .unwrap_or_else(|| vec![Pane::default()])
    };

    match window {
        WindowSpec::Named(name) => Ok(Window {
            name: name.clone(),
            panes: fallback_panes(),
            shell: None,
            dir: None,
            ssh: None,
            layout: None,
            synchronize: None,
        }),
        WindowSpec::Structured(fields) => {
            let ssh = ssh_fragment(fields.ssh.as_ref())?;
            let name = fields
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| ssh.as_ref().and_then(|s| s.server.clone()))
                .unwrap_or_else(|| format!("win{}", index));

            let owner = format!("window '{}'", name);
            let panes = match normalize_panes(fields.panes.as_ref(), &owner)? {
                Some(panes) if !panes.is_empty() => panes,
                _ => fallback_panes(),
            };

            Ok(Window {
                name,
                panes,
                shell: fields.shell.as_ref().map(normalize_shell).transpose()?,
                dir: fields.dir.clone(),
                ssh,
                layout: fields.layout,
                synchronize: fields.synchronize,
            })
        }
        WindowSpec::List(_) => Err(UltimuxError::MalformedConfig(format!(
            "window #{} is a list; expected a name or a mapping",
            index
        ))),
        WindowSpec::Other(_) => Err(UltimuxError::MalformedConfig(format!(
            "window #{} could not be parsed; expected a name, or a mapping whose fields \
             have valid types",
            index
        ))),
    }
}

fn normalize_panes(panes: Option<&Panes>, owner: &str) -> Result<Option<Vec<Pane>>> {
    match panes {
        None => Ok(None),
        Some(Panes::Other(_)) => Err(UltimuxError::MalformedConfig(format!(
            "could not parse panes of {}, not a list",
            owner
        ))),
        Some(Panes::List(list)) if list.is_empty() => Ok(None),
        Some(Panes::List(list)) => list
            .iter()
            .enumerate()
            .map(|(index, pane)| normalize_pane(pane, owner, index))
            .collect::<Result<Vec<_>>>()
            .map(Some),
    }
}

fn normalize_pane(pane: &PaneSpec, owner: &str, index: usize) -> Result<Pane> {
    match pane {
        PaneSpec::Bare(command) => Ok(Pane {
            shell: Some(vec![CommandEntry::new(command.clone())]),
            ..Default::default()
        }),
        PaneSpec::List(entries) => Ok(Pane {
            shell: Some(normalize_entries(entries)?),
            ..Default::default()
        }),
        PaneSpec::Structured(PaneFields { shell, dir, ssh, .. }) => Ok(Pane {
            shell: shell.as_ref().map(normalize_shell).transpose()?,
            dir: dir.clone(),
            ssh: ssh_fragment(ssh.as_ref())?,
        }),
        PaneSpec::Other(_) => Err(UltimuxError::MalformedConfig(format!(
            "pane #{} of {} is neither a command, a list nor a mapping",
            index, owner
        ))),
    }
}

/// Expand a shell field into its list of entries.
pub fn normalize_shell(shell: &Shell) -> Result<Vec<CommandEntry>> {
    match shell {
        Shell::Single(command) => Ok(vec![CommandEntry::new(command.clone())]),
        Shell::Multiple(entries) => normalize_entries(entries),
    }
}

fn normalize_entries(entries: &[ShellEntry]) -> Result<Vec<CommandEntry>> {
    if entries.is_empty() {
        return Ok(vec![CommandEntry::new("")]);
    }
    entries
        .iter()
        .map(|entry| match entry {
            ShellEntry::Bare(command) => Ok(CommandEntry::new(command.clone())),
            ShellEntry::Structured(e) => {
                let command = e.shell.clone().ok_or_else(|| {
                    UltimuxError::MalformedConfig("command entry without a shell".into())
                })?;
                Ok(CommandEntry {
                    command,
                    split: e.split.clone(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    fn session(yaml: &str) -> SessionSpec {
        let config = ConfigFile::from_yaml_str(yaml).unwrap();
        config.session("s").unwrap().clone()
    }

    #[test]
    fn test_implicit_window() {
        let spec = session("s:\n  panes:\n    - htop\n    - [w, whoami]\n");
        let config = normalize("dev", &spec).unwrap();
        assert_eq!(config.windows.len(), 1);
        assert_eq!(config.windows[0].name, DEFAULT_WINDOW_NAME);
        assert_eq!(config.windows[0].panes.len(), 2);
        assert_eq!(
            config.windows[0].panes[1].shell,
            Some(vec![CommandEntry::new("w"), CommandEntry::new("whoami")])
        );
    }

    #[test]
    fn test_implicit_window_from_shell_only() {
        let spec = session("s:\n  shell: uptime\n");
        let config = normalize("dev", &spec).unwrap();
        assert_eq!(config.windows[0].panes, vec![Pane::default()]);
        assert_eq!(config.shell, Some(vec![CommandEntry::new("uptime")]));
    }

    #[test]
    fn test_window_names() {
        let spec = session(
            r#"
s:
  shell: ls
  windows:
    - named
    - name: explicit
    - ssh: { server: db01, user: ops }
    - layout: tiled
"#,
        );
        let config = normalize("dev", &spec).unwrap();
        let names: Vec<_> = config.windows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["named", "explicit", "db01", "win3"]);
    }

    #[test]
    fn test_windows_fall_back_to_session_panes() {
        let spec = session(
            r#"
s:
  panes: [top, df]
  windows:
    - name: a
    - name: b
      panes: [ls]
"#,
        );
        let config = normalize("dev", &spec).unwrap();
        assert_eq!(config.windows[0].panes.len(), 2);
        assert_eq!(config.windows[1].panes.len(), 1);
    }

    #[test]
    fn test_structured_entries_keep_split() {
        let spec = session(
            "s:\n  panes:\n    - shell: [a, { shell: b, split: vertical }]\n      dir: /tmp\n",
        );
        let config = normalize("dev", &spec).unwrap();
        let pane = &config.windows[0].panes[0];
        assert_eq!(pane.dir.as_deref(), Some("/tmp"));
        let shell = pane.shell.as_ref().unwrap();
        assert_eq!(shell[1].split.as_deref(), Some("vertical"));
    }

    #[test]
    fn test_legacy_keys_are_migrated() {
        let spec = session(
            r#"
s:
  cmds: uptime
  windows:
    - name: a
      sections:
        - cmds: [ls, { cmds: pwd, split: -v }]
"#,
        );
        assert_eq!(SchemaVersion::detect(&spec), SchemaVersion::Legacy);
        let config = normalize("dev", &spec).unwrap();
        assert_eq!(config.shell, Some(vec![CommandEntry::new("uptime")]));
        let shell = config.windows[0].panes[0].shell.as_ref().unwrap();
        assert_eq!(shell[0].command, "ls");
        assert_eq!(shell[1].command, "pwd");
        assert_eq!(shell[1].split.as_deref(), Some("-v"));
    }

    #[test]
    fn test_legacy_migration_leaves_text_alone() {
        let spec = session("s:\n  cmds: echo cmds sections\n");
        let config = normalize("dev", &spec).unwrap();
        assert_eq!(config.shell, Some(vec![CommandEntry::new("echo cmds sections")]));
    }

    #[test]
    fn test_current_schema_detected() {
        let spec = session("s:\n  shell: ls\n");
        assert_eq!(SchemaVersion::detect(&spec), SchemaVersion::Current);
    }

    #[test]
    fn test_mixed_keys_rejected() {
        let spec = session("s:\n  shell: ls\n  cmds: pwd\n");
        assert!(matches!(
            normalize("dev", &spec),
            Err(UltimuxError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_non_list_panes_rejected() {
        let spec = session("s:\n  panes: just-a-string\n");
        assert!(matches!(
            normalize("dev", &spec),
            Err(UltimuxError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_bad_pane_and_window_rejected() {
        let spec = session("s:\n  panes: [1]\n");
        assert!(matches!(normalize("dev", &spec), Err(UltimuxError::MalformedConfig(_))));

        let spec = session("s:\n  shell: ls\n  windows: [7]\n");
        assert!(matches!(normalize("dev", &spec), Err(UltimuxError::MalformedConfig(_))));
    }

    #[test]
    fn test_list_shaped_window_rejected() {
        let spec = session("s:\n  shell: ls\n  windows:\n    - [foo]\n");
        assert!(matches!(
            normalize("dev", &spec),
            Err(UltimuxError::MalformedConfig(msg)) if msg.contains("window #0 is a list")
        ));
    }

    #[test]
    fn test_list_shaped_ssh_rejected() {
        let spec = session("s:\n  shell: ls\n  ssh: [host, user]\n");
        assert!(matches!(normalize("dev", &spec), Err(UltimuxError::MalformedConfig(_))));

        let spec = session("s:\n  panes:\n    - shell: ls\n      ssh: [host]\n");
        assert!(matches!(normalize("dev", &spec), Err(UltimuxError::MalformedConfig(_))));
    }

    #[test]
    fn test_window_with_badly_typed_field() {
        let spec = session(
            r#"
s:
  shell: ls
  windows:
    - name: a
      synchronize: yes-please
"#,
        );
        let err = normalize("dev", &spec).unwrap_err();
        assert!(err.to_string().contains("window #0 could not be parsed"));
    }

    #[test]
    fn test_session_name_and_focus_validated() {
        let spec = session("s:\n  shell: ls\n");
        assert!(matches!(
            normalize("my.session", &spec),
            Err(UltimuxError::InvalidSessionName(_))
        ));

        let spec = session("s:\n  shell: ls\n  focus: \"1\"\n");
        assert!(matches!(
            normalize("dev", &spec),
            Err(UltimuxError::InvalidFocusFormat(_))
        ));

        let spec = session("s:\n  shell: ls\n  focus: \"1.2\"\n");
        assert_eq!(
            normalize("dev", &spec).unwrap().focus,
            PaneFocus { window: 1, pane: 2 }
        );
    }
}
