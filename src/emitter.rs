//! Tmux command emission.
//!
//! Walks a normalized [`SessionConfig`] and produces the ordered list of
//! [`TmuxCommand`]s that builds it:
//!
//! 1. `new-session` for the first window, `new-window` for the others.
//! 2. Per pane: a full-width `split-window -f` for every pane after the
//!    first, then one pane per command entry (`split-window -h|-v` for every
//!    entry after the first) with a `send-keys` per `;`-separated
//!    sub-command.
//! 3. Per window: `synchronize-panes on` and `select-layout` when they
//!    resolve.
//! 4. Global options, then focus and attach.
//!
//! Window indices count windows from 0. Pane indices restart at 0 in every
//! window and count created tmux panes, so a pane with three command entries
//! occupies three consecutive indices.

use crate::config::Layout;
use crate::error::{Result, UltimuxError};
use crate::session::{CommandEntry, Pane, PaneCoordinate, SessionConfig, SplitDirection, Window};
use crate::ssh::{COMMAND_SEPARATOR, ReachabilityProbe, SshFragment, SshOptions, SshResolver};
use crate::tmux::{DEFAULT_TERMINAL, STATUS_STYLE, TmuxCommand};

/// Run-level overrides, usually taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Preview only: comment out every key-send and skip ssh probes.
    pub debug: bool,
    /// Force `synchronize-panes on` in every window.
    pub synchronize: bool,
    /// Force the tiled layout in every window.
    pub tiled: bool,
    /// Shell for panes that do not set their own.
    pub shell: Option<String>,
    /// Directory for panes that do not set their own.
    pub dir: Option<String>,
}

/// Compile `session` into tmux commands.
///
/// Convenience wrapper around [`CommandEmitter`].
///
/// # Errors
///
/// - [`UltimuxError::MalformedConfig`] for a pane with nothing to run
/// - [`UltimuxError::InvalidSplitDirection`] for an unknown split
/// - [`UltimuxError::SshServerMissing`] for ssh options without a server
/// - [`UltimuxError::SshConnectivityFailed`] if a destination is unreachable
pub fn create<P: ReachabilityProbe>(
    session: &SessionConfig,
    options: &CompileOptions,
    resolver: &mut SshResolver<P>,
) -> Result<Vec<TmuxCommand>> {
    CommandEmitter::new(session, options, resolver).create()
}

/// Everything a pane needs, resolved before anything is emitted for it.
struct PanePlan {
    entries: Vec<(CommandEntry, SplitDirection)>,
    dir: Option<String>,
    ssh: Option<SshOptions>,
}

/// Walks one session and accumulates its commands.
///
/// The command list and the window/pane counters belong to a single
/// [`CommandEmitter::create`] call.
pub struct CommandEmitter<'a, P: ReachabilityProbe> {
    session: &'a SessionConfig,
    options: &'a CompileOptions,
    resolver: &'a mut SshResolver<P>,
    commands: Vec<TmuxCommand>,
    window_index: u32,
    pane_index: u32,
}

impl<'a, P: ReachabilityProbe> CommandEmitter<'a, P> {
    pub fn new(
        session: &'a SessionConfig,
        options: &'a CompileOptions,
        resolver: &'a mut SshResolver<P>,
    ) -> Self {
        CommandEmitter {
            session,
            options,
            resolver,
            commands: Vec::new(),
            window_index: 0,
            pane_index: 0,
        }
    }

    /// Emit the full command list.
    ///
    /// On error the commands emitted so far stay available through
    /// [`CommandEmitter::emitted`]; they do not describe a usable session.
    pub fn create(&mut self) -> Result<Vec<TmuxCommand>> {
        self.commands.clear();
        self.window_index = 0;

        let session = self.session;
        for window in &session.windows {
            self.emit_window(window)?;
            self.window_index += 1;
        }
        self.emit_finish();

        tracing::debug!(
            session = %session.name,
            commands = self.commands.len(),
            "compiled session"
        );
        Ok(std::mem::take(&mut self.commands))
    }

    /// Commands emitted so far by an unfinished or failed run.
    pub fn emitted(&self) -> &[TmuxCommand] {
        &self.commands
    }

    fn emit_window(&mut self, window: &Window) -> Result<()> {
        let session = self.session.name.clone();
        self.pane_index = 0;

        self.commands.push(if self.window_index == 0 {
            TmuxCommand::NewSession {
                session: session.clone(),
                window: window.name.clone(),
            }
        } else {
            TmuxCommand::NewWindow {
                session: session.clone(),
                window: window.name.clone(),
            }
        });

        for pane in &window.panes {
            self.emit_pane(window, pane)?;
        }

        if self.synchronize(window) {
            self.commands.push(TmuxCommand::SetSynchronize {
                session: session.clone(),
                on: true,
            });
        }
        if let Some(layout) = self.layout(window) {
            self.commands.push(TmuxCommand::SelectLayout { session, layout });
        }
        Ok(())
    }

    fn emit_pane(&mut self, window: &Window, pane: &Pane) -> Result<()> {
        let plan = self.plan(window, pane)?;
        let session = self.session.name.clone();

        if self.pane_index > 0 {
            self.commands.push(TmuxCommand::SplitRow {
                session: session.clone(),
            });
        }

        for (i, (entry, direction)) in plan.entries.iter().enumerate() {
            if i > 0 {
                self.commands.push(TmuxCommand::SplitPane {
                    session: session.clone(),
                    direction: *direction,
                });
            }

            let target = PaneCoordinate::new(&session, self.window_index, self.pane_index);
            let mut command = match &plan.dir {
                Some(dir) if entry.command.trim().is_empty() => format!("cd {}", dir),
                Some(dir) => format!("cd {}{} {}", dir, COMMAND_SEPARATOR, entry.command),
                None => entry.command.clone(),
            };
            if let Some(ssh) = &plan.ssh {
                command = self.resolver.route(ssh, &command)?;
            }

            self.send_keys(&target, &command);
            self.pane_index += 1;
        }
        Ok(())
    }

    /// Resolve entries, directory and ssh options for a pane.
    ///
    /// Each field falls back pane -> command-line override -> window ->
    /// session.
    fn plan(&self, window: &Window, pane: &Pane) -> Result<PanePlan> {
        let session = self.session;

        let ssh = SshFragment::merge(session.ssh.as_ref(), window.ssh.as_ref(), pane.ssh.as_ref())?;
        let dir = pane
            .dir
            .clone()
            .or_else(|| self.options.dir.clone())
            .or_else(|| window.dir.clone())
            .or_else(|| session.dir.clone())
            .filter(|d| !d.trim().is_empty());

        let entries = pane
            .shell
            .clone()
            .or_else(|| {
                self.options
                    .shell
                    .as_ref()
                    .map(|shell| vec![CommandEntry::new(shell.clone())])
            })
            .or_else(|| window.shell.clone())
            .or_else(|| session.shell.clone());

        let entries = match entries {
            Some(entries) if !entries.is_empty() => entries,
            _ if ssh.is_some() || dir.is_some() => vec![CommandEntry::new("")],
            _ => {
                return Err(UltimuxError::MalformedConfig(format!(
                    "pane {}:{}.{} in window '{}' has no shell, ssh or dir",
                    session.name, self.window_index, self.pane_index, window.name
                )));
            }
        };

        let entries = entries
            .into_iter()
            .map(|entry| {
                let direction = entry.split_direction()?;
                Ok((entry, direction))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PanePlan { entries, dir, ssh })
    }

    /// One `send-keys` per non-empty `;`-separated sub-command.
    fn send_keys(&mut self, target: &PaneCoordinate, command: &str) {
        for part in command.split(COMMAND_SEPARATOR) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (text, enter) = if self.options.debug {
                (format!("# {}", part), false)
            } else {
                (part.to_string(), true)
            };
            self.commands.push(TmuxCommand::SendKeys {
                target: target.clone(),
                text,
                enter,
            });
        }
    }

    fn synchronize(&self, window: &Window) -> bool {
        self.options.synchronize
            || window
                .synchronize
                .or(self.session.synchronize)
                .unwrap_or(false)
    }

    fn layout(&self, window: &Window) -> Option<Layout> {
        if self.options.tiled {
            return Some(Layout::Tiled);
        }
        window.layout.or(self.session.layout)
    }

    fn emit_finish(&mut self) {
        let session = &self.session.name;
        let focus = self.session.focus;

        self.commands.push(TmuxCommand::SetGlobalOption {
            option: "status-style".into(),
            value: STATUS_STYLE.into(),
        });
        self.commands.push(TmuxCommand::SetGlobalOption {
            option: "default-terminal".into(),
            value: DEFAULT_TERMINAL.into(),
        });

        let target = PaneCoordinate::new(session, focus.window, focus.pane);
        self.commands.push(TmuxCommand::SelectPane {
            target: target.clone(),
        });
        self.commands.push(TmuxCommand::Attach { target });
    }
}
