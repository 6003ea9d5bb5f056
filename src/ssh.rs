//! Ssh option resolution and reachability probing.
//!
//! Ssh options can be given at the session, window and pane level. They are
//! merged field by field, so a pane that only sets `user` still inherits the
//! `server` of an enclosing level. The resolved options produce the text sent
//! to the pane: `ssh <destination>; <command>`, or only `ssh <destination>`
//! for login-only targets.
//!
//! Before the first command for a destination is emitted, [`SshResolver`]
//! runs a blocking `echo ok` round trip through a [`ReachabilityProbe`].
//! Destinations that answered are remembered for the rest of the run.

use crate::config::{SshFields, SshSpec};
use crate::error::{Result, UltimuxError};
use std::collections::HashSet;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Separator between the ssh invocation and the remote command.
pub const COMMAND_SEPARATOR: &str = ";";

/// Probe timeout used when the caller does not pick one.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Ssh options from one level of the config. Unset fields fall through to
/// the enclosing level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshFragment {
    pub server: Option<String>,
    pub user: Option<String>,
    pub login_only: Option<bool>,
}

impl SshFragment {
    /// Fragment naming only a server.
    pub fn server(server: impl Into<String>) -> Self {
        SshFragment {
            server: Some(server.into()),
            ..Default::default()
        }
    }

    /// Overlay `other` on top of `self`, field by field.
    pub fn overlay(&self, other: &SshFragment) -> SshFragment {
        SshFragment {
            server: other.server.clone().or_else(|| self.server.clone()),
            user: other.user.clone().or_else(|| self.user.clone()),
            login_only: other.login_only.or(self.login_only),
        }
    }

    /// Merge session, window and pane fragments (later levels win per field)
    /// and validate the result.
    ///
    /// Returns `Ok(None)` when no level mentions ssh.
    ///
    /// # Errors
    ///
    /// Returns [`UltimuxError::SshServerMissing`] if some level mentions ssh
    /// but none of them names a server.
    pub fn merge(
        session: Option<&SshFragment>,
        window: Option<&SshFragment>,
        pane: Option<&SshFragment>,
    ) -> Result<Option<SshOptions>> {
        let merged = [session, window, pane]
            .into_iter()
            .flatten()
            .fold(None::<SshFragment>, |acc, next| {
                Some(match acc {
                    Some(acc) => acc.overlay(next),
                    None => next.clone(),
                })
            });

        let Some(merged) = merged else {
            return Ok(None);
        };

        let server = merged
            .server
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                UltimuxError::SshServerMissing(match &merged.user {
                    Some(user) => format!("user '{}' has no server", user),
                    None => "no server at pane, window or session level".to_string(),
                })
            })?;

        Ok(Some(SshOptions {
            server,
            user: merged.user.filter(|u| !u.trim().is_empty()),
            login_only: merged.login_only.unwrap_or(false),
        }))
    }
}

impl TryFrom<&SshSpec> for SshFragment {
    type Error = UltimuxError;

    fn try_from(spec: &SshSpec) -> Result<Self> {
        match spec {
            SshSpec::Server(server) => Ok(SshFragment::server(server.clone())),
            SshSpec::Options(SshFields {
                server,
                user,
                login_only,
            }) => Ok(SshFragment {
                server: server.clone(),
                user: user.clone(),
                login_only: *login_only,
            }),
            SshSpec::List(_) => Err(UltimuxError::MalformedConfig(
                "ssh must be a server name or a mapping, not a list".into(),
            )),
        }
    }
}

/// Fully resolved ssh options for one pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptions {
    pub server: String,
    pub user: Option<String>,
    /// Only log in; no command follows the ssh call.
    pub login_only: bool,
}

impl SshOptions {
    /// `user@server`, or `server` when no user is set.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.server),
            None => self.server.clone(),
        }
    }

    /// The ssh invocation without any trailing command.
    pub fn ssh_command(&self) -> String {
        format!("ssh {}", self.destination())
    }

    /// Text to type into the pane for `command`.
    pub fn compose(&self, command: &str) -> String {
        if self.login_only {
            self.ssh_command()
        } else {
            format!("{}{} {}", self.ssh_command(), COMMAND_SEPARATOR, command)
        }
    }
}

/// Something that can tell whether a destination answers over ssh.
pub trait ReachabilityProbe {
    /// Return `true` when `destination` completed a round trip.
    fn probe(&mut self, destination: &str) -> bool;
}

/// Probe that runs `ssh <destination> echo ok` with a timeout.
///
/// A non-zero exit, a failure to start the program and a timeout all count
/// as unreachable. On timeout the child is killed.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    timeout: Duration,
    program: String,
    leading_args: Vec<String>,
}

impl SystemProbe {
    pub fn new(timeout: Duration) -> Self {
        SystemProbe {
            timeout,
            program: "ssh".to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Run `program` instead of `ssh`. `leading_args` go before the ssh
    /// options and the destination.
    pub fn with_program(mut self, program: impl Into<String>, leading_args: &[&str]) -> Self {
        self.program = program.into();
        self.leading_args = leading_args.iter().map(|a| a.to_string()).collect();
        self
    }

    fn run(&self, destination: &str) -> std::io::Result<bool> {
        let connect_timeout = format!("ConnectTimeout={}", self.timeout.as_secs().max(1));
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(["-o", "BatchMode=yes", "-o", connect_timeout.as_str()])
            .args([destination, "echo", "ok"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(status.success()),
            None => {
                tracing::debug!(destination, "ssh probe timed out");
                let _ = child.kill();
                let _ = child.wait();
                Ok(false)
            }
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        SystemProbe::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl ReachabilityProbe for SystemProbe {
    fn probe(&mut self, destination: &str) -> bool {
        match self.run(destination) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(
                    destination,
                    program = %self.program,
                    error = %e,
                    "could not start probe"
                );
                false
            }
        }
    }
}

/// Resolves ssh targets for one run and remembers which destinations have
/// already answered.
#[derive(Debug)]
pub struct SshResolver<P: ReachabilityProbe = SystemProbe> {
    probe: P,
    debug: bool,
    validated: HashSet<String>,
}

impl<P: ReachabilityProbe> SshResolver<P> {
    /// Create a resolver. In debug mode nothing is ever probed.
    pub fn new(probe: P, debug: bool) -> Self {
        SshResolver {
            probe,
            debug,
            validated: HashSet::new(),
        }
    }

    /// Probe the destination of `options` unless it was already validated
    /// in this run or the resolver is in debug mode.
    ///
    /// # Errors
    ///
    /// Returns [`UltimuxError::SshConnectivityFailed`] if the probe fails.
    pub fn ensure_reachable(&mut self, options: &SshOptions) -> Result<()> {
        if self.debug {
            return Ok(());
        }
        let destination = options.destination();
        if self.validated.contains(&destination) {
            return Ok(());
        }
        if self.validated.is_empty() {
            tracing::info!("checking ssh connectivity");
        }

        if !self.probe.probe(&destination) {
            tracing::error!("{:.<60} FAIL", destination);
            return Err(UltimuxError::SshConnectivityFailed { destination });
        }

        tracing::info!("{:.<60} OK", destination);
        self.validated.insert(destination);
        Ok(())
    }

    /// Probe if needed, then compose the text for `command`.
    pub fn route(&mut self, options: &SshOptions, command: &str) -> Result<String> {
        self.ensure_reachable(options)?;
        Ok(options.compose(command))
    }

    /// Whether `destination` has been confirmed reachable in this run.
    pub fn is_validated(&self, destination: &str) -> bool {
        self.validated.contains(destination)
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }
}
