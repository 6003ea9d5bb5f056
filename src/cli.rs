//! Command-line interface for ultimux.
//!
//! Parses arguments using clap and provides the [`Cli`] struct containing
//! all user-specified options.

use crate::emitter::CompileOptions;
use clap::Parser;
use std::time::Duration;

/// Command-line arguments for ultimux.
///
/// # Examples
///
/// ```bash
/// # Build the "dev" session from a config file
/// utmx -c ~/sessions.yml -s dev
///
/// # Preview the commands without probing or running anything
/// utmx -c ~/sessions.yml -s dev --debug
///
/// # Run `uptime` in every pane that has no shell of its own, synchronized
/// utmx -s web --shell uptime --sync
/// ```
#[derive(Parser, Debug)]
#[command(name = "utmx")]
#[command(version)]
#[command(about = "Tmux session compiler - build windows, panes and ssh logins from config")]
#[command(long_about = "Ultimux turns a YAML or TOML session description into tmux commands.\n\n\
    Windows, panes, per-pane shells, ssh logins, layouts and pane synchronization\n\
    are compiled into one ordered command list, then replayed against tmux.")]
pub struct Cli {
    /// Config file (.yml, .yaml or .toml).
    ///
    /// Defaults to the first existing file among
    /// `$XDG_CONFIG_HOME/ultimux/config.*`, `~/.config/ultimux/config.*`
    /// and `~/.ultimux/ultimux.yml`.
    #[arg(short, long, value_name = "FILE")]
    pub config_file: Option<String>,

    /// Session to build (a top-level key of the config file).
    ///
    /// May be omitted when the file holds a single session.
    #[arg(short, long, value_name = "NAME")]
    pub session: Option<String>,

    /// List all sessions in the config file.
    #[arg(short, long)]
    pub list: bool,

    /// Command to run in panes that do not define their own shell.
    #[arg(long, value_name = "CMD")]
    pub shell: Option<String>,

    /// Directory to cd into in panes that do not define their own.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,

    /// Synchronize panes in every window.
    #[arg(long)]
    pub sync: bool,

    /// Spread panes evenly (tiled layout) in every window.
    #[arg(long)]
    pub tiled: bool,

    /// Show the commands and ask before running them.
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the commands instead of running them; skips ssh checks.
    #[arg(long)]
    pub debug: bool,

    /// Use the session name as-is instead of appending a timestamp.
    #[arg(long)]
    pub no_timestamp: bool,

    /// Seconds to wait for each ssh connectivity check (at least 1).
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub ssh_timeout: u64,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Run-level overrides for the emitter.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            debug: self.debug,
            synchronize: self.sync,
            tiled: self.tiled,
            shell: self.shell.clone(),
            dir: self.dir.clone(),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_compile_options() {
        let cli = Cli::parse_from([
            "utmx", "-s", "dev", "--sync", "--tiled", "--debug", "--shell", "uptime",
        ]);
        let options = cli.compile_options();
        assert!(options.synchronize && options.tiled && options.debug);
        assert_eq!(options.shell.as_deref(), Some("uptime"));
        assert_eq!(options.dir, None);
        assert_eq!(cli.probe_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_ssh_timeout_must_be_positive() {
        assert!(Cli::try_parse_from(["utmx", "--ssh-timeout", "0"]).is_err());
        let cli = Cli::try_parse_from(["utmx", "--ssh-timeout", "3"]).unwrap();
        assert_eq!(cli.probe_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
