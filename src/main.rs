//! Ultimux CLI entry point.
//!
//! This binary provides the `utmx` command for building tmux sessions from
//! YAML or TOML configuration.

use clap::Parser;
use std::io;
use tracing_subscriber::EnvFilter;
use ultimux::cli::Cli;
use ultimux::config::ConfigFile;
use ultimux::error::Result;
use ultimux::ssh::{SshResolver, SystemProbe};
use ultimux::tmux::{self, TmuxRunner};
use ultimux::{Executor, emitter, loader, normalize};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Main application logic.
fn run(cli: &Cli) -> Result<()> {
    let path = loader::resolve_config_path(cli.config_file.as_deref())?;
    let config = loader::load_config(&path)?;
    tracing::debug!(path = %path.display(), "using config");

    if cli.list {
        print_listings(&config);
        return Ok(());
    }

    let (key, spec) = config.select(cli.session.as_deref())?;
    let base = spec.name.as_deref().unwrap_or(key);
    let session_name = if cli.no_timestamp {
        base.to_string()
    } else {
        format!("{}_{}", base, chrono::Local::now().format("%Y%m%d_%H%M%S"))
    };

    let session = normalize(&session_name, spec)?;
    let options = cli.compile_options();
    let mut resolver = SshResolver::new(SystemProbe::new(cli.probe_timeout()), options.debug);
    let commands = emitter::create(&session, &options, &mut resolver)?;

    if options.debug {
        return Executor::print(&commands, &mut io::stdout());
    }

    if !tmux::is_installed() {
        tracing::warn!("tmux not found on PATH");
    }
    if tmux::in_tmux() {
        tracing::warn!("already inside tmux; attaching will nest sessions");
    }

    let executor = Executor::new(cli.interactive || session.interactive);
    executor.execute(
        &commands,
        &mut TmuxRunner,
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )
}

/// Print all available sessions.
fn print_listings(config: &ConfigFile) {
    println!("Sessions:");
    for session in config.list_sessions() {
        println!("  {}", session);
    }
}
