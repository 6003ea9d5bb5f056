//! # Ultimux
//!
//! A tmux session compiler that builds windows, panes and ssh logins from a
//! YAML or TOML session description.
//!
//! A session description is compiled into one ordered list of tmux commands
//! (session and window creation, pane splits, key-sends, layout and
//! synchronization, focus and attach), which is then replayed against tmux.
//! Remote targets are checked for reachability before the first command is
//! sent to them.
//!
//! ## Quick Example
//!
//! ```yaml
//! # ~/.config/ultimux/config.yml
//! web:
//!   ssh: { server: web01, user: ops }
//!   dir: /srv/app
//!   windows:
//!     - name: logs
//!       panes:
//!         - tail -f log/production.log
//!         - [htop, { shell: "df -h", split: vertical }]
//!     - name: shell
//!       panes:
//!         - ssh: { login_only: true }
//! ```
//!
//! ```bash
//! utmx -s web --debug   # print the commands
//! utmx -s web           # build and attach
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into these modules:
//!
//! - [`config`]: raw config shapes and YAML/TOML parsing
//! - [`loader`]: config file discovery and loading
//! - [`normalize`]: legacy key migration and canonicalization
//! - [`session`]: the canonical session tree
//! - [`ssh`]: ssh option merging and reachability probes
//! - [`emitter`]: session tree to tmux command list
//! - [`tmux`]: tmux command vocabulary
//! - [`executor`]: replay of the command list
//! - [`cli`]: command-line argument parsing with clap
//! - [`error`]: error types

pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod loader;
pub mod normalize;
pub mod session;
pub mod ssh;
pub mod tmux;

pub use config::{ConfigFile, Layout, SessionSpec};
pub use emitter::{CompileOptions, create};
pub use error::{Result, UltimuxError};
pub use executor::Executor;
pub use normalize::normalize;
pub use session::{PaneCoordinate, SessionConfig};
pub use ssh::{SshResolver, SystemProbe};
pub use tmux::TmuxCommand;
