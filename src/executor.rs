//! Replay of emitted commands.
//!
//! Commands are run one after another. A command that tmux rejects is logged
//! and replay moves on: the next command is issued without checking that the
//! previous one had any effect, and nothing is rolled back.

use crate::error::{Result, UltimuxError};
use crate::tmux::{CommandRunner, TmuxCommand};
use std::io::{BufRead, Write};

/// Replays a command list, optionally after asking for confirmation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    interactive: bool,
}

impl Executor {
    pub fn new(interactive: bool) -> Self {
        Executor { interactive }
    }

    /// Print every command, one per line.
    pub fn print<W: Write>(commands: &[TmuxCommand], output: &mut W) -> Result<()> {
        writeln!(output)?;
        for command in commands {
            writeln!(output, "{}", command)?;
        }
        Ok(())
    }

    /// Show the commands and ask whether to run them. Only `y` or `yes`
    /// (any case) counts as consent.
    pub fn confirm<R: BufRead, W: Write>(
        commands: &[TmuxCommand],
        input: &mut R,
        output: &mut W,
    ) -> Result<bool> {
        Self::print(commands, output)?;
        write!(output, "\nExecute these commands? [y/N] ")?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    /// Replay `commands` through `runner`.
    ///
    /// In interactive mode the list is shown on `output` first and the run
    /// is aborted unless the answer read from `input` is affirmative.
    ///
    /// # Errors
    ///
    /// - [`UltimuxError::Aborted`] if the confirmation is declined
    /// - [`UltimuxError::TmuxError`] if the runner cannot start tmux
    pub fn execute<C, R, W>(
        &self,
        commands: &[TmuxCommand],
        runner: &mut C,
        input: &mut R,
        output: &mut W,
    ) -> Result<()>
    where
        C: CommandRunner,
        R: BufRead,
        W: Write,
    {
        if self.interactive && !Self::confirm(commands, input, output)? {
            return Err(UltimuxError::Aborted);
        }

        for command in commands {
            tracing::debug!(kind = command.kind(), "{}", command);
            if !runner.run(command)? {
                tracing::warn!("tmux reported failure: {}", command);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionName;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        ran: Vec<String>,
        fail_kind: Option<&'static str>,
    }

    impl CommandRunner for Recorder {
        fn run(&mut self, command: &TmuxCommand) -> Result<bool> {
            self.ran.push(command.to_string());
            Ok(Some(command.kind()) != self.fail_kind)
        }
    }

    fn commands() -> Vec<TmuxCommand> {
        let session = SessionName::new("dev").unwrap();
        vec![
            TmuxCommand::NewSession {
                session: session.clone(),
                window: "main".into(),
            },
            TmuxCommand::SplitRow { session },
        ]
    }

    #[test]
    fn test_replays_in_order_without_prompt() {
        let mut runner = Recorder::default();
        let mut output = Vec::new();
        Executor::new(false)
            .execute(&commands(), &mut runner, &mut Cursor::new(""), &mut output)
            .unwrap();
        assert_eq!(
            runner.ran,
            vec!["tmux new-session -d -A -s dev -n main", "tmux split-window -f -t dev"]
        );
        assert!(output.is_empty());
    }

    #[test]
    fn test_failed_command_does_not_stop_replay() {
        let mut runner = Recorder {
            fail_kind: Some("create-session"),
            ..Default::default()
        };
        Executor::new(false)
            .execute(&commands(), &mut runner, &mut Cursor::new(""), &mut Vec::new())
            .unwrap();
        assert_eq!(runner.ran.len(), 2);
    }

    #[test]
    fn test_interactive_accepts_yes() {
        let mut runner = Recorder::default();
        let mut output = Vec::new();
        Executor::new(true)
            .execute(&commands(), &mut runner, &mut Cursor::new("Y\n"), &mut output)
            .unwrap();
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("tmux split-window -f -t dev"));
        assert!(shown.contains("Execute these commands?"));
        assert_eq!(runner.ran.len(), 2);
    }

    #[test]
    fn test_interactive_aborts_on_anything_else() {
        for answer in ["n\n", "\n", "maybe\n", ""] {
            let mut runner = Recorder::default();
            let err = Executor::new(true)
                .execute(&commands(), &mut runner, &mut Cursor::new(answer), &mut Vec::new())
                .unwrap_err();
            assert!(matches!(err, UltimuxError::Aborted));
            assert!(runner.ran.is_empty());
        }
    }
}
