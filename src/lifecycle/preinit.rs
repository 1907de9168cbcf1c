//! Pre-init command execution.
//!
//! Commands run one after another before the dispatcher starts. The first
//! failure stops the sequence.

use std::process::ExitStatus;
use thiserror::Error;
use tokio::process::Command;

use crate::config::PreInitCommand;

#[derive(Debug, Error)]
pub enum PreInitError {
    #[error("[pre-init] empty command at position {0}")]
    Empty(usize),

    #[error("[pre-init] failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[pre-init] '{command}' exited with {status}")]
    Failed { command: String, status: ExitStatus },
}

/// Runs configured commands sequentially, fail-fast.
#[derive(Debug, Clone, Default)]
pub struct PreInitRunner {
    commands: Vec<PreInitCommand>,
}

impl PreInitRunner {
    pub fn new(commands: Vec<PreInitCommand>) -> Self {
        Self { commands }
    }

    /// Run every command, stopping at the first failure.
    ///
    /// Command lines are split on whitespace; no shell is involved.
    pub async fn run(&self) -> Result<(), PreInitError> {
        for (index, cmd) in self.commands.iter().enumerate() {
            let mut words = cmd.command.split_whitespace();
            let program = words.next().ok_or(PreInitError::Empty(index))?;

            tracing::info!(command = %cmd.command, "[pre-init] Running");
            // An abandoned startup must not leave the command running.
            let status = Command::new(program)
                .args(words)
                .kill_on_drop(true)
                .status()
                .await
                .map_err(|source| PreInitError::Spawn {
                    command: cmd.command.clone(),
                    source,
                })?;

            if !status.success() {
                return Err(PreInitError::Failed {
                    command: cmd.command.clone(),
                    status,
                });
            }
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cmd(line: &str) -> PreInitCommand {
        PreInitCommand { command: line.to_string() }
    }

    #[tokio::test]
    async fn test_runs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");

        let runner = PreInitRunner::new(vec![
            cmd(&format!("touch {}", first.display())),
            cmd(&format!("touch {}", second.display())),
        ]);
        runner.run().await.unwrap();

        assert!(first.exists());
        assert!(second.exists());
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let after = dir.path().join("after");

        let runner = PreInitRunner::new(vec![
            cmd("true"),
            cmd("false"),
            cmd(&format!("touch {}", after.display())),
        ]);
        let err = runner.run().await.unwrap_err();

        assert!(matches!(err, PreInitError::Failed { ref command, .. } if command == "false"));
        assert!(!after.exists());
    }

    #[tokio::test]
    async fn test_unknown_program() {
        let runner = PreInitRunner::new(vec![cmd("definitely-not-a-real-binary-4242")]);
        assert!(matches!(runner.run().await, Err(PreInitError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_empty_list_succeeds() {
        assert!(PreInitRunner::default().run().await.is_ok());
    }
}
