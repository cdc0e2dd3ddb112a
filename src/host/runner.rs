//! # Script Runner
//!
//! Executes a script body by piping it to an interpreter's stdin.
//!
//! The interpreter is configured as a program plus arguments, e.g.
//! `["lua", "-"]`. Output is captured rather than inherited: the TUI owns the
//! terminal, so a failing script's stderr becomes the error message.

use super::HostError;
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs script content through an external interpreter
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    program: String,
    args: Vec<String>,
}

impl ScriptRunner {
    /// Build a runner from a command line (`program arg...`)
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("Interpreter command cannot be empty")?;

        if program.trim().is_empty() {
            anyhow::bail!("Interpreter program name cannot be blank");
        }

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `content`; `name` only labels log lines and errors
    pub async fn run(&self, name: &str, content: &str) -> Result<(), HostError> {
        tracing::debug!(target: "host.runner", program = %self.program, script = name, "spawn");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                HostError::Execution(format!("failed to start '{}': {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(content.as_bytes())
                .await
                .map_err(|e| HostError::Execution(format!("failed to send script: {}", e)))?;
            // Closing stdin tells the interpreter the script is complete
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| HostError::Execution(format!("failed to wait for '{}': {}", name, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            match output.status.code() {
                Some(code) => format!("'{}' exited with status {}", name, code),
                None => format!("'{}' was terminated by a signal", name),
            }
        } else {
            stderr
        };

        Err(HostError::Execution(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> ScriptRunner {
        ScriptRunner::new(&["sh".to_string(), "-s".to_string()]).expect("runner")
    }

    #[test]
    fn test_new_rejects_empty_command() {
        assert!(ScriptRunner::new(&[]).is_err());
        assert!(ScriptRunner::new(&["  ".to_string()]).is_err());
    }

    #[test]
    fn test_new_splits_program_and_args() {
        let runner = ScriptRunner::new(&["lua".to_string(), "-".to_string()]).expect("runner");
        assert_eq!(runner.program(), "lua");
        assert_eq!(runner.args, vec!["-".to_string()]);
    }

    #[tokio::test]
    async fn test_run_success() {
        let result = sh().run("ok", "true\n").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_failure_reports_stderr() {
        let result = sh().run("bad", "echo boom >&2\nexit 2\n").await;
        match result {
            Err(HostError::Execution(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_failure_without_stderr_reports_status() {
        let result = sh().run("quiet", "exit 3\n").await;
        match result {
            Err(HostError::Execution(message)) => {
                assert_eq!(message, "'quiet' exited with status 3");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_interpreter() {
        let runner =
            ScriptRunner::new(&["macrokey-no-such-interpreter".to_string()]).expect("runner");
        let result = runner.run("x", "").await;
        assert!(matches!(result, Err(HostError::Execution(m)) if m.contains("failed to start")));
    }
}
