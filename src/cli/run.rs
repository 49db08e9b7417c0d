//! `forge run`: execute a shell command and have failures explained.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

use crate::llm::prompts::{command_analysis_prompt, DEBUGGER_PERSONA};
use crate::llm::OneShotQuery;

/// Captured result of one command.
#[derive(Debug)]
pub struct CommandRun {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandRun {
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit code for reporting; `-1` when the process had none.
    pub fn return_code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    /// Analysis is worth asking for when the command failed or wrote to stderr.
    pub fn needs_analysis(&self) -> bool {
        !self.timed_out && (!self.succeeded() || !self.stderr.trim().is_empty())
    }
}

pub async fn run(
    command: &str,
    cwd: Option<PathBuf>,
    timeout: Duration,
    analyze: bool,
    env: &[String],
) -> Result<()> {
    let workspace = match cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    println!("\n⚡ Running: {command}");
    println!("Directory: {}\n", workspace.display());

    let result = execute(command, &workspace, &parse_env(env), timeout).await?;
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);

    if result.timed_out {
        println!("\n⏰ Timeout: command exceeded {}s", timeout.as_secs());
        return Ok(());
    }
    if result.succeeded() {
        println!("\n✅ Command completed successfully");
    } else {
        println!("\n❌ Command failed with code {}", result.return_code());
    }

    if analyze && result.needs_analysis() {
        println!("\n🔍 Analyzing output with DeepSeek...");
        let query = OneShotQuery::new(super::gateway(None)?);
        let prompt =
            command_analysis_prompt(command, result.return_code(), &result.stdout, &result.stderr);
        let analysis = query.consult(DEBUGGER_PERSONA, &prompt).await?;
        println!("\n── DeepSeek Analysis ──\n{analysis}");
    }

    Ok(())
}

/// Run `command` through the platform shell. The child is killed if it
/// outlives `timeout`.
pub async fn execute(
    command: &str,
    cwd: &Path,
    env: &[(String, String)],
    timeout: Duration,
) -> Result<CommandRun> {
    let mut cmd = shell(command);
    cmd.current_dir(cwd)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(output) => {
            let output = output?;
            Ok(CommandRun {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                timed_out: false,
            })
        }
        Err(_) => Ok(CommandRun {
            status: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
        }),
    }
}

fn shell(command: &str) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command);
    cmd
}

/// Parse `KEY=VALUE` pairs, skipping malformed entries.
fn parse_env(pairs: &[String]) -> Vec<(String, String)> {
    pairs
        .iter()
        .filter_map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Some((key.to_string(), value.to_string())),
            _ => {
                warn!("Ignoring malformed environment variable: {}", pair);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env() {
        let pairs: Vec<String> =
            ["A=1", "B=x=y", "broken", "=v"].iter().map(|p| p.to_string()).collect();

        assert_eq!(
            parse_env(&pairs),
            vec![("A".to_string(), "1".to_string()), ("B".to_string(), "x=y".to_string())]
        );
    }

    #[test]
    fn test_needs_analysis() {
        let finished = |status, stderr: &str| CommandRun {
            status,
            stdout: String::new(),
            stderr: stderr.to_string(),
            timed_out: false,
        };

        assert!(!finished(Some(0), "").needs_analysis());
        assert!(finished(Some(0), "warning: unused").needs_analysis());
        assert!(finished(Some(1), "").needs_analysis());
        assert!(finished(None, "").needs_analysis());
        assert_eq!(finished(None, "").return_code(), -1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_output_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let env = vec![("FORGE_RUN_TEST".to_string(), "visible".to_string())];

        let result = execute(
            "echo $FORGE_RUN_TEST; echo oops >&2; exit 3",
            dir.path(),
            &env,
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(result.stdout, "visible\n");
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.status, Some(3));
        assert!(!result.succeeded());
        assert!(!result.timed_out);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();

        let result = execute("ls", dir.path(), &[], Duration::from_secs(10)).await.unwrap();

        assert!(result.succeeded());
        assert!(result.stdout.contains("marker.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_times_out() {
        let dir = tempfile::tempdir().unwrap();

        let result =
            execute("sleep 5", dir.path(), &[], Duration::from_millis(100)).await.unwrap();

        assert!(result.timed_out);
        assert!(!result.needs_analysis());
    }
}
