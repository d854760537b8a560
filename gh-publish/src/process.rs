use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::process::Command;

use crate::error::{PublishError, Result};

/// Captured result of an external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Locate a required tool on PATH
pub fn require_tool(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| PublishError::MissingTool {
        tool: tool.to_string(),
    })
}

pub fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Run a command and capture its output; a non-zero exit is not an error here
pub async fn output(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    tracing::debug!("Running `{} {}` in {}", program, args.join(" "), cwd.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PublishError::MissingTool {
                tool: program.to_string(),
            },
            _ => PublishError::Io(e),
        })?;

    let result = CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !result.success() {
        tracing::debug!("`{}` exited with {}: {}", program, result.status, result.stderr.trim());
    }

    Ok(result)
}

/// Run a command, failing with [`PublishError::CommandFailed`] on a non-zero exit
pub async fn run(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    let result = output(program, args, cwd).await?;
    if !result.success() {
        return Err(PublishError::CommandFailed {
            program: program.to_string(),
            args: args.join(" "),
            status: result.status.to_string(),
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_output_captures_stdout() {
        let dir = tempdir().unwrap();
        let result = output("sh", &["-c", "echo hello"], dir.path()).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_reports_failure() {
        let dir = tempdir().unwrap();
        let err = run("sh", &["-c", "echo oops >&2; exit 3"], dir.path())
            .await
            .unwrap_err();
        match err {
            PublishError::CommandFailed { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_missing_tool() {
        let dir = tempdir().unwrap();
        let err = output("definitely-not-a-real-tool-7f3a", &[], dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MissingTool { .. }));
        assert!(!tool_available("definitely-not-a-real-tool-7f3a"));
    }
}
