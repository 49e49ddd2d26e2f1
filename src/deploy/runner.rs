use async_trait::async_trait;
use std::{
    fmt,
    process::{Output, Stdio},
};
use tokio::process::Command;
use tracing::debug;

/// One external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            capture: false,
        }
    }

    #[must_use]
    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// Runs external commands for the pipeline.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// # Errors
    /// Returns the spawn error if the program could not be started.
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        debug!("running: {invocation}");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());

        if invocation.capture {
            Ok(command.output().await?.into())
        } else {
            let status = command.status().await?;
            Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                ..CommandOutput::default()
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn invocation_display_joins_args() {
        let invocation = Invocation::new("kubectl", ["apply", "-f", "k8s/namespace.yaml"]);
        assert_eq!(invocation.to_string(), "kubectl apply -f k8s/namespace.yaml");
        assert!(!invocation.capture);
        assert!(invocation.captured().capture);
    }

    #[tokio::test]
    async fn process_runner_reports_missing_program() {
        let invocation = Invocation::new("userboard-no-such-tool-4f1c", ["--version"]).captured();
        let err = ProcessRunner.run(&invocation).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_runner_captures_output() {
        let invocation = Invocation::new("sh", ["-c", "echo hello; echo oops >&2; exit 3"]).captured();
        let output = ProcessRunner.run(&invocation).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr, "oops");
    }
}
