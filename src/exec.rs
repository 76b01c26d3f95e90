//! Child-process execution with injectable backends.
//!
//! All package-manager and vendor-installer invocations go through the
//! [`Executor`] trait so that resources and units can be exercised with mock
//! backends in tests. The production [`SystemExecutor`] bounds every spawned
//! command with a deadline: a hung child is killed and reported as a failure
//! instead of hanging the whole run.
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Raw exit code, if the process exited normally.
    pub code: Option<i32>,
}

/// Abstraction over process execution.
///
/// Production code uses [`SystemExecutor`]; tests use mock implementations
/// (see `resources::test_helpers::MockExecutor`).
pub trait Executor: Send + Sync {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned, exceeds the
    /// deadline, or exits with a non-zero status.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command in a specific directory.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Executor::run`].
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing a non-zero exit (returned in the result).
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned or exceeds the
    /// deadline.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production executor backed by [`std::process`].
///
/// Every spawned command is awaited with a poll-and-kill loop bounded by
/// `deadline`; a command that overruns is killed and surfaced as an error
/// with a "timed out" message.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    deadline: Duration,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(600),
        }
    }
}

impl SystemExecutor {
    /// Create an executor with an explicit per-command deadline.
    #[must_use]
    pub const fn with_deadline(deadline: Duration) -> Self {
        Self { deadline }
    }

    fn execute(&self, mut cmd: Command, label: &str) -> Result<ExecResult> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to execute: {label}"))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_reader = std::thread::spawn(move || drain(stdout));
        let err_reader = std::thread::spawn(move || drain(stderr));

        let status = self.wait_with_deadline(&mut child, label)?;
        let stdout = out_reader.join().unwrap_or_default();
        let stderr = err_reader.join().unwrap_or_default();

        Ok(ExecResult {
            stdout,
            stderr,
            success: status.success(),
            code: status.code(),
        })
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        label: &str,
    ) -> Result<std::process::ExitStatus> {
        let start = Instant::now();
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to await: {label}"))?
            {
                return Ok(status);
            }
            if start.elapsed() >= self.deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("{label} timed out after {}s", self.deadline.as_secs());
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    fn execute_checked(&self, cmd: Command, label: &str) -> Result<ExecResult> {
        let result = self.execute(cmd, label)?;
        if !result.success {
            bail!(
                "{label} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }
}

fn drain<R: Read>(pipe: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        self.execute_checked(cmd, program)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        self.execute_checked(cmd, &format!("{program} in {}", dir.display()))
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        self.execute(cmd, program)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
