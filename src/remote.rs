//! Remote convergence over SSH.
//!
//! The resolved configuration is serialized (base64 JSON) onto the remote
//! command line — explicit parameter passing, never ambient state — and the
//! current binary is copied to a 0700 temp directory on the remote host.
//! Both ends run the identical engine. The temp directory is removed when
//! the run finishes, success or failure.
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context as _, Result, bail};

use crate::config::ResolvedConfig;
use crate::exec::Executor;
use crate::logging::Log;

/// Connection parameters for the remote host.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    /// Host name or address.
    pub host: String,
    /// Remote user; `None` uses SSH's own default.
    pub user: Option<String>,
    /// SSH port.
    pub port: u16,
    /// Identity file, if any.
    pub identity: Option<PathBuf>,
}

impl RemoteTarget {
    /// The `user@host` (or bare `host`) destination argument.
    #[must_use]
    pub fn destination(&self) -> String {
        self.user.as_ref().map_or_else(
            || self.host.clone(),
            |user| format!("{user}@{}", self.host),
        )
    }

    /// Common `ssh` arguments: port, identity, batch-friendly options.
    #[must_use]
    pub fn ssh_args(&self) -> Vec<String> {
        let mut args = vec!["-p".to_string(), self.port.to_string()];
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }

    /// Common `scp` arguments (`scp` spells the port flag differently).
    #[must_use]
    pub fn scp_args(&self) -> Vec<String> {
        let mut args = vec!["-P".to_string(), self.port.to_string()];
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }
}

/// Build the command line executed on the remote host.
#[must_use]
pub fn remote_apply_command(
    remote_dir: &str,
    encoded_config: &str,
    dry_run: bool,
    verbose: bool,
) -> String {
    let mut cmd = format!("{remote_dir}/provision apply --resolved {encoded_config} -y");
    if dry_run {
        cmd.push_str(" --dry-run");
    }
    if verbose {
        cmd.push_str(" -v");
    }
    cmd
}

/// Removes the remote temp directory on drop, unless already cleaned.
///
/// Cleanup must run on every exit path, including errors between the
/// mktemp and the final ssh session.
struct RemoteDirGuard<'a> {
    executor: &'a dyn Executor,
    target: &'a RemoteTarget,
    dir: String,
    log: &'a dyn Log,
    done: bool,
}

impl RemoteDirGuard<'_> {
    fn cleanup(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        let mut args: Vec<String> = self.target.ssh_args();
        args.push(self.target.destination());
        args.push(format!("rm -rf {}", self.dir));
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        if self.executor.run_unchecked("ssh", &arg_refs).is_err() {
            self.log
                .warn(&format!("failed to remove remote directory {}", self.dir));
        }
    }
}

impl Drop for RemoteDirGuard<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Run one ssh command and return trimmed stdout, failing on non-zero exit.
fn ssh_capture(executor: &dyn Executor, target: &RemoteTarget, command: &str) -> Result<String> {
    let mut args: Vec<String> = target.ssh_args();
    args.push(target.destination());
    args.push(command.to_string());
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = executor
        .run("ssh", &arg_refs)
        .with_context(|| format!("ssh {}", target.destination()))?;
    Ok(result.stdout.trim().to_string())
}

/// Execute the convergence engine on `target`.
///
/// Streams remote output to the local console; allocates a PTY when the
/// local session is interactive so remote sub-installers can prompt.
/// Returns the remote exit code.
///
/// # Errors
///
/// Returns an error if the SSH connection cannot be established, the binary
/// cannot be copied, or the local binary path cannot be determined.
pub fn run_remote(
    executor: &dyn Executor,
    target: &RemoteTarget,
    config: &ResolvedConfig,
    dry_run: bool,
    verbose: bool,
    interactive: bool,
    log: &dyn Log,
) -> Result<i32> {
    let encoded = config.to_base64()?;

    // Keep the process alive on Ctrl-C so the cleanup guard still runs; the
    // ssh child receives the signal and terminates the remote session.
    let _ = ctrlc::set_handler(|| {});

    log.stage("Preparing remote host");
    let remote_dir = ssh_capture(executor, target, "mktemp -d /tmp/provision.XXXXXX")?;
    if remote_dir.is_empty() {
        bail!("remote mktemp produced no directory");
    }
    let mut guard = RemoteDirGuard {
        executor,
        target,
        dir: remote_dir.clone(),
        log,
        done: false,
    };
    // mktemp creates 0700 directories, but do not rely on the remote umask.
    ssh_capture(executor, target, &format!("chmod 700 {remote_dir}"))?;

    log.info("copying engine binary");
    let local_binary = std::env::current_exe().context("locate current binary")?;
    let mut scp_args: Vec<String> = target.scp_args();
    scp_args.push(local_binary.display().to_string());
    scp_args.push(format!("{}:{remote_dir}/provision", target.destination()));
    let scp_refs: Vec<&str> = scp_args.iter().map(String::as_str).collect();
    executor
        .run("scp", &scp_refs)
        .context("copy engine to remote host")?;

    log.stage("Running remote convergence");
    let command = remote_apply_command(&remote_dir, &encoded, dry_run, verbose);
    let mut ssh = Command::new("ssh");
    if interactive {
        ssh.arg("-t");
    }
    ssh.args(target.ssh_args());
    ssh.arg(target.destination());
    ssh.arg(command);
    ssh.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let status = ssh.status().context("run remote session")?;

    guard.cleanup();
    Ok(status.code().unwrap_or(1))
}
