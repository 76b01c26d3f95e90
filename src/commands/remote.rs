//! The `remote` command: resolve locally, execute the engine remotely.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::RemoteOpts;
use crate::config::{
    self, CliOverrides, DialoguerPrompter, FileConfig, Prompter, stdin_is_interactive,
};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::remote::{RemoteTarget, run_remote};

/// Run the remote command. `verbose` is forwarded to the remote engine.
///
/// # Errors
///
/// Returns an error if resolution fails, the SSH connection cannot be
/// established, or the remote run exits non-zero.
pub fn run(opts: &RemoteOpts, verbose: bool, log: &Arc<Logger>) -> Result<()> {
    let interactive = stdin_is_interactive() && !opts.resolve.assume_yes;
    let prompter = DialoguerPrompter;

    log.stage("Resolving configuration");
    let file = FileConfig::load(&config_path(opts))?;
    let overrides = CliOverrides {
        assume_yes: opts.resolve.assume_yes,
        ssh_port: opts.resolve.port,
        ssh_key_action: opts.resolve.ssh_key_action,
        ssh_public_keys: opts.resolve.ssh_public_keys.clone(),
    };
    let prompt_ref: Option<&dyn Prompter> = interactive.then_some(&prompter);
    let config = config::resolve(&file, &overrides, prompt_ref, log.as_ref())?;

    let target = RemoteTarget {
        host: opts.host.clone(),
        user: opts
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok()),
        port: opts.resolve.port.unwrap_or(config.ssh_port),
        identity: opts.identity.clone(),
    };

    if config.prompt_for_confirmation && interactive && !opts.dry_run {
        let message = format!("Run convergence on {}?", target.destination());
        if !prompter.confirm(&message, true)? {
            log.info("aborted");
            return Ok(());
        }
    }

    let executor = SystemExecutor::default();
    let code = run_remote(
        &executor,
        &target,
        &config,
        opts.dry_run,
        verbose,
        interactive,
        log.as_ref(),
    )?;
    if code != 0 {
        anyhow::bail!("remote run failed (exit {code})");
    }
    log.info("remote run completed");
    Ok(())
}

/// `--config`, or `~/.config/provision/config.json`.
fn config_path(opts: &RemoteOpts) -> PathBuf {
    opts.resolve.config.clone().unwrap_or_else(|| {
        std::env::var_os("HOME").map_or_else(
            || PathBuf::from("provision.json"),
            |home| PathBuf::from(home).join(".config/provision/config.json"),
        )
    })
}
