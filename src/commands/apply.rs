//! The `apply` command: resolve, probe, converge, report.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cli::ApplyOpts;
use crate::config::{
    self, CliOverrides, DialoguerPrompter, FileConfig, Prompter, ResolvedConfig,
    stdin_is_interactive,
};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::platform::{Elevation, Platform};
use crate::units::{Context, catalog, run_units};

/// Run the apply command.
///
/// Per-unit failures are reported in the summary but do not change the exit
/// code; only fatal preconditions do (unreadable config, missing HOME, and
/// a missing package manager — surfaced after the file-edit units ran).
///
/// # Errors
///
/// Returns an error on fatal preconditions.
pub fn run(opts: &ApplyOpts, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("provision {version}"));

    let interactive = stdin_is_interactive() && !opts.resolve.assume_yes;
    let prompter = DialoguerPrompter;

    let config = if let Some(encoded) = &opts.resolved {
        // Remote mode injected a fully-resolved configuration; both ends
        // must execute from the identical value.
        ResolvedConfig::from_base64(encoded)?
    } else {
        log.stage("Resolving configuration");
        let file = FileConfig::load(&config_path(opts))?;
        let overrides = CliOverrides {
            assume_yes: opts.resolve.assume_yes,
            ssh_port: opts.resolve.port,
            ssh_key_action: opts.resolve.ssh_key_action,
            ssh_public_keys: opts.resolve.ssh_public_keys.clone(),
        };
        let prompt_ref: Option<&dyn Prompter> = interactive.then_some(&prompter);
        config::resolve(&file, &overrides, prompt_ref, log.as_ref())?
    };

    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor::with_deadline(
        Duration::from_secs(config.unit_timeout_secs),
    ));

    log.stage("Probing platform");
    let platform = Platform::detect(executor.as_ref());
    log.info(&platform.to_string());

    let elevation = Elevation::probe(executor.as_ref(), interactive);
    log.debug(&format!("elevation: {elevation:?}"));

    if config.prompt_for_confirmation && interactive && !opts.dry_run {
        if !prompter.confirm("Apply configuration to this machine?", true)? {
            log.info("aborted");
            return Ok(());
        }
    }

    let has_package_manager = platform.has_package_manager();
    let ctx = Context::new(
        config,
        platform,
        Arc::clone(log) as Arc<dyn Log>,
        opts.dry_run,
        executor,
        elevation,
    )?;

    let units = catalog::filter_units(catalog::all_units(), &opts.skip, &opts.only);
    let report = run_units(&units, &ctx);

    log.print_summary();
    log.debug(&format!(
        "report: {} succeeded, {} warned, {} failed",
        report.succeeded.len(),
        report.warned.len(),
        report.failed.len()
    ));

    // File-edit units have run by now; a missing package manager is still a
    // precondition failure that callers must see in the exit code.
    if !has_package_manager {
        anyhow::bail!("no supported package manager was detected; package units were skipped");
    }
    Ok(())
}

/// `--config`, or `~/.config/provision/config.json`.
fn config_path(opts: &ApplyOpts) -> PathBuf {
    opts.resolve.config.clone().unwrap_or_else(|| {
        std::env::var_os("HOME").map_or_else(
            || PathBuf::from("provision.json"),
            |home| PathBuf::from(home).join(".config/provision/config.json"),
        )
    })
}
