//! SSH key convergence: generate a keypair or authorize public keys.
use anyhow::Result;

use super::{Context, Gate, ProcessOpts, Unit, UnitResult, UnitStats};
use crate::config::{MissingKeyPolicy, SshKeyAction};
use crate::resources::fs;
use crate::resources::line::LineInFile;
use crate::units::process::run_resources;

/// Apply the configured SSH key action.
#[derive(Debug)]
pub struct SshKeys;

impl SshKeys {
    fn generate(ctx: &Context) -> Result<UnitResult> {
        let key_path = ctx.ssh_dir().join("id_ed25519");
        let mut stats = UnitStats::new();
        if key_path.exists() {
            ctx.log.debug(&format!("ok: {}", key_path.display()));
            stats.already_ok += 1;
            return Ok(stats.finish(ctx));
        }
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would generate: {}", key_path.display()));
            stats.changed += 1;
            return Ok(stats.finish(ctx));
        }
        std::fs::create_dir_all(ctx.ssh_dir())?;
        fs::set_mode(&ctx.ssh_dir(), 0o700)?;
        let path = key_path.to_string_lossy().to_string();
        ctx.executor
            .run("ssh-keygen", &["-t", "ed25519", "-N", "", "-f", path.as_str()])?;
        stats.changed += 1;
        Ok(stats.finish(ctx))
    }

    fn add(ctx: &Context) -> Result<UnitResult> {
        if ctx.config.ssh_public_keys.is_empty() {
            return match ctx.config.missing_key_policy {
                MissingKeyPolicy::Warn => {
                    Ok(UnitResult::Skipped("no public keys provided".to_string()))
                }
                MissingKeyPolicy::Fail => {
                    anyhow::bail!("key action is 'add' but no public keys were provided")
                }
            };
        }

        let authorized = ctx.ssh_dir().join("authorized_keys");
        let resources = ctx
            .config
            .ssh_public_keys
            .iter()
            .map(|key| LineInFile::new(authorized.clone(), key.clone()));
        let stats = run_resources(ctx, resources, &ProcessOpts::apply_all("authorize"))?;

        if !ctx.dry_run {
            fs::set_mode(&ctx.ssh_dir(), 0o700)?;
            if authorized.exists() {
                fs::set_mode(&authorized, 0o600)?;
            }
        }
        Ok(stats.finish(ctx))
    }
}

impl Unit for SshKeys {
    fn name(&self) -> &'static str {
        "ssh-keys"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        match ctx.config.ssh_key_action {
            SshKeyAction::Skip => Gate::Disabled("key action is 'skip'".to_string()),
            SshKeyAction::Generate if !ctx.executor.which("ssh-keygen") => {
                Gate::Unsupported("ssh-keygen is not installed".to_string())
            }
            SshKeyAction::Generate | SshKeyAction::Add => Gate::Run,
        }
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        match ctx.config.ssh_key_action {
            SshKeyAction::Generate => Self::generate(ctx),
            SshKeyAction::Add => Self::add(ctx),
            SshKeyAction::Skip => Ok(UnitResult::Skipped("key action is 'skip'".to_string())),
        }
    }
}
