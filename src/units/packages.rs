//! Package-manager refresh and the base package set.
use anyhow::Result;

use super::{Context, Gate, Unit, UnitResult, UnitStats};
use crate::resources::package::{
    PackageResource, get_installed_packages, install_argv, run_manager, update_argv,
};

/// Refresh the package manager's metadata (`apt-get update` and friends).
#[derive(Debug)]
pub struct PackageUpdate;

impl Unit for PackageUpdate {
    fn name(&self) -> &'static str {
        "package-update"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if ctx.config.skip_package_update {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if !ctx.platform.has_package_manager() {
            return Gate::Unsupported("no supported package manager".to_string());
        }
        if ctx.platform.package_manager.needs_elevation() && !ctx.elevation.available() {
            return Gate::Unsupported("requires elevated privileges".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let manager = ctx.platform.package_manager;
        let Some(argv) = update_argv(manager) else {
            return Ok(UnitResult::Skipped("no update command".to_string()));
        };
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would run: {}", argv.join(" ")));
            return Ok(UnitResult::DryRun);
        }
        let argv: Vec<String> = argv.into_iter().map(String::from).collect();
        run_manager(ctx.executor.as_ref(), manager, ctx.elevation, &argv)?;
        ctx.log.info(&format!("{manager} metadata refreshed"));
        Ok(UnitResult::Ok)
    }
}

/// Packages every later unit leans on.
pub const CORE_PACKAGES: &[&str] = &["git", "curl", "zsh"];

/// Install the base package set in one batched command.
#[derive(Debug)]
pub struct CorePackages;

impl Unit for CorePackages {
    fn name(&self) -> &'static str {
        "core-packages"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if !ctx.platform.has_package_manager() {
            return Gate::Unsupported("no supported package manager".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let manager = ctx.platform.package_manager;
        let installed = get_installed_packages(manager, ctx.executor.as_ref())?;

        let mut stats = UnitStats::new();
        let mut missing: Vec<&str> = Vec::new();
        for name in CORE_PACKAGES {
            let resource = PackageResource::new(
                (*name).to_string(),
                manager,
                ctx.elevation,
                ctx.executor.as_ref(),
            );
            if resource.state_from_installed(&installed) == crate::resources::ResourceState::Correct
            {
                ctx.log.debug(&format!("ok: {name} ({manager})"));
                stats.already_ok += 1;
            } else if ctx.dry_run {
                ctx.log.dry_run(&format!("would install: {name} ({manager})"));
                stats.changed += 1;
            } else {
                missing.push(name);
            }
        }

        if !missing.is_empty() {
            let Some(argv) = install_argv(manager, &missing) else {
                return Ok(UnitResult::Skipped("no install strategy".to_string()));
            };
            run_manager(ctx.executor.as_ref(), manager, ctx.elevation, &argv)?;
            stats.changed += u32::try_from(missing.len()).unwrap_or(u32::MAX);
        }

        Ok(stats.finish(ctx))
    }
}
