//! Passwordless-sudo drop-in for the provisioning user.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Gate, ProcessOpts, Unit, UnitResult};
use crate::resources::managed_file::ManagedFile;
use crate::units::process::run_resources;

/// Write `/etc/sudoers.d/<user>` with mode 0440.
#[derive(Debug)]
pub struct SudoersDropIn;

impl SudoersDropIn {
    fn drop_in_path(ctx: &Context) -> PathBuf {
        PathBuf::from("/etc/sudoers.d").join(&ctx.user)
    }

    fn content(ctx: &Context) -> String {
        format!("{} ALL=(ALL) NOPASSWD:ALL\n", ctx.user)
    }
}

impl Unit for SudoersDropIn {
    fn name(&self) -> &'static str {
        "sudoers"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if ctx.user == "root" {
            return Gate::Disabled("running as root".to_string());
        }
        if !ctx.elevation.available() {
            return Gate::Unsupported("requires elevated privileges".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let resource = ManagedFile::elevated(
            Self::drop_in_path(ctx),
            Self::content(ctx),
            0o440,
            ctx.elevation,
            ctx.executor.as_ref(),
        );
        run_resources(ctx, std::iter::once(resource), &ProcessOpts::apply_all("write"))
            .map(|stats| stats.finish(ctx))
    }
}
