//! MOTD greeting drop-in for Debian-family systems.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Gate, ProcessOpts, Unit, UnitResult};
use crate::resources::managed_file::ManagedFile;
use crate::units::process::run_resources;

const MOTD_PATH: &str = "/etc/update-motd.d/01-hello";

/// Write `/etc/update-motd.d/01-hello` with mode 0755.
#[derive(Debug)]
pub struct MotdGreeting;

impl MotdGreeting {
    fn content(ctx: &Context) -> String {
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"Welcome back, {}. This machine is managed by provision.\"\n",
            ctx.user
        )
    }
}

impl Unit for MotdGreeting {
    fn name(&self) -> &'static str {
        "motd"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if !ctx.platform.supports_motd() {
            return Gate::Disabled("update-motd.d is Debian-family only".to_string());
        }
        if !ctx.elevation.available() {
            return Gate::Unsupported("requires elevated privileges".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let resource = ManagedFile::elevated(
            PathBuf::from(MOTD_PATH),
            Self::content(ctx),
            0o755,
            ctx.elevation,
            ctx.executor.as_ref(),
        );
        run_resources(ctx, std::iter::once(resource), &ProcessOpts::apply_all("write"))
            .map(|stats| stats.finish(ctx))
    }
}
