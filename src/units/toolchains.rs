//! Language toolchains: rustup, nvm, uv, and uv-managed tools.
use anyhow::Result;

use super::{Context, Gate, ProcessOpts, Unit, UnitResult, UnitStats};
use crate::resources::installer::{InstallProbe, ScriptInstaller};
use crate::resources::line::LineInFile;
use crate::resources::Resource as _;
use crate::resources::package::PackageResource;
use crate::units::process::{process_single, run_resources};

/// Install the Rust toolchain via rustup and wire the cargo env line.
#[derive(Debug)]
pub struct RustToolchain;

impl Unit for RustToolchain {
    fn name(&self) -> &'static str {
        "rust-toolchain"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if !ctx.config.package_enabled("cargo") {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if ctx.platform.is_openwrt() {
            return Gate::Unsupported("no host toolchain on OpenWrt".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let installer = ScriptInstaller::new(
            "rustup",
            InstallProbe::Binary("cargo"),
            "https://sh.rustup.rs",
            &["-s", "--", "-y", "--no-modify-path"],
            ctx.executor.as_ref(),
        );
        let mut stats = run_resources(
            ctx,
            std::iter::once(installer),
            &ProcessOpts::install_missing("install"),
        )?;
        stats += run_resources(
            ctx,
            std::iter::once(LineInFile::new(
                ctx.zshrc(),
                ". \"$HOME/.cargo/env\"".to_string(),
            )),
            &ProcessOpts::apply_all("append"),
        )?;
        Ok(stats.finish(ctx))
    }
}

/// Install nvm, or native node where glibc binaries are unavailable.
#[derive(Debug)]
pub struct NodeVersionManager;

impl NodeVersionManager {
    /// Native package name used on musl-based systems.
    fn native_package(ctx: &Context) -> &'static str {
        if ctx.platform.is_openwrt() { "node" } else { "nodejs" }
    }
}

impl Unit for NodeVersionManager {
    fn name(&self) -> &'static str {
        "nvm"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if !ctx.config.package_enabled("nvm") {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if ctx.platform.is_musl_based() && !ctx.platform.has_package_manager() {
            return Gate::Unsupported("no package manager for the native fallback".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        if ctx.platform.is_musl_based() {
            // Version managers download glibc-linked node builds; fall back
            // to the distribution package instead.
            ctx.log.info("glibc version manager unavailable; installing node natively");
            let package = Self::native_package(ctx);
            let resource = PackageResource::new(
                package.to_string(),
                ctx.platform.package_manager,
                ctx.elevation,
                ctx.executor.as_ref(),
            );
            let state = resource.current_state()?;
            let stats = process_single(
                ctx,
                &resource,
                state,
                &ProcessOpts::install_missing("install"),
            )?;
            return Ok(stats.finish(ctx));
        }

        let nvm_dir = ctx.home.join(".nvm");
        let installer = ScriptInstaller::new(
            "nvm",
            InstallProbe::File(nvm_dir.join("nvm.sh")),
            "https://raw.githubusercontent.com/nvm-sh/nvm/v0.40.1/install.sh",
            &[],
            ctx.executor.as_ref(),
        );
        let mut stats = run_resources(
            ctx,
            std::iter::once(installer),
            &ProcessOpts::install_missing("install"),
        )?;

        let rc = ctx.zshrc();
        let lines = [
            "export NVM_DIR=\"$HOME/.nvm\"".to_string(),
            "[ -s \"$NVM_DIR/nvm.sh\" ] && . \"$NVM_DIR/nvm.sh\"".to_string(),
        ];
        stats += run_resources(
            ctx,
            lines
                .into_iter()
                .map(|line| LineInFile::new(rc.clone(), line)),
            &ProcessOpts::apply_all("append"),
        )?;
        Ok(stats.finish(ctx))
    }
}

/// Install uv via its bootstrap script and put `~/.local/bin` on PATH.
#[derive(Debug)]
pub struct UvInstaller;

impl Unit for UvInstaller {
    fn name(&self) -> &'static str {
        "uv"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if !ctx.config.package_enabled("uv") {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let installer = ScriptInstaller::new(
            "uv",
            InstallProbe::Binary("uv"),
            "https://astral.sh/uv/install.sh",
            &[],
            ctx.executor.as_ref(),
        );
        let mut stats = run_resources(
            ctx,
            std::iter::once(installer),
            &ProcessOpts::install_missing("install"),
        )?;
        stats += run_resources(
            ctx,
            std::iter::once(LineInFile::new(
                ctx.zshrc(),
                "export PATH=\"$HOME/.local/bin:$PATH\"".to_string(),
            )),
            &ProcessOpts::apply_all("append"),
        )?;
        Ok(stats.finish(ctx))
    }
}

/// A tool managed by `uv tool install` (ruff, ty).
#[derive(Debug)]
pub struct UvTool {
    tool: &'static str,
}

impl UvTool {
    /// The ruff linter/formatter.
    #[must_use]
    pub const fn ruff() -> Self {
        Self { tool: "ruff" }
    }

    /// The ty type checker.
    #[must_use]
    pub const fn ty() -> Self {
        Self { tool: "ty" }
    }
}

impl Unit for UvTool {
    fn name(&self) -> &'static str {
        self.tool
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["uv"]
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if !ctx.config.package_enabled(self.tool) {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if !ctx.executor.which("uv") {
            return Gate::Unsupported("uv is not installed".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let mut stats = UnitStats::new();
        if ctx.executor.which(self.tool) {
            ctx.log.debug(&format!("ok: {}", self.tool));
            stats.already_ok += 1;
            return Ok(stats.finish(ctx));
        }
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would run: uv tool install {}", self.tool));
            stats.changed += 1;
            return Ok(stats.finish(ctx));
        }
        ctx.executor.run("uv", &["tool", "install", self.tool])?;
        stats.changed += 1;
        Ok(stats.finish(ctx))
    }
}
