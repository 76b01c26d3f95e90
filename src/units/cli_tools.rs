//! The CLI tool set: native installs with per-manager name mapping and a
//! cargo fallback for tools absent from a distribution's repositories.
use anyhow::Result;

use super::{Context, Gate, Unit, UnitResult, UnitStats};
use crate::platform::PackageManager;
use crate::resources::package::{get_installed_packages, install_argv, run_manager};

/// One installable tool: per-manager package names and an optional cargo
/// fallback used when the current manager has no mapping.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Toggle name.
    pub name: &'static str,
    /// Binary probed for the cargo-fallback "already installed" check.
    pub binary: &'static str,
    /// Package name per manager; `None` means "not packaged there".
    pub apt: Option<&'static str>,
    /// Fedora/RHEL package name.
    pub dnf: Option<&'static str>,
    /// Arch package name.
    pub pacman: Option<&'static str>,
    /// Alpine package name.
    pub apk: Option<&'static str>,
    /// Homebrew formula name.
    pub brew: Option<&'static str>,
    /// OpenWrt package name.
    pub opkg: Option<&'static str>,
    /// Crate name for `cargo install`, when one exists.
    pub cargo: Option<&'static str>,
}

impl ToolSpec {
    /// The package name for `manager`, if any.
    #[must_use]
    pub const fn package_for(&self, manager: PackageManager) -> Option<&'static str> {
        match manager {
            PackageManager::Apt => self.apt,
            PackageManager::Dnf | PackageManager::Yum => self.dnf,
            PackageManager::Pacman => self.pacman,
            PackageManager::Apk => self.apk,
            PackageManager::Brew => self.brew,
            PackageManager::Opkg => self.opkg,
            PackageManager::None => None,
        }
    }
}

/// A tool packaged under the same name everywhere.
const fn everywhere(name: &'static str) -> ToolSpec {
    ToolSpec {
        name,
        binary: name,
        apt: Some(name),
        dnf: Some(name),
        pacman: Some(name),
        apk: Some(name),
        brew: Some(name),
        opkg: None,
        cargo: None,
    }
}

/// The full tool catalog, in declaration order.
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        binary: "rg",
        opkg: Some("ripgrep"),
        cargo: Some("ripgrep"),
        ..everywhere("ripgrep")
    },
    ToolSpec {
        binary: "fd",
        apt: Some("fd-find"),
        dnf: Some("fd-find"),
        cargo: Some("fd-find"),
        ..everywhere("fd")
    },
    ToolSpec {
        cargo: Some("bat"),
        ..everywhere("bat")
    },
    ToolSpec {
        cargo: Some("eza"),
        ..everywhere("eza")
    },
    ToolSpec {
        opkg: Some("fzf"),
        ..everywhere("fzf")
    },
    ToolSpec {
        opkg: Some("jq"),
        ..everywhere("jq")
    },
    everywhere("yq"),
    ToolSpec {
        opkg: Some("htop"),
        ..everywhere("htop")
    },
    everywhere("btop"),
    ToolSpec {
        opkg: Some("tmux"),
        ..everywhere("tmux")
    },
    ToolSpec {
        binary: "nvim",
        ..everywhere("neovim")
    },
    ToolSpec {
        binary: "delta",
        apt: None,
        cargo: Some("git-delta"),
        apk: Some("delta"),
        ..everywhere("git-delta")
    },
    ToolSpec {
        apt: None,
        ..everywhere("lazygit")
    },
    ToolSpec {
        pacman: Some("github-cli"),
        apk: Some("github-cli"),
        ..everywhere("gh")
    },
    everywhere("tldr"),
    ToolSpec {
        opkg: Some("ncdu"),
        ..everywhere("ncdu")
    },
    ToolSpec {
        opkg: Some("tree"),
        ..everywhere("tree")
    },
    ToolSpec {
        opkg: Some("wget"),
        ..everywhere("wget")
    },
    ToolSpec {
        opkg: Some("rsync"),
        ..everywhere("rsync")
    },
    ToolSpec {
        dnf: Some("ShellCheck"),
        ..everywhere("shellcheck")
    },
    everywhere("shfmt"),
    ToolSpec {
        cargo: Some("hyperfine"),
        ..everywhere("hyperfine")
    },
    ToolSpec {
        apt: None,
        dnf: None,
        cargo: Some("tokei"),
        ..everywhere("tokei")
    },
    ToolSpec {
        cargo: Some("just"),
        ..everywhere("just")
    },
    ToolSpec {
        apt: None,
        dnf: None,
        cargo: Some("watchexec-cli"),
        ..everywhere("watchexec")
    },
    ToolSpec {
        cargo: Some("zoxide"),
        ..everywhere("zoxide")
    },
    everywhere("direnv"),
    ToolSpec {
        apt: None,
        dnf: None,
        cargo: Some("du-dust"),
        ..everywhere("dust")
    },
];

/// Install every enabled CLI tool.
#[derive(Debug)]
pub struct InstallCliTools;

impl Unit for InstallCliTools {
    fn name(&self) -> &'static str {
        "cli-tools"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        let any_enabled = TOOLS.iter().any(|t| ctx.config.tool_enabled(t.name));
        if !any_enabled {
            return Gate::Disabled("all tools disabled".to_string());
        }
        if !ctx.platform.has_package_manager() && !ctx.executor.which("cargo") {
            return Gate::Unsupported(
                "no package manager and no cargo for fallbacks".to_string(),
            );
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let manager = ctx.platform.package_manager;
        let executor = ctx.executor.as_ref();
        let installed = get_installed_packages(manager, executor)?;

        let mut stats = UnitStats::new();
        let mut native_batch: Vec<&'static str> = Vec::new();

        for tool in TOOLS.iter().filter(|t| ctx.config.tool_enabled(t.name)) {
            if let Some(package) = tool.package_for(manager) {
                if installed.contains(package) {
                    ctx.log.debug(&format!("ok: {} ({manager})", tool.name));
                    stats.already_ok += 1;
                } else if ctx.dry_run {
                    ctx.log
                        .dry_run(&format!("would install: {} ({manager})", tool.name));
                    stats.changed += 1;
                } else {
                    native_batch.push(package);
                }
                continue;
            }

            // No mapping for this manager: generic cargo fallback, else skip.
            let Some(crate_name) = tool.cargo else {
                ctx.log.warn(&format!(
                    "skipping {}: no install strategy for {manager}",
                    tool.name
                ));
                stats.skipped += 1;
                continue;
            };
            if executor.which(tool.binary) {
                ctx.log.debug(&format!("ok: {} (cargo)", tool.name));
                stats.already_ok += 1;
            } else if !executor.which("cargo") {
                ctx.log.warn(&format!(
                    "skipping {}: no {manager} package and cargo is unavailable",
                    tool.name
                ));
                stats.skipped += 1;
            } else if ctx.dry_run {
                ctx.log
                    .dry_run(&format!("would run: cargo install {crate_name}"));
                stats.changed += 1;
            } else {
                match executor.run("cargo", &["install", crate_name]) {
                    Ok(_) => {
                        ctx.log.debug(&format!("install: {} (cargo)", tool.name));
                        stats.changed += 1;
                    }
                    Err(e) => {
                        // One tool's failure must not sink the rest.
                        ctx.log
                            .warn(&format!("failed to install {}: {e:#}", tool.name));
                        stats.skipped += 1;
                    }
                }
            }
        }

        if !native_batch.is_empty() {
            if let Some(argv) = install_argv(manager, &native_batch) {
                run_manager(executor, manager, ctx.elevation, &argv)?;
                stats.changed += u32::try_from(native_batch.len()).unwrap_or(u32::MAX);
            }
        }

        Ok(stats.finish(ctx))
    }
}
