//! Named, dependency-ordered convergence units.
pub mod catalog;
pub mod cli_tools;
pub mod engine;
pub mod mcp_config;
pub mod motd;
pub mod packages;
mod process;
pub mod shell_setup;
pub mod ssh_keys;
pub mod sudoers;
pub mod toolchains;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::ResolvedConfig;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::{Elevation, Platform};

pub use engine::{Report, run_units};
pub use process::{
    ProcessOpts, UnitResult, UnitStats, process_resource_states, process_resources, run_resources,
};

/// Shared context for unit execution.
///
/// The configuration is immutable for the whole run — built once by the
/// resolver and passed explicitly, never ambient.
pub struct Context {
    /// Fully resolved configuration.
    pub config: ResolvedConfig,
    /// Detected platform.
    pub platform: Platform,
    /// Logger for output and unit recording.
    pub log: Arc<dyn Log>,
    /// Whether to preview changes without applying.
    pub dry_run: bool,
    /// User's home directory.
    pub home: PathBuf,
    /// Login user name.
    pub user: String,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Privilege-elevation capability, probed once at run start.
    pub elevation: Elevation,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform)
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("user", &self.user)
            .field("elevation", &self.elevation)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a new context, reading `HOME` and `USER` from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the `HOME` environment variable is not set.
    pub fn new(
        config: ResolvedConfig,
        platform: Platform,
        log: Arc<dyn Log>,
        dry_run: bool,
        executor: Arc<dyn Executor>,
        elevation: Elevation,
    ) -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?;
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_else(|_| "root".to_string());
        Ok(Self {
            config,
            platform,
            log,
            dry_run,
            home: PathBuf::from(home),
            user,
            executor,
            elevation,
        })
    }

    /// The shell rc file maintained by the engine.
    #[must_use]
    pub fn zshrc(&self) -> PathBuf {
        self.home.join(".zshrc")
    }

    /// `~/.ssh`
    #[must_use]
    pub fn ssh_dir(&self) -> PathBuf {
        self.home.join(".ssh")
    }

    /// `~/.config/mcp`
    #[must_use]
    pub fn mcp_dir(&self) -> PathBuf {
        self.home.join(".config/mcp")
    }

    /// `$XDG_DATA_HOME` or `~/.local/share`.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        std::env::var_os("XDG_DATA_HOME")
            .map_or_else(|| self.home.join(".local/share"), PathBuf::from)
    }
}

/// Whether a unit should run, and if not, why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Unit applies; run it.
    Run,
    /// Unit is off for this run (configuration toggle or platform
    /// inapplicability). Recorded quietly as not applicable.
    Disabled(String),
    /// Unit should run but cannot (no strategy for this package manager, no
    /// elevation, missing tool). Recorded as skipped, with a warning.
    Unsupported(String),
}

/// A named, executable unit.
///
/// Dependencies are unit names: several units are instances of one generic
/// struct, so type identity cannot distinguish them. The catalog declares
/// units in dependency order; the engine verifies that and hard-skips
/// dependents of failed prerequisites.
pub trait Unit: Send + Sync {
    /// Unique unit name (kebab-case).
    fn name(&self) -> &'static str;

    /// Names of units that must have succeeded before this one runs.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether this unit applies to the current configuration and platform.
    fn gate(&self, ctx: &Context) -> Gate;

    /// Execute the unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit fails; the engine records it as failed
    /// and continues with independent units.
    fn run(&self, ctx: &Context) -> Result<UnitResult>;
}
