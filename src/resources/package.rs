//! Native package installation resource.
//!
//! One resource type covers all seven supported managers. Command lines are
//! built by pure functions so tests can assert them exactly, and the
//! elevation capability decides whether a `sudo` prefix is applied.
use std::collections::HashSet;

use anyhow::{Result, bail};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::platform::{Elevation, PackageManager};

/// A system package that can be checked and installed.
pub struct PackageResource<'a> {
    /// Package name as known to the manager.
    pub name: String,
    /// Package manager to use.
    pub manager: PackageManager,
    /// Elevation capability for managers that need it.
    pub elevation: Elevation,
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for PackageResource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageResource")
            .field("name", &self.name)
            .field("manager", &self.manager)
            .field("elevation", &self.elevation)
            .finish_non_exhaustive()
    }
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(
        name: String,
        manager: PackageManager,
        elevation: Elevation,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            name,
            manager,
            elevation,
            executor,
        }
    }

    /// Determine the resource state from a pre-fetched set of installed
    /// package names (one bulk query instead of one query per package).
    #[must_use]
    pub fn state_from_installed(&self, installed: &HashSet<String>) -> ResourceState {
        if installed.contains(&self.name) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

/// Build the argv for refreshing the manager's package metadata.
#[must_use]
pub fn update_argv(manager: PackageManager) -> Option<Vec<&'static str>> {
    match manager {
        PackageManager::Brew => Some(vec!["brew", "update"]),
        PackageManager::Apt => Some(vec!["apt-get", "update"]),
        PackageManager::Dnf => Some(vec!["dnf", "makecache"]),
        PackageManager::Yum => Some(vec!["yum", "makecache"]),
        PackageManager::Pacman => Some(vec!["pacman", "-Sy", "--noconfirm"]),
        PackageManager::Apk => Some(vec!["apk", "update"]),
        PackageManager::Opkg => Some(vec!["opkg", "update"]),
        PackageManager::None => None,
    }
}

/// Build the argv for installing `names` in a single command.
#[must_use]
pub fn install_argv(manager: PackageManager, names: &[&str]) -> Option<Vec<String>> {
    if names.is_empty() {
        return None;
    }
    let base: Vec<&str> = match manager {
        PackageManager::Brew => vec!["brew", "install"],
        PackageManager::Apt => vec!["apt-get", "install", "-y"],
        PackageManager::Dnf => vec!["dnf", "install", "-y"],
        PackageManager::Yum => vec!["yum", "install", "-y"],
        PackageManager::Pacman => vec!["pacman", "-S", "--needed", "--noconfirm"],
        PackageManager::Apk => vec!["apk", "add"],
        PackageManager::Opkg => vec!["opkg", "install"],
        PackageManager::None => return None,
    };
    let mut argv: Vec<String> = base.into_iter().map(String::from).collect();
    argv.extend(names.iter().map(|n| (*n).to_string()));
    Some(argv)
}

/// Run a manager argv, applying a `sudo` prefix per the elevation capability.
///
/// # Errors
///
/// Returns an error when elevation is required but unavailable, or when the
/// command itself fails.
pub fn run_manager(
    executor: &dyn Executor,
    manager: PackageManager,
    elevation: Elevation,
    argv: &[String],
) -> Result<()> {
    let Some((program, rest)) = argv.split_first() else {
        return Ok(());
    };
    let rest_refs: Vec<&str> = rest.iter().map(String::as_str).collect();
    if manager.needs_elevation() {
        match elevation {
            Elevation::Root => {
                executor.run(program, &rest_refs)?;
            }
            Elevation::Sudo => {
                let mut sudo_args: Vec<&str> = vec![program.as_str()];
                sudo_args.extend(rest_refs);
                executor.run("sudo", &sudo_args)?;
            }
            Elevation::Unavailable => {
                bail!("{manager} requires elevated privileges");
            }
        }
    } else {
        executor.run(program, &rest_refs)?;
    }
    Ok(())
}

/// Query the full set of installed package names for a manager.
///
/// Runs a **single** command regardless of how many packages need to be
/// checked, compared to one query per package via
/// [`Resource::current_state`].
///
/// # Errors
///
/// Returns an error if the query command cannot be spawned.
pub fn get_installed_packages(
    manager: PackageManager,
    executor: &dyn Executor,
) -> Result<HashSet<String>> {
    let argv: &[&str] = match manager {
        PackageManager::Brew => &["brew", "list", "--formula"],
        PackageManager::Apt => &["dpkg-query", "-W", "-f=${Package}\n"],
        PackageManager::Dnf | PackageManager::Yum => &["rpm", "-qa", "--qf", "%{NAME}\n"],
        PackageManager::Pacman => &["pacman", "-Qq"],
        PackageManager::Apk => &["apk", "info"],
        PackageManager::Opkg => &["opkg", "list-installed"],
        PackageManager::None => return Ok(HashSet::new()),
    };
    let Some((program, rest)) = argv.split_first() else {
        return Ok(HashSet::new());
    };
    let result = executor.run_unchecked(program, rest)?;
    let mut set = HashSet::new();
    if result.success {
        for line in result.stdout.lines() {
            // opkg prints "name - version"; every other manager prints the
            // bare name per line. Taking the first token covers both.
            if let Some(name) = line.split_whitespace().next() {
                set.insert(name.to_string());
            }
        }
    }
    Ok(set)
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.name, self.manager)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let Some(argv) = install_argv(self.manager, &[self.name.as_str()]) else {
            return Ok(ResourceChange::Skipped {
                reason: "no package manager".to_string(),
            });
        };
        if self.manager.needs_elevation() && !self.elevation.available() {
            return Ok(ResourceChange::Skipped {
                reason: "requires elevated privileges".to_string(),
            });
        }
        run_manager(self.executor, self.manager, self.elevation, &argv)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PackageResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let name = self.name.as_str();
        let argv: Vec<&str> = match self.manager {
            PackageManager::Brew => vec!["brew", "list", "--formula", name],
            PackageManager::Apt => vec!["dpkg-query", "-W", name],
            PackageManager::Dnf | PackageManager::Yum => vec!["rpm", "-q", name],
            PackageManager::Pacman => vec!["pacman", "-Q", name],
            PackageManager::Apk => vec!["apk", "info", "-e", name],
            PackageManager::Opkg => vec!["opkg", "status", name],
            PackageManager::None => {
                return Ok(ResourceState::Invalid {
                    reason: "no package manager".to_string(),
                });
            }
        };
        let Some((program, rest)) = argv.split_first() else {
            return Ok(ResourceState::Missing);
        };
        let result = self.executor.run_unchecked(program, rest)?;
        // opkg exits 0 even for unknown packages; presence shows in stdout.
        let present = match self.manager {
            PackageManager::Opkg => result.success && !result.stdout.trim().is_empty(),
            _ => result.success,
        };
        if present {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}
