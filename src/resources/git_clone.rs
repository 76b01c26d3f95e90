//! Clone-if-absent git repository resource.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A repository that must exist at a path; cloned once, never updated.
///
/// Re-running against an existing checkout is a no-op — keeping user-local
/// modifications to shell framework checkouts intact.
#[derive(Debug, Clone)]
pub struct GitClone {
    /// Clone URL.
    pub url: String,
    /// Destination directory.
    pub dest: PathBuf,
}

impl GitClone {
    /// Create a new clone resource.
    #[must_use]
    pub const fn new(url: String, dest: PathBuf) -> Self {
        Self { url, dest }
    }
}

impl Applicable for GitClone {
    fn description(&self) -> String {
        format!("{} -> {}", self.url, self.dest.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        super::fs::ensure_parent_dir(&self.dest)?;
        git2::Repository::clone(&self.url, &self.dest)
            .with_context(|| format!("clone {} into {}", self.url, self.dest.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for GitClone {
    fn current_state(&self) -> Result<ResourceState> {
        if self.dest.join(".git").exists() {
            return Ok(ResourceState::Correct);
        }
        if self.dest.exists() {
            return Ok(ResourceState::Invalid {
                reason: "destination exists but is not a git checkout".to_string(),
            });
        }
        Ok(ResourceState::Missing)
    }
}
