//! Claim-once symlink resource.
//!
//! Unlike a converging symlink, this resource only ever *claims* an absent
//! path: an existing file or link at the target — even one pointing
//! somewhere else — is left untouched and reported, never replaced. Editor
//! configurations a user has customised must not be clobbered.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{Applicable, Resource, ResourceChange, ResourceState, fs};

/// A symlink created only when the target path does not exist yet.
#[derive(Debug, Clone)]
pub struct ClaimedSymlink {
    /// What the symlink points to.
    pub source: PathBuf,
    /// Where the symlink is created.
    pub target: PathBuf,
}

impl ClaimedSymlink {
    /// Create a new claim-once symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Applicable for ClaimedSymlink {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        fs::ensure_parent_dir(&self.target)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&self.source, &self.target)
            .with_context(|| format!("create link: {}", self.target.display()))?;
        #[cfg(not(unix))]
        anyhow::bail!("symlinks are only supported on unix targets");
        #[cfg(unix)]
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        match std::fs::read_link(&self.target) {
            Ok(existing) if existing == self.source => {
                std::fs::remove_file(&self.target)
                    .with_context(|| format!("remove link: {}", self.target.display()))?;
                Ok(ResourceChange::Applied)
            }
            _ => Ok(ResourceChange::Skipped {
                reason: "not our link".to_string(),
            }),
        }
    }
}

impl Resource for ClaimedSymlink {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }
        if let Ok(existing) = std::fs::read_link(&self.target) {
            if existing == self.source {
                return Ok(ResourceState::Correct);
            }
            return Ok(ResourceState::Invalid {
                reason: format!("already links to {}; left untouched", existing.display()),
            });
        }
        if self.target.symlink_metadata().is_ok() {
            // A regular file or directory occupies the path. Claim-once
            // semantics: report, do not replace.
            return Ok(ResourceState::Invalid {
                reason: "path already exists; left untouched".to_string(),
            });
        }
        Ok(ResourceState::Missing)
    }
}
