//! Whole-file managed content with mode bits.
//!
//! Used for root-owned drop-ins (sudoers, MOTD) and the MCP JSON documents.
//! Content comparison is by SHA-256 digest so an unchanged file is never
//! rewritten (no spurious mtime churn, byte-identical regeneration).
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use sha2::{Digest as _, Sha256};

use super::{Applicable, Resource, ResourceChange, ResourceState, fs};
use crate::exec::Executor;
use crate::platform::Elevation;

/// A file whose entire content and mode are managed by the engine.
pub struct ManagedFile<'a> {
    /// Target path.
    pub path: PathBuf,
    /// Desired content.
    pub content: String,
    /// Desired Unix mode bits.
    pub mode: u32,
    /// Elevated-write route; `None` writes directly as the current user.
    elevated: Option<(Elevation, &'a dyn Executor)>,
}

impl std::fmt::Debug for ManagedFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedFile")
            .field("path", &self.path)
            .field("mode", &format_args!("{:o}", self.mode))
            .finish_non_exhaustive()
    }
}

impl<'a> ManagedFile<'a> {
    /// A file written directly as the current user.
    #[must_use]
    pub const fn new(path: PathBuf, content: String, mode: u32) -> Self {
        Self {
            path,
            content,
            mode,
            elevated: None,
        }
    }

    /// A file written through the elevation capability (root paths).
    ///
    /// With [`Elevation::Root`] the write is direct; with
    /// [`Elevation::Sudo`] the content is staged to a temp file and moved
    /// into place via `sudo install`; with [`Elevation::Unavailable`] apply
    /// reports a skip.
    #[must_use]
    pub const fn elevated(
        path: PathBuf,
        content: String,
        mode: u32,
        elevation: Elevation,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            path,
            content,
            mode,
            elevated: Some((elevation, executor)),
        }
    }

    fn digest(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    fn write_direct(&self) -> Result<()> {
        fs::write_atomic(&self.path, &self.content)?;
        fs::set_mode(&self.path, self.mode)
    }

    fn write_via_sudo(&self, executor: &dyn Executor) -> Result<()> {
        let mut staged = tempfile::NamedTempFile::new().context("create staging file")?;
        std::io::Write::write_all(&mut staged, self.content.as_bytes())
            .context("write staging file")?;
        let staged_path = staged.path().to_string_lossy().to_string();
        let mode = format!("{:o}", self.mode);
        let target = self.path.to_string_lossy().to_string();
        executor.run(
            "sudo",
            &[
                "install",
                "-m",
                mode.as_str(),
                "-o",
                "root",
                "-g",
                "root",
                staged_path.as_str(),
                target.as_str(),
            ],
        )?;
        Ok(())
    }
}

impl Applicable for ManagedFile<'_> {
    fn description(&self) -> String {
        format!("{} (mode {:o})", self.path.display(), self.mode)
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.elevated {
            None | Some((Elevation::Root, _)) => self.write_direct()?,
            Some((Elevation::Sudo, executor)) => self.write_via_sudo(executor)?,
            Some((Elevation::Unavailable, _)) => {
                return Ok(ResourceChange::Skipped {
                    reason: "requires elevated privileges".to_string(),
                });
            }
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ManagedFile<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Missing);
        }
        let Ok(existing) = std::fs::read(&self.path) else {
            // Root-owned file unreadable by the current user; treat as
            // incorrect and let apply() decide whether it can elevate.
            return Ok(ResourceState::Incorrect {
                current: "unreadable".to_string(),
            });
        };
        if Self::digest(&existing) != Self::digest(self.content.as_bytes()) {
            return Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            });
        }
        if let Some(mode) = fs::read_mode(&self.path) {
            if mode != self.mode {
                return Ok(ResourceState::Incorrect {
                    current: format!("mode {mode:o}"),
                });
            }
        }
        Ok(ResourceState::Correct)
    }
}
