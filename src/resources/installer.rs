//! Vendor bootstrap installers (rustup, nvm, uv).
//!
//! The install script is fetched over HTTPS, staged to a temp file, and run
//! with `sh` through the executor so the child is subject to the run
//! deadline. The whole resource is gated on the tool not already being
//! present, making re-runs no-ops.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// How an installer decides the tool is already present.
#[derive(Debug, Clone)]
pub enum InstallProbe {
    /// A binary of this name is on PATH.
    Binary(&'static str),
    /// A file exists at this path (e.g. `~/.nvm/nvm.sh` — nvm is a shell
    /// function, not a binary).
    File(PathBuf),
}

/// A tool installed by fetching and running a vendor bootstrap script.
pub struct ScriptInstaller<'a> {
    /// Tool name, for descriptions.
    pub name: &'static str,
    /// Presence probe.
    pub probe: InstallProbe,
    /// Script URL.
    pub url: &'static str,
    /// Extra arguments passed to `sh` after the script path
    /// (e.g. `["-s", "--", "-y"]` becomes `sh script -s -- -y`).
    pub args: &'static [&'static str],
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for ScriptInstaller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptInstaller")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl<'a> ScriptInstaller<'a> {
    /// Create a new script installer.
    #[must_use]
    pub const fn new(
        name: &'static str,
        probe: InstallProbe,
        url: &'static str,
        args: &'static [&'static str],
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            name,
            probe,
            url,
            args,
            executor,
        }
    }
}

/// Fetch a bootstrap script over HTTPS.
fn fetch_script(url: &str) -> Result<String> {
    let mut response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch installer: {url}"))?;
    response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("read installer body: {url}"))
}

/// Stage `script` to a temp file and run it with `sh` plus `args`.
pub(crate) fn run_script(executor: &dyn Executor, script: &str, args: &[&str]) -> Result<()> {
    let mut staged = tempfile::NamedTempFile::new().context("create staging file")?;
    std::io::Write::write_all(&mut staged, script.as_bytes()).context("stage installer")?;
    let path = staged.path().to_string_lossy().to_string();
    let mut argv: Vec<&str> = vec![path.as_str()];
    argv.extend_from_slice(args);
    executor.run("sh", &argv)?;
    Ok(())
}

impl Applicable for ScriptInstaller<'_> {
    fn description(&self) -> String {
        format!("{} (vendor installer)", self.name)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let script = fetch_script(self.url)?;
        run_script(self.executor, &script, self.args)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ScriptInstaller<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let present = match &self.probe {
            InstallProbe::Binary(binary) => self.executor.which(binary),
            InstallProbe::File(path) => path.exists(),
        };
        if present {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}
