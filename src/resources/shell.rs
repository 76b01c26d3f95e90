//! Default login shell resource.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// A resource for configuring the default login shell.
pub struct DefaultShell<'a> {
    /// Target shell name (e.g., "zsh").
    target_shell: String,
    /// Current `$SHELL` value, captured by the caller.
    current_shell: Option<String>,
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for DefaultShell<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultShell")
            .field("target_shell", &self.target_shell)
            .field("current_shell", &self.current_shell)
            .finish_non_exhaustive()
    }
}

impl<'a> DefaultShell<'a> {
    /// Create a new default shell resource.
    #[must_use]
    pub const fn new(
        target_shell: String,
        current_shell: Option<String>,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            target_shell,
            current_shell,
            executor,
        }
    }
}

impl Applicable for DefaultShell<'_> {
    fn description(&self) -> String {
        format!("default shell -> {}", self.target_shell)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let result = self.executor.run("which", &[&self.target_shell])?;
        let shell_path = result.stdout.trim().to_string();
        self.executor.run("chsh", &["-s", &shell_path])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DefaultShell<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let suffix = format!("/{}", self.target_shell);
        match self.current_shell.as_deref() {
            Some(current) if current.ends_with(&suffix) => Ok(ResourceState::Correct),
            Some("") | None => Ok(ResourceState::Missing),
            Some(current) => Ok(ResourceState::Incorrect {
                current: current.to_string(),
            }),
        }
    }
}
