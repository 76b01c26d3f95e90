//! Interactive prompts, behind a trait so the resolver stays testable.
use std::io::IsTerminal as _;

use anyhow::Result;

use super::SshKeyAction;

/// Prompt backend used by the resolver for prompt-eligible fields.
pub trait Prompter {
    /// Ask which SSH key action to take, offering `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal interaction fails.
    fn select_key_action(&self, default: SshKeyAction) -> Result<SshKeyAction>;

    /// Ask for the SSH port, offering `default` on empty input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal interaction fails.
    fn input_port(&self, default: u16) -> Result<u16>;

    /// Ask for one public key line; `None` when the user enters nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal interaction fails.
    fn input_public_key(&self) -> Result<Option<String>>;

    /// Yes/no confirmation with a default answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal interaction fails.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Whether both stdin and stderr are attached to a terminal.
///
/// When they are not, the resolver must never block on a prompt — it falls
/// back to defaults and prints the resolved value instead.
#[must_use]
pub fn stdin_is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Production prompter backed by `dialoguer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn select_key_action(&self, default: SshKeyAction) -> Result<SshKeyAction> {
        let options = [SshKeyAction::Generate, SshKeyAction::Add, SshKeyAction::Skip];
        let default_index = options.iter().position(|a| *a == default).unwrap_or(0);
        let labels = ["generate a new key", "add provided public keys", "skip"];
        let index = dialoguer::Select::new()
            .with_prompt("SSH key action")
            .items(&labels)
            .default(default_index)
            .interact()?;
        Ok(options.get(index).copied().unwrap_or(default))
    }

    fn input_port(&self, default: u16) -> Result<u16> {
        let port: u16 = dialoguer::Input::new()
            .with_prompt("SSH port")
            .default(default)
            .interact_text()?;
        Ok(port)
    }

    fn input_public_key(&self) -> Result<Option<String>> {
        let entry: String = dialoguer::Input::new()
            .with_prompt("Public key to authorize (empty to skip)")
            .allow_empty(true)
            .interact_text()?;
        let trimmed = entry.trim().to_string();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed))
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(dialoguer::Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()?)
    }
}

/// Scripted prompter for resolver tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    /// Answer for [`Prompter::select_key_action`].
    pub key_action: Option<SshKeyAction>,
    /// Answer for [`Prompter::input_port`].
    pub port: Option<u16>,
    /// Answer for [`Prompter::input_public_key`].
    pub public_key: Option<String>,
    /// Answer for [`Prompter::confirm`].
    pub confirm: bool,
    /// Number of prompt interactions performed.
    pub calls: std::cell::Cell<usize>,
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn select_key_action(&self, default: SshKeyAction) -> Result<SshKeyAction> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.key_action.unwrap_or(default))
    }

    fn input_port(&self, default: u16) -> Result<u16> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.port.unwrap_or(default))
    }

    fn input_public_key(&self) -> Result<Option<String>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.public_key.clone())
    }

    fn confirm(&self, _message: &str, _default: bool) -> Result<bool> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.confirm)
    }
}
