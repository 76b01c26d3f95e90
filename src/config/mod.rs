//! Layered configuration resolution.
//!
//! Four layers merge into one immutable [`ResolvedConfig`], with precedence
//! (highest to lowest):
//!
//! 1. CLI flags
//! 2. `-y` / non-interactive forcing
//! 3. config file values
//! 4. interactive answers
//! 5. built-in defaults
//!
//! "Absence never overrides presence" is a hard invariant: a layer only
//! changes a field it explicitly sets. The resolved value is built fresh per
//! invocation and passed explicitly to every component — only its *effects*
//! persist on disk.
pub mod defaults;
pub mod file;
pub mod prompt;

use std::collections::BTreeMap;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::logging::Log;
pub use file::FileConfig;
pub use prompt::{DialoguerPrompter, Prompter, stdin_is_interactive};

/// What to do about SSH keys during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SshKeyAction {
    /// Generate an ed25519 keypair if none exists.
    Generate,
    /// Append provided public keys to authorized_keys.
    Add,
    /// Leave SSH keys alone.
    Skip,
}

/// Policy when the key action is `add` but no public keys were provided.
///
/// The source behaviors disagreed here, so it is configurable rather than
/// guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Skip the unit with a logged warning (default).
    Warn,
    /// Mark the unit failed.
    Fail,
}

/// The fully merged configuration for one run.
///
/// Serializable so remote mode can ship it to the remote engine verbatim —
/// both ends execute from the same resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Ask for confirmation before applying (ignored when non-interactive).
    pub prompt_for_confirmation: bool,
    /// SSH daemon port recorded for remote connections.
    pub ssh_port: u16,
    /// SSH key handling.
    pub ssh_key_action: SshKeyAction,
    /// Public keys to authorize, in order.
    pub ssh_public_keys: Vec<String>,
    /// Policy for `add` with an empty key list.
    pub missing_key_policy: MissingKeyPolicy,
    /// Skip the package-manager metadata refresh.
    pub skip_package_update: bool,
    /// Skip shell framework installation and rc wiring.
    pub skip_shell_setup: bool,
    /// Skip MCP config generation and editor links.
    pub skip_mcp_setup: bool,
    /// Per-command deadline for unit child processes, in seconds.
    pub unit_timeout_secs: u64,
    /// Language-toolchain toggles.
    pub packages: BTreeMap<String, bool>,
    /// CLI tool toggles.
    pub cli_tools: BTreeMap<String, bool>,
    /// MCP server toggles.
    pub mcp_servers: BTreeMap<String, bool>,
    /// Editor-integration toggles.
    pub editors: BTreeMap<String, bool>,
}

impl ResolvedConfig {
    /// Whether a language-toolchain toggle is enabled.
    #[must_use]
    pub fn package_enabled(&self, name: &str) -> bool {
        self.packages.get(name).copied().unwrap_or(false)
    }

    /// Whether a CLI tool toggle is enabled.
    #[must_use]
    pub fn tool_enabled(&self, name: &str) -> bool {
        self.cli_tools.get(name).copied().unwrap_or(false)
    }

    /// Whether an editor toggle is enabled.
    #[must_use]
    pub fn editor_enabled(&self, name: &str) -> bool {
        self.editors.get(name).copied().unwrap_or(false)
    }

    /// Serialize for the remote command line.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_base64(&self) -> Result<String> {
        use base64::Engine as _;
        let json = serde_json::to_vec(self).context("serialize resolved config")?;
        Ok(base64::engine::general_purpose::STANDARD.encode(json))
    }

    /// Deserialize from the remote command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not base64-encoded JSON of a
    /// resolved configuration.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        use base64::Engine as _;
        let json = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .context("decode resolved config")?;
        serde_json::from_slice(&json).context("parse resolved config")
    }
}

/// Values taken from CLI flags — the highest-precedence layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `-y`: force non-interactive resolution.
    pub assume_yes: bool,
    /// `--port`
    pub ssh_port: Option<u16>,
    /// `--ssh-key-action`
    pub ssh_key_action: Option<SshKeyAction>,
    /// `--ssh-public-key` (repeatable)
    pub ssh_public_keys: Vec<String>,
}

/// Merge all four layers into a [`ResolvedConfig`].
///
/// `prompter` is `None` when stdin is not a terminal; prompt-eligible fields
/// then fall back silently to the lower layers, and the resolved value is
/// printed for transparency. A field set in the config file is never
/// prompted for (config file outranks interactive answers).
///
/// # Errors
///
/// Returns an error only if a prompt interaction itself fails.
pub fn resolve(
    file: &FileConfig,
    cli: &CliOverrides,
    prompter: Option<&dyn Prompter>,
    log: &dyn Log,
) -> Result<ResolvedConfig> {
    let mut cfg = defaults::resolved();

    for warning in &file.warnings {
        log.warn(warning);
    }
    file.overlay(&mut cfg);

    let interactive = prompter.is_some() && !cli.assume_yes;

    // Prompt-eligible fields: only asked when neither the CLI nor the
    // config file provides a value.
    if cli.ssh_port.is_none() && file.ssh_port.is_none() {
        if interactive {
            if let Some(p) = prompter {
                cfg.ssh_port = p.input_port(cfg.ssh_port)?;
            }
        } else {
            log.info(&format!("ssh port: {} (default)", cfg.ssh_port));
        }
    }

    if cli.ssh_key_action.is_none() && file.ssh_key_action.is_none() {
        if interactive {
            if let Some(p) = prompter {
                cfg.ssh_key_action = p.select_key_action(cfg.ssh_key_action)?;
            }
        } else {
            log.info(&format!(
                "ssh key action: {} (default)",
                key_action_name(cfg.ssh_key_action)
            ));
        }
    }

    // When the effective action is `add` and no keys came from any layer,
    // offer one interactive entry before the policy decides.
    let effective_action = cli.ssh_key_action.unwrap_or(cfg.ssh_key_action);
    if effective_action == SshKeyAction::Add
        && cfg.ssh_public_keys.is_empty()
        && cli.ssh_public_keys.is_empty()
        && interactive
    {
        if let Some(p) = prompter {
            if let Some(key) = p.input_public_key()? {
                cfg.ssh_public_keys.push(key);
            }
        }
    }

    // CLI flags always win, interactive or not.
    if let Some(port) = cli.ssh_port {
        cfg.ssh_port = port;
    }
    if let Some(action) = cli.ssh_key_action {
        cfg.ssh_key_action = action;
    }
    if !cli.ssh_public_keys.is_empty() {
        cfg.ssh_public_keys.clone_from(&cli.ssh_public_keys);
    }
    if cli.assume_yes {
        cfg.prompt_for_confirmation = false;
    }

    Ok(cfg)
}

const fn key_action_name(action: SshKeyAction) -> &'static str {
    match action {
        SshKeyAction::Generate => "generate",
        SshKeyAction::Add => "add",
        SshKeyAction::Skip => "skip",
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::prompt::ScriptedPrompter;
    use super::*;
    use crate::logging::{Log, UnitStatus};
    use std::sync::Mutex;

    /// Log collector for resolver tests.
    #[derive(Debug, Default)]
    pub struct TestLog {
        pub lines: Mutex<Vec<String>>,
    }

    impl Log for TestLog {
        fn stage(&self, _msg: &str) {}
        fn info(&self, msg: &str) {
            self.lines.lock().unwrap().push(format!("info: {msg}"));
        }
        fn debug(&self, _msg: &str) {}
        fn warn(&self, msg: &str) {
            self.lines.lock().unwrap().push(format!("warn: {msg}"));
        }
        fn error(&self, _msg: &str) {}
        fn dry_run(&self, _msg: &str) {}
        fn record_unit(&self, _name: &str, _status: UnitStatus, _message: Option<&str>) {}
    }

    fn file_with_port(port: u16) -> FileConfig {
        FileConfig {
            ssh_port: Some(port),
            ..FileConfig::default()
        }
    }

    #[test]
    fn default_port_without_overrides() {
        let log = TestLog::default();
        let cfg = resolve(&FileConfig::default(), &CliOverrides::default(), None, &log).unwrap();
        assert_eq!(cfg.ssh_port, 22);
    }

    #[test]
    fn config_file_overrides_default() {
        let log = TestLog::default();
        let cfg = resolve(&file_with_port(2222), &CliOverrides::default(), None, &log).unwrap();
        assert_eq!(cfg.ssh_port, 2222);
    }

    #[test]
    fn cli_flag_overrides_config_file() {
        let log = TestLog::default();
        let cli = CliOverrides {
            ssh_port: Some(3333),
            ..CliOverrides::default()
        };
        let cfg = resolve(&file_with_port(2222), &cli, None, &log).unwrap();
        assert_eq!(cfg.ssh_port, 3333);
    }

    #[test]
    fn interactive_answer_used_when_no_higher_layer() {
        let log = TestLog::default();
        let prompter = ScriptedPrompter {
            port: Some(2200),
            ..ScriptedPrompter::default()
        };
        let cfg = resolve(
            &FileConfig::default(),
            &CliOverrides::default(),
            Some(&prompter),
            &log,
        )
        .unwrap();
        assert_eq!(cfg.ssh_port, 2200);
    }

    #[test]
    fn config_file_outranks_interactive_answer() {
        let log = TestLog::default();
        let prompter = ScriptedPrompter {
            port: Some(2200),
            ..ScriptedPrompter::default()
        };
        let cfg = resolve(
            &file_with_port(2222),
            &CliOverrides::default(),
            Some(&prompter),
            &log,
        )
        .unwrap();
        assert_eq!(cfg.ssh_port, 2222, "file value must not be prompted over");
        assert_eq!(
            prompter.calls.get(),
            1,
            "only the key-action prompt should fire"
        );
    }

    #[test]
    fn assume_yes_suppresses_prompts() {
        let log = TestLog::default();
        let prompter = ScriptedPrompter {
            port: Some(2200),
            ..ScriptedPrompter::default()
        };
        let cli = CliOverrides {
            assume_yes: true,
            ..CliOverrides::default()
        };
        let cfg = resolve(&FileConfig::default(), &cli, Some(&prompter), &log).unwrap();
        assert_eq!(cfg.ssh_port, 22, "defaults used under -y");
        assert_eq!(prompter.calls.get(), 0, "no prompts under -y");
        assert!(!cfg.prompt_for_confirmation);
    }

    #[test]
    fn non_interactive_prints_resolved_values() {
        let log = TestLog::default();
        let _ = resolve(&FileConfig::default(), &CliOverrides::default(), None, &log).unwrap();
        let lines = log.lines.lock().unwrap();
        assert!(
            lines.iter().any(|l| l.contains("ssh port: 22")),
            "resolved port must be printed: {lines:?}"
        );
        assert!(lines.iter().any(|l| l.contains("ssh key action: generate")));
    }

    #[test]
    fn file_warnings_are_logged() {
        let log = TestLog::default();
        let file = FileConfig {
            warnings: vec!["'ssh.port' is not a non-negative integer".to_string()],
            ..FileConfig::default()
        };
        let _ = resolve(&file, &CliOverrides::default(), None, &log).unwrap();
        let lines = log.lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.starts_with("warn:")));
    }

    #[test]
    fn add_action_prompts_for_missing_key() {
        let log = TestLog::default();
        let prompter = ScriptedPrompter {
            key_action: Some(SshKeyAction::Add),
            public_key: Some("ssh-ed25519 AAA alice".to_string()),
            ..ScriptedPrompter::default()
        };
        let cfg = resolve(
            &FileConfig::default(),
            &CliOverrides::default(),
            Some(&prompter),
            &log,
        )
        .unwrap();
        assert_eq!(cfg.ssh_key_action, SshKeyAction::Add);
        assert_eq!(cfg.ssh_public_keys, ["ssh-ed25519 AAA alice"]);
    }

    #[test]
    fn cli_keys_override_prompt() {
        let log = TestLog::default();
        let cli = CliOverrides {
            ssh_key_action: Some(SshKeyAction::Add),
            ssh_public_keys: vec!["ssh-ed25519 BBB bob".to_string()],
            ..CliOverrides::default()
        };
        let cfg = resolve(&FileConfig::default(), &cli, None, &log).unwrap();
        assert_eq!(cfg.ssh_public_keys, ["ssh-ed25519 BBB bob"]);
    }

    #[test]
    fn base64_round_trip() {
        let cfg = defaults::resolved();
        let encoded = cfg.to_base64().unwrap();
        let decoded = ResolvedConfig::from_base64(&encoded).unwrap();
        assert_eq!(cfg, decoded);
    }

    #[test]
    fn from_base64_rejects_garbage() {
        assert!(ResolvedConfig::from_base64("not base64 at all!!").is_err());
    }

    #[test]
    fn toggle_helpers_default_to_disabled_for_unknown_names() {
        let cfg = defaults::resolved();
        assert!(cfg.tool_enabled("ripgrep"));
        assert!(!cfg.tool_enabled("no-such-tool"));
        assert!(!cfg.package_enabled("no-such-package"));
        assert!(!cfg.editor_enabled("no-such-editor"));
    }
}
