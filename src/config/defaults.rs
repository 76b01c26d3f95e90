//! Built-in defaults: the lowest-precedence configuration layer.
use std::collections::BTreeMap;

use super::{MissingKeyPolicy, ResolvedConfig, SshKeyAction};

/// Default SSH daemon port.
pub const SSH_PORT: u16 = 22;

/// Default per-command deadline for unit child processes.
pub const UNIT_TIMEOUT_SECS: u64 = 600;

/// Language-toolchain toggles and their defaults.
pub const PACKAGES: &[(&str, bool)] = &[
    ("cargo", true),
    ("nvm", true),
    ("uv", true),
    ("ruff", true),
    ("ty", false),
];

/// CLI tool toggles and their defaults.
pub const CLI_TOOLS: &[(&str, bool)] = &[
    ("ripgrep", true),
    ("fd", true),
    ("bat", true),
    ("eza", true),
    ("fzf", true),
    ("jq", true),
    ("yq", true),
    ("htop", true),
    ("btop", false),
    ("tmux", true),
    ("neovim", true),
    ("git-delta", true),
    ("lazygit", false),
    ("gh", true),
    ("tldr", true),
    ("ncdu", true),
    ("tree", true),
    ("wget", true),
    ("rsync", true),
    ("shellcheck", true),
    ("shfmt", true),
    ("hyperfine", false),
    ("tokei", false),
    ("just", true),
    ("watchexec", false),
    ("zoxide", true),
    ("direnv", true),
    ("dust", false),
];

/// MCP server toggles and their defaults.
pub const MCP_SERVERS: &[(&str, bool)] = &[
    ("filesystem", true),
    ("fetch", true),
    ("git", true),
    ("github", true),
    ("memory", true),
    ("sequential-thinking", true),
    ("time", true),
    ("sqlite", false),
    ("puppeteer", false),
    ("brave-search", false),
    ("jupyter", false),
];

/// Editor-integration toggles and their defaults.
pub const EDITORS: &[(&str, bool)] = &[
    ("vscode", true),
    ("cursor", true),
    ("claude", true),
    ("windsurf", false),
    ("zed", false),
];

fn toggle_map(table: &[(&str, bool)]) -> BTreeMap<String, bool> {
    table
        .iter()
        .map(|(name, enabled)| ((*name).to_string(), *enabled))
        .collect()
}

/// The fully-defaulted configuration every resolution starts from.
#[must_use]
pub fn resolved() -> ResolvedConfig {
    ResolvedConfig {
        prompt_for_confirmation: true,
        ssh_port: SSH_PORT,
        ssh_key_action: SshKeyAction::Generate,
        ssh_public_keys: Vec::new(),
        missing_key_policy: MissingKeyPolicy::Warn,
        skip_package_update: false,
        skip_shell_setup: false,
        skip_mcp_setup: false,
        unit_timeout_secs: UNIT_TIMEOUT_SECS,
        packages: toggle_map(PACKAGES),
        cli_tools: toggle_map(CLI_TOOLS),
        mcp_servers: toggle_map(MCP_SERVERS),
        editors: toggle_map(EDITORS),
    }
}
