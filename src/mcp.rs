//! MCP server descriptors and the merged-config builder.
//!
//! Each descriptor is a subprocess specification (command + args + env) that
//! an AI-assisted editor launches to gain a capability. The builder filters
//! the static catalog by toggle, substitutes the home-directory placeholder,
//! and merges everything into one JSON document keyed by server name.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the real home directory at build time.
///
/// Substitution is a single non-recursive pass per field; it terminates even
/// if the substituted value were to contain the placeholder text (it cannot,
/// since it is a real filesystem path).
pub const HOME_PLACEHOLDER: &str = "__HOME__";

/// One tool-integration server: the subprocess an editor launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Executable to launch.
    pub command: String,
    /// Arguments, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables for the subprocess.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ServerDescriptor {
    fn desc(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            env: BTreeMap::new(),
        }
    }

    fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Return a copy with [`HOME_PLACEHOLDER`] replaced by `home` in the
    /// command, every argument, and every env value.
    #[must_use]
    pub fn substituted(&self, home: &str) -> Self {
        Self {
            command: self.command.replace(HOME_PLACEHOLDER, home),
            args: self
                .args
                .iter()
                .map(|a| a.replace(HOME_PLACEHOLDER, home))
                .collect(),
            env: self
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.replace(HOME_PLACEHOLDER, home)))
                .collect(),
        }
    }
}

/// The static server catalog, keyed by server name.
#[must_use]
pub fn catalog() -> BTreeMap<&'static str, ServerDescriptor> {
    let mut servers = BTreeMap::new();
    servers.insert(
        "filesystem",
        ServerDescriptor::desc(
            "npx",
            &["-y", "@modelcontextprotocol/server-filesystem", HOME_PLACEHOLDER],
        ),
    );
    servers.insert(
        "fetch",
        ServerDescriptor::desc("uvx", &["mcp-server-fetch"]),
    );
    servers.insert(
        "git",
        ServerDescriptor::desc("uvx", &["mcp-server-git"]),
    );
    servers.insert(
        "github",
        ServerDescriptor::desc("npx", &["-y", "@modelcontextprotocol/server-github"])
            .with_env("GITHUB_PERSONAL_ACCESS_TOKEN", ""),
    );
    servers.insert(
        "memory",
        ServerDescriptor::desc("npx", &["-y", "@modelcontextprotocol/server-memory"]).with_env(
            "MEMORY_FILE_PATH",
            "__HOME__/.config/mcp/memory.jsonl",
        ),
    );
    servers.insert(
        "sequential-thinking",
        ServerDescriptor::desc(
            "npx",
            &["-y", "@modelcontextprotocol/server-sequential-thinking"],
        ),
    );
    servers.insert(
        "time",
        ServerDescriptor::desc("uvx", &["mcp-server-time"]),
    );
    servers.insert(
        "sqlite",
        ServerDescriptor::desc(
            "uvx",
            &[
                "mcp-server-sqlite",
                "--db-path",
                "__HOME__/.local/share/mcp/sqlite.db",
            ],
        ),
    );
    servers.insert(
        "puppeteer",
        ServerDescriptor::desc("npx", &["-y", "@modelcontextprotocol/server-puppeteer"]),
    );
    servers.insert(
        "brave-search",
        ServerDescriptor::desc("npx", &["-y", "@modelcontextprotocol/server-brave-search"])
            .with_env("BRAVE_API_KEY", ""),
    );
    servers.insert(
        "jupyter",
        ServerDescriptor::desc("uvx", &["jupyter-mcp-server"]),
    );
    servers
}

/// Build the merged document: filter by toggle, substitute the placeholder,
/// and key by server name under `mcpServers`.
#[must_use]
pub fn build(
    descriptors: &BTreeMap<&'static str, ServerDescriptor>,
    toggles: &BTreeMap<String, bool>,
    home: &str,
) -> serde_json::Value {
    let mut servers = serde_json::Map::new();
    for (name, descriptor) in descriptors {
        if !toggles.get(*name).copied().unwrap_or(false) {
            continue;
        }
        let value = serde_json::to_value(descriptor.substituted(home))
            .unwrap_or(serde_json::Value::Null);
        servers.insert((*name).to_string(), value);
    }
    serde_json::json!({ "mcpServers": servers })
}

/// Render a document for writing to disk: pretty JSON with trailing newline.
///
/// Deterministic output (BTreeMap ordering) so regenerating an unchanged
/// configuration is byte-identical.
#[must_use]
pub fn render(doc: &serde_json::Value) -> String {
    let mut out = serde_json::to_string_pretty(doc).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}
