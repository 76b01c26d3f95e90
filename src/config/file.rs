//! JSON configuration file: the second layer of resolution.
//!
//! Parsing is strict about syntax (an unparseable file is a fatal config
//! error) but lenient about values: a wrongly-typed value is collected as a
//! warning and ignored, never clobbering the prior layer. Unknown keys are
//! ignored. Every field is optional — absence preserves the layer below.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use super::{MissingKeyPolicy, ResolvedConfig, SshKeyAction};
use crate::error::ConfigError;

/// Values present and well-formed in the config file.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// `prompts.confirm_before_apply`
    pub prompt_for_confirmation: Option<bool>,
    /// `prompts.missing_key_policy`
    pub missing_key_policy: Option<MissingKeyPolicy>,
    /// `ssh.port`
    pub ssh_port: Option<u16>,
    /// `ssh.key_action`
    pub ssh_key_action: Option<SshKeyAction>,
    /// `ssh.public_keys`
    pub ssh_public_keys: Option<Vec<String>>,
    /// `installation.skip_package_update`
    pub skip_package_update: Option<bool>,
    /// `installation.skip_shell_setup`
    pub skip_shell_setup: Option<bool>,
    /// `installation.skip_mcp_setup`
    pub skip_mcp_setup: Option<bool>,
    /// `installation.unit_timeout_secs`
    pub unit_timeout_secs: Option<u64>,
    /// `packages.*`
    pub packages: BTreeMap<String, bool>,
    /// `cli_tools.*`
    pub cli_tools: BTreeMap<String, bool>,
    /// `mcp_servers.*`
    pub mcp_servers: BTreeMap<String, bool>,
    /// `editors.*`
    pub editors: BTreeMap<String, bool>,
    /// Diagnostics for ignored malformed values, logged by the resolver.
    pub warnings: Vec<String>,
}

impl FileConfig {
    /// Load the config file at `path`. A missing file yields an empty layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not
    /// valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse config content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for syntactically invalid JSON.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::from_value(&value))
    }

    /// Extract known keys from a parsed document, collecting warnings for
    /// wrongly-typed values.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut cfg = Self::default();
        let Some(root) = value.as_object() else {
            cfg.warnings
                .push("config root is not an object; ignoring file".to_string());
            return cfg;
        };

        if let Some(prompts) = section(root, "prompts", &mut cfg.warnings) {
            cfg.prompt_for_confirmation =
                bool_key(prompts, "prompts.confirm_before_apply", "confirm_before_apply", &mut cfg.warnings);
            cfg.missing_key_policy = enum_key(
                prompts,
                "prompts.missing_key_policy",
                "missing_key_policy",
                &mut cfg.warnings,
            );
        }

        if let Some(ssh) = section(root, "ssh", &mut cfg.warnings) {
            cfg.ssh_port = port_key(ssh, "ssh.port", "port", &mut cfg.warnings);
            cfg.ssh_key_action =
                enum_key(ssh, "ssh.key_action", "key_action", &mut cfg.warnings);
            cfg.ssh_public_keys =
                string_list_key(ssh, "ssh.public_keys", "public_keys", &mut cfg.warnings);
        }

        if let Some(installation) = section(root, "installation", &mut cfg.warnings) {
            cfg.skip_package_update = bool_key(
                installation,
                "installation.skip_package_update",
                "skip_package_update",
                &mut cfg.warnings,
            );
            cfg.skip_shell_setup = bool_key(
                installation,
                "installation.skip_shell_setup",
                "skip_shell_setup",
                &mut cfg.warnings,
            );
            cfg.skip_mcp_setup = bool_key(
                installation,
                "installation.skip_mcp_setup",
                "skip_mcp_setup",
                &mut cfg.warnings,
            );
            cfg.unit_timeout_secs = u64_key(
                installation,
                "installation.unit_timeout_secs",
                "unit_timeout_secs",
                &mut cfg.warnings,
            );
        }

        cfg.packages = toggles(root, "packages", &mut cfg.warnings);
        cfg.cli_tools = toggles(root, "cli_tools", &mut cfg.warnings);
        cfg.mcp_servers = toggles(root, "mcp_servers", &mut cfg.warnings);
        cfg.editors = toggles(root, "editors", &mut cfg.warnings);
        cfg
    }

    /// Overlay this layer onto `cfg`: only present values override.
    pub fn overlay(&self, cfg: &mut ResolvedConfig) {
        if let Some(v) = self.prompt_for_confirmation {
            cfg.prompt_for_confirmation = v;
        }
        if let Some(v) = self.missing_key_policy {
            cfg.missing_key_policy = v;
        }
        if let Some(v) = self.ssh_port {
            cfg.ssh_port = v;
        }
        if let Some(v) = self.ssh_key_action {
            cfg.ssh_key_action = v;
        }
        if let Some(v) = &self.ssh_public_keys {
            cfg.ssh_public_keys.clone_from(v);
        }
        if let Some(v) = self.skip_package_update {
            cfg.skip_package_update = v;
        }
        if let Some(v) = self.skip_shell_setup {
            cfg.skip_shell_setup = v;
        }
        if let Some(v) = self.skip_mcp_setup {
            cfg.skip_mcp_setup = v;
        }
        if let Some(v) = self.unit_timeout_secs {
            cfg.unit_timeout_secs = v;
        }
        for (name, enabled) in &self.packages {
            cfg.packages.insert(name.clone(), *enabled);
        }
        for (name, enabled) in &self.cli_tools {
            cfg.cli_tools.insert(name.clone(), *enabled);
        }
        for (name, enabled) in &self.mcp_servers {
            cfg.mcp_servers.insert(name.clone(), *enabled);
        }
        for (name, enabled) in &self.editors {
            cfg.editors.insert(name.clone(), *enabled);
        }
    }
}

type JsonMap = serde_json::Map<String, Value>;

fn section<'a>(root: &'a JsonMap, name: &str, warnings: &mut Vec<String>) -> Option<&'a JsonMap> {
    match root.get(name) {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            warnings.push(format!("'{name}' is not an object; ignoring section"));
            None
        }
    }
}

fn bool_key(map: &JsonMap, label: &str, key: &str, warnings: &mut Vec<String>) -> Option<bool> {
    match map.get(key) {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            warnings.push(format!("'{label}' is not a boolean (got {other}); ignoring"));
            None
        }
    }
}

fn u64_key(map: &JsonMap, label: &str, key: &str, warnings: &mut Vec<String>) -> Option<u64> {
    match map.get(key) {
        None => None,
        Some(Value::Number(n)) if n.as_u64().is_some() => n.as_u64(),
        Some(other) => {
            warnings.push(format!("'{label}' is not a non-negative integer (got {other}); ignoring"));
            None
        }
    }
}

fn port_key(map: &JsonMap, label: &str, key: &str, warnings: &mut Vec<String>) -> Option<u16> {
    let value = u64_key(map, label, key, warnings)?;
    match u16::try_from(value) {
        Ok(port) => Some(port),
        Err(_) => {
            warnings.push(format!("'{label}' is out of port range (got {value}); ignoring"));
            None
        }
    }
}

fn enum_key<T: serde::de::DeserializeOwned>(
    map: &JsonMap,
    label: &str,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warnings.push(format!("'{label}' has an unrecognised value (got {value}); ignoring"));
            None
        }
    }
}

fn string_list_key(
    map: &JsonMap,
    label: &str,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<Vec<String>> {
    match map.get(key) {
        None => None,
        Some(Value::Array(items)) => {
            let mut out = Vec::new();
            for item in items {
                if let Value::String(s) = item {
                    out.push(s.clone());
                } else {
                    warnings.push(format!("'{label}' contains a non-string entry ({item}); ignoring it"));
                }
            }
            Some(out)
        }
        Some(other) => {
            warnings.push(format!("'{label}' is not an array (got {other}); ignoring"));
            None
        }
    }
}

fn toggles(root: &JsonMap, name: &str, warnings: &mut Vec<String>) -> BTreeMap<String, bool> {
    let mut out = BTreeMap::new();
    if let Some(map) = section(root, name, warnings) {
        for (key, value) in map {
            if let Value::Bool(b) = value {
                out.insert(key.clone(), *b);
            } else {
                warnings.push(format!("'{name}.{key}' is not a boolean (got {value}); ignoring"));
            }
        }
    }
    out
}
