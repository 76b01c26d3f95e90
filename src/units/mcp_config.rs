//! MCP configuration: per-server documents, merged document, editor links.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Gate, ProcessOpts, Unit, UnitResult};
use crate::mcp;
use crate::resources::managed_file::ManagedFile;
use crate::resources::symlink::ClaimedSymlink;
use crate::units::process::run_resources;

/// Generate `~/.config/mcp/servers/*.json` and the merged `mcp.json`.
#[derive(Debug)]
pub struct McpConfig;

impl McpConfig {
    /// Path of the merged document.
    #[must_use]
    pub fn merged_path(ctx: &Context) -> PathBuf {
        ctx.mcp_dir().join("mcp.json")
    }
}

impl Unit for McpConfig {
    fn name(&self) -> &'static str {
        "mcp-config"
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if ctx.config.skip_mcp_setup {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if !ctx.config.mcp_servers.values().any(|enabled| *enabled) {
            return Gate::Disabled("all servers disabled".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let home = ctx.home.to_string_lossy().to_string();
        let catalog = mcp::catalog();

        let servers_dir = ctx.mcp_dir().join("servers");
        let mut files: Vec<ManagedFile<'_>> = Vec::new();
        for (name, descriptor) in &catalog {
            if !ctx.config.mcp_servers.get(*name).copied().unwrap_or(false) {
                continue;
            }
            let doc = serde_json::to_value(descriptor.substituted(&home))?;
            files.push(ManagedFile::new(
                servers_dir.join(format!("{name}.json")),
                mcp::render(&doc),
                0o644,
            ));
        }

        let merged = mcp::build(&catalog, &ctx.config.mcp_servers, &home);
        files.push(ManagedFile::new(
            Self::merged_path(ctx),
            mcp::render(&merged),
            0o644,
        ));

        // The sqlite server expects its data directory to exist.
        if ctx.config.mcp_servers.get("sqlite").copied().unwrap_or(false) && !ctx.dry_run {
            std::fs::create_dir_all(ctx.data_dir().join("mcp"))?;
        }

        run_resources(ctx, files, &ProcessOpts::apply_all("write"))
            .map(|stats| stats.finish(ctx))
    }
}

/// Editor config paths that receive a claim-once symlink to the merged
/// document. An existing file or link is never replaced, even when it
/// points somewhere else — staleness after a toggle change is reported,
/// not "fixed".
#[must_use]
pub fn editor_target(editor: &str, ctx: &Context) -> Option<PathBuf> {
    let home = &ctx.home;
    let path = match editor {
        "vscode" => {
            if ctx.platform.is_macos() {
                home.join("Library/Application Support/Code/User/mcp.json")
            } else {
                home.join(".config/Code/User/mcp.json")
            }
        }
        "cursor" => home.join(".cursor/mcp.json"),
        "claude" => home.join(".claude/mcp.json"),
        "windsurf" => home.join(".codeium/windsurf/mcp_config.json"),
        "zed" => home.join(".config/zed/mcp.json"),
        _ => return None,
    };
    Some(path)
}

/// Create claim-once symlinks from editor config paths to the merged file.
#[derive(Debug)]
pub struct EditorLinks;

impl Unit for EditorLinks {
    fn name(&self) -> &'static str {
        "editor-links"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["mcp-config"]
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if ctx.config.skip_mcp_setup {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if !ctx.config.editors.values().any(|enabled| *enabled) {
            return Gate::Disabled("all editors disabled".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let merged = McpConfig::merged_path(ctx);
        let mut links: Vec<ClaimedSymlink> = Vec::new();
        for (editor, enabled) in &ctx.config.editors {
            if !*enabled {
                continue;
            }
            match editor_target(editor, ctx) {
                Some(target) => links.push(ClaimedSymlink::new(merged.clone(), target)),
                None => ctx.log.warn(&format!("unknown editor '{editor}'")),
            }
        }
        run_resources(ctx, links, &ProcessOpts::install_missing("link"))
            .map(|stats| stats.finish(ctx))
    }
}
