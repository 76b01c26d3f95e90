//! Workstation provisioning engine.
//!
//! Single-binary desired-state applier: probe the platform, resolve a layered
//! configuration (defaults → config file → prompts → CLI flags), walk a
//! declarative catalog of install units in dependency order, and converge
//! packages, language toolchains, shell environment, SSH keys, sudoers,
//! MOTD, and MCP editor-integration JSON — tolerating and reporting per-unit
//! failure. Remote mode ships the same binary and the resolved configuration
//! to another host over SSH and runs the identical engine there.
//!
//! The public API is organised into five layers:
//!
//! - **[`config`]** — layered configuration resolution into one [`config::ResolvedConfig`]
//! - **[`platform`]** — OS family / package manager / privilege probing
//! - **[`resources`]** — idempotent `check + apply` primitives (lines, files, links, …)
//! - **[`units`]** — named, dependency-ordered units of work wired to resources
//! - **[`commands`]** — top-level subcommand orchestration (`apply`, `remote`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod mcp;
pub mod platform;
pub mod remote;
pub mod resources;
pub mod units;
