//! The declarative unit catalog.
use super::{Unit, cli_tools, mcp_config, motd, packages, shell_setup, ssh_keys, sudoers, toolchains};

/// The complete unit set, in declaration order.
///
/// Declaration order is execution order and is dependency-respecting: every
/// unit appears after all units it depends on. The engine verifies the
/// invariant at runtime via [`super::run_units`]'s prerequisite tracking;
/// the integration tests assert it structurally.
#[must_use]
pub fn all_units() -> Vec<Box<dyn Unit>> {
    vec![
        Box::new(packages::PackageUpdate),
        Box::new(packages::CorePackages),
        Box::new(toolchains::RustToolchain),
        Box::new(toolchains::NodeVersionManager),
        Box::new(toolchains::UvInstaller),
        Box::new(toolchains::UvTool::ruff()),
        Box::new(toolchains::UvTool::ty()),
        Box::new(cli_tools::InstallCliTools),
        Box::new(shell_setup::ShellSetup),
        Box::new(ssh_keys::SshKeys),
        Box::new(sudoers::SudoersDropIn),
        Box::new(motd::MotdGreeting),
        Box::new(mcp_config::McpConfig),
        Box::new(mcp_config::EditorLinks),
    ]
}

/// Filter units by the `--skip` and `--only` CLI flags.
///
/// Matching is case-insensitive on name substrings; `--only` wins when both
/// are given.
#[must_use]
pub fn filter_units(
    units: Vec<Box<dyn Unit>>,
    skip: &[String],
    only: &[String],
) -> Vec<Box<dyn Unit>> {
    units
        .into_iter()
        .filter(|unit| {
            let name = unit.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            if !skip.is_empty() {
                return !skip.iter().any(|s| name.contains(&s.to_lowercase()));
            }
            true
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_fourteen_units() {
        assert_eq!(all_units().len(), 14);
    }

    #[test]
    fn skip_filter_excludes_matching_units() {
        let filtered = filter_units(all_units(), &["mcp".to_string()], &[]);
        assert!(filtered.iter().all(|u| !u.name().contains("mcp")));
        assert!(filtered.len() < all_units().len());
    }

    #[test]
    fn only_filter_keeps_matching_units() {
        let filtered = filter_units(all_units(), &[], &["ssh-keys".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name(), "ssh-keys");
    }

    #[test]
    fn only_wins_over_skip() {
        let filtered = filter_units(
            all_units(),
            &["ssh-keys".to_string()],
            &["ssh-keys".to_string()],
        );
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let filtered = filter_units(all_units(), &[], &["SSH-Keys".to_string()]);
        assert_eq!(filtered.len(), 1);
    }
}
