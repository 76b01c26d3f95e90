//! Shell environment: oh-my-zsh, plugins, rc wiring, default shell.
use anyhow::Result;

use super::{Context, Gate, ProcessOpts, Unit, UnitResult};
use crate::resources::Resource;
use crate::resources::git_clone::GitClone;
use crate::resources::line::{KeyedValue, LineInFile};
use crate::resources::shell::DefaultShell;
use crate::units::process::run_resources;

const OHMYZSH_URL: &str = "https://github.com/ohmyzsh/ohmyzsh.git";
const AUTOSUGGESTIONS_URL: &str = "https://github.com/zsh-users/zsh-autosuggestions.git";
const SYNTAX_HIGHLIGHTING_URL: &str = "https://github.com/zsh-users/zsh-syntax-highlighting.git";

/// The plugin list written to `.zshrc`.
pub const PLUGINS: &[&str] = &["git", "zsh-autosuggestions", "zsh-syntax-highlighting"];

/// Install the shell framework and converge `.zshrc`.
#[derive(Debug)]
pub struct ShellSetup;

impl Unit for ShellSetup {
    fn name(&self) -> &'static str {
        "shell-setup"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["core-packages"]
    }

    fn gate(&self, ctx: &Context) -> Gate {
        if ctx.config.skip_shell_setup {
            return Gate::Disabled("disabled by configuration".to_string());
        }
        if !ctx.executor.which("zsh") {
            return Gate::Unsupported("zsh is not installed".to_string());
        }
        Gate::Run
    }

    fn run(&self, ctx: &Context) -> Result<UnitResult> {
        let omz = ctx.home.join(".oh-my-zsh");
        let plugins_dir = omz.join("custom/plugins");

        let clones = [
            GitClone::new(OHMYZSH_URL.to_string(), omz.clone()),
            GitClone::new(
                AUTOSUGGESTIONS_URL.to_string(),
                plugins_dir.join("zsh-autosuggestions"),
            ),
            GitClone::new(
                SYNTAX_HIGHLIGHTING_URL.to_string(),
                plugins_dir.join("zsh-syntax-highlighting"),
            ),
        ];
        let mut stats = run_resources(ctx, clones, &ProcessOpts::apply_all("clone").no_bail())?;

        // Order matters on first write: ZSH and the theme/plugin settings
        // must precede the framework source line.
        let rc = ctx.zshrc();
        let edits: Vec<Box<dyn Resource + Send>> = vec![
            Box::new(LineInFile::new(
                rc.clone(),
                "export ZSH=\"$HOME/.oh-my-zsh\"".to_string(),
            )),
            Box::new(KeyedValue::new(
                rc.clone(),
                "ZSH_THEME".to_string(),
                "\"robbyrussell\"".to_string(),
            )),
            Box::new(KeyedValue::list(rc.clone(), "plugins", PLUGINS)),
            Box::new(LineInFile::new(
                rc.clone(),
                "source $ZSH/oh-my-zsh.sh".to_string(),
            )),
        ];
        stats += run_resources(ctx, edits, &ProcessOpts::apply_all("write"))?;

        // chsh prompts for authentication in CI sandboxes; leave the login
        // shell alone there.
        if std::env::var_os("CI").is_none() {
            let current_shell = std::env::var("SHELL").ok();
            let chsh = DefaultShell::new("zsh".to_string(), current_shell, ctx.executor.as_ref());
            stats += run_resources(
                ctx,
                std::iter::once(chsh),
                &ProcessOpts::apply_all("configure").no_bail(),
            )?;
        }

        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::units::test_helpers::{make_apt_context, test_config};
    use std::sync::Arc;

    fn zsh_context(
        home: std::path::PathBuf,
    ) -> (Context, Arc<crate::units::test_helpers::TestLog>) {
        make_apt_context(
            test_config(),
            Arc::new(MockExecutor::default().with_program("zsh")),
            home,
        )
    }

    #[test]
    fn gate_disabled_by_toggle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.skip_shell_setup = true;
        let (ctx, _log) = make_apt_context(
            config,
            Arc::new(MockExecutor::default().with_program("zsh")),
            tmp.path().to_path_buf(),
        );
        assert!(matches!(ShellSetup.gate(&ctx), Gate::Disabled(_)));
    }

    #[test]
    fn gate_unsupported_without_zsh() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, _log) = make_apt_context(
            test_config(),
            Arc::new(MockExecutor::default()),
            tmp.path().to_path_buf(),
        );
        assert!(matches!(ShellSetup.gate(&ctx), Gate::Unsupported(_)));
    }

    #[test]
    fn depends_on_core_packages() {
        assert_eq!(ShellSetup.dependencies(), ["core-packages"]);
    }

    #[test]
    fn rc_edits_produce_expected_layout() {
        let tmp = tempfile::tempdir().unwrap();
        // Pre-seed the framework checkouts so no clone is attempted.
        for dir in [
            ".oh-my-zsh",
            ".oh-my-zsh/custom/plugins/zsh-autosuggestions",
            ".oh-my-zsh/custom/plugins/zsh-syntax-highlighting",
        ] {
            std::fs::create_dir_all(tmp.path().join(dir).join(".git")).unwrap();
        }
        let (ctx, _log) = zsh_context(tmp.path().to_path_buf());
        let result = ShellSetup.run(&ctx).unwrap();
        assert!(matches!(result, UnitResult::Ok));

        let rc = std::fs::read_to_string(ctx.zshrc()).unwrap();
        let lines: Vec<&str> = rc.lines().collect();
        assert_eq!(lines[0], "export ZSH=\"$HOME/.oh-my-zsh\"");
        assert_eq!(lines[1], "ZSH_THEME=\"robbyrussell\"");
        assert_eq!(
            lines[2],
            "plugins=(git zsh-autosuggestions zsh-syntax-highlighting)"
        );
        assert_eq!(lines[3], "source $ZSH/oh-my-zsh.sh");
    }

    #[test]
    fn rerun_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in [
            ".oh-my-zsh",
            ".oh-my-zsh/custom/plugins/zsh-autosuggestions",
            ".oh-my-zsh/custom/plugins/zsh-syntax-highlighting",
        ] {
            std::fs::create_dir_all(tmp.path().join(dir).join(".git")).unwrap();
        }
        let (ctx, _log) = zsh_context(tmp.path().to_path_buf());
        ShellSetup.run(&ctx).unwrap();
        let first = std::fs::read_to_string(ctx.zshrc()).unwrap();
        ShellSetup.run(&ctx).unwrap();
        let second = std::fs::read_to_string(ctx.zshrc()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn theme_change_updates_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in [
            ".oh-my-zsh",
            ".oh-my-zsh/custom/plugins/zsh-autosuggestions",
            ".oh-my-zsh/custom/plugins/zsh-syntax-highlighting",
        ] {
            std::fs::create_dir_all(tmp.path().join(dir).join(".git")).unwrap();
        }
        let (ctx, _log) = zsh_context(tmp.path().to_path_buf());
        std::fs::write(
            ctx.zshrc(),
            "export ZSH=\"$HOME/.oh-my-zsh\"\nZSH_THEME=\"agnoster\"\nsource $ZSH/oh-my-zsh.sh\n",
        )
        .unwrap();
        ShellSetup.run(&ctx).unwrap();
        let rc = std::fs::read_to_string(ctx.zshrc()).unwrap();
        assert!(rc.contains("ZSH_THEME=\"robbyrussell\""));
        assert!(!rc.contains("agnoster"));
        assert_eq!(
            rc.matches("ZSH_THEME").count(),
            1,
            "theme line must not duplicate"
        );
    }
}
