//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{CommandFactory as _, Parser, Subcommand};

use crate::config::SshKeyAction;

/// Top-level CLI entry point for the provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    about = "Idempotent workstation provisioning engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge the local machine to the declared state
    Apply(ApplyOpts),
    /// Run the same convergence on a remote host over SSH
    Remote(RemoteOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Flags that feed the configuration resolver, shared by `apply` and `remote`.
#[derive(Parser, Debug, Clone, Default)]
pub struct ResolveOpts {
    /// Alternate configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Never prompt; take configured or default values
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,

    /// SSH daemon port recorded in the resolved configuration
    #[arg(long)]
    pub port: Option<u16>,

    /// What to do about SSH keys
    #[arg(long, value_enum)]
    pub ssh_key_action: Option<SshKeyAction>,

    /// Public key to register in authorized_keys (repeatable)
    #[arg(long = "ssh-public-key")]
    pub ssh_public_keys: Vec<String>,
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ApplyOpts {
    #[command(flatten)]
    pub resolve: ResolveOpts,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Skip specific units
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only specific units
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Pre-resolved configuration as base64 JSON (set by remote mode)
    #[arg(long, hide = true)]
    pub resolved: Option<String>,
}

/// Options for the `remote` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoteOpts {
    #[command(flatten)]
    pub resolve: ResolveOpts,

    /// Remote host name or address
    #[arg(long)]
    pub host: String,

    /// Remote user (defaults to the local $USER)
    #[arg(long)]
    pub user: Option<String>,

    /// SSH identity file
    #[arg(short = 'i', long)]
    pub identity: Option<PathBuf>,

    /// Preview changes on the remote host without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Print completions for the given shell to stdout.
pub fn print_completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply() {
        let cli = Cli::parse_from(["provision", "apply"]);
        assert!(matches!(cli.command, Command::Apply(_)));
    }

    #[test]
    fn parse_apply_dry_run() {
        let cli = Cli::parse_from(["provision", "apply", "--dry-run"]);
        if let Command::Apply(opts) = cli.command {
            assert!(opts.dry_run);
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_dry_run_short() {
        let cli = Cli::parse_from(["provision", "apply", "-d"]);
        if let Command::Apply(opts) = cli.command {
            assert!(opts.dry_run);
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_assume_yes() {
        let cli = Cli::parse_from(["provision", "apply", "-y"]);
        if let Command::Apply(opts) = cli.command {
            assert!(opts.resolve.assume_yes);
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_port() {
        let cli = Cli::parse_from(["provision", "apply", "--port", "3333"]);
        if let Command::Apply(opts) = cli.command {
            assert_eq!(opts.resolve.port, Some(3333));
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_key_action() {
        let cli = Cli::parse_from(["provision", "apply", "--ssh-key-action", "generate"]);
        if let Command::Apply(opts) = cli.command {
            assert_eq!(opts.resolve.ssh_key_action, Some(SshKeyAction::Generate));
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_invalid_key_action_fails() {
        let result = Cli::try_parse_from(["provision", "apply", "--ssh-key-action", "rotate"]);
        assert!(result.is_err(), "invalid key action must be a parse error");
    }

    #[test]
    fn parse_apply_repeatable_public_keys() {
        let cli = Cli::parse_from([
            "provision",
            "apply",
            "--ssh-public-key",
            "ssh-ed25519 AAA alice",
            "--ssh-public-key",
            "ssh-ed25519 BBB bob",
        ]);
        if let Command::Apply(opts) = cli.command {
            assert_eq!(opts.resolve.ssh_public_keys.len(), 2);
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_skip_units() {
        let cli = Cli::parse_from(["provision", "apply", "--skip", "cli-tools,motd"]);
        if let Command::Apply(opts) = cli.command {
            assert_eq!(opts.skip, vec!["cli-tools", "motd"]);
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_apply_only_units() {
        let cli = Cli::parse_from(["provision", "apply", "--only", "ssh-keys"]);
        if let Command::Apply(opts) = cli.command {
            assert_eq!(opts.only, vec!["ssh-keys"]);
        } else {
            panic!("expected Apply command");
        }
    }

    #[test]
    fn parse_remote_requires_host() {
        let result = Cli::try_parse_from(["provision", "remote"]);
        assert!(result.is_err(), "remote without --host must fail");
    }

    #[test]
    fn parse_remote_with_host_and_identity() {
        let cli = Cli::parse_from([
            "provision",
            "remote",
            "--host",
            "server1",
            "--user",
            "deploy",
            "-i",
            "/home/me/.ssh/id_ed25519",
        ]);
        if let Command::Remote(opts) = cli.command {
            assert_eq!(opts.host, "server1");
            assert_eq!(opts.user.as_deref(), Some("deploy"));
            assert_eq!(
                opts.identity,
                Some(PathBuf::from("/home/me/.ssh/id_ed25519"))
            );
        } else {
            panic!("expected Remote command");
        }
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["provision", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["provision", "-v", "apply"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_hidden_resolved_flag() {
        let cli = Cli::parse_from(["provision", "apply", "--resolved", "eyJ4IjoxfQ=="]);
        if let Command::Apply(opts) = cli.command {
            assert_eq!(opts.resolved.as_deref(), Some("eyJ4IjoxfQ=="));
        } else {
            panic!("expected Apply command");
        }
    }
}
