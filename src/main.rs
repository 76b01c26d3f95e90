use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use provision_cli::{cli, commands, logging};

#[allow(clippy::print_stdout)]
fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);

    match args.command {
        cli::Command::Apply(opts) => {
            let log = Arc::new(logging::Logger::new("apply"));
            commands::apply::run(&opts, &log)
        }
        cli::Command::Remote(opts) => {
            let log = Arc::new(logging::Logger::new("remote"));
            commands::remote::run(&opts, args.verbose, &log)
        }
        cli::Command::Completions(opts) => {
            cli::print_completions(opts.shell);
            Ok(())
        }
        cli::Command::Version => {
            let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("provision {version}");
            Ok(())
        }
    }
}
