use anyhow::Result;
use clap::{CommandFactory, Parser};

use agentcost::cli::Cli;
use agentcost::{commands, init_tracing};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => commands::run(cmd, cli.config.as_deref()),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
