use clap::Parser;
use directory_devapi::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Rollup(args) => cli::rollup::run(args).await,
    }
}
