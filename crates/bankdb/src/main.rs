//! Operational CLI for the bankdb local development environment.
//!
//! The binary wraps the DynamoDB control-plane and data-plane calls needed
//! to stand up a local instance: creating the table set from a manifest and
//! batch-loading the seed fixtures into it.

use clap::Parser;

mod dynamodb;
mod prelude;

/// Operational tasks for the bankdb development environment
#[derive(Debug, Parser)]
#[command(name = "bankdb")]
#[command(about = "Provision and seed the bankdb DynamoDB tables", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: Global,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Silence the command output
    #[clap(long, global = true)]
    pub silent: bool,

    /// Enable verbose output
    #[clap(long, global = true)]
    pub verbose: bool,
}

impl Global {
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage the local DynamoDB tables
    Dynamodb(dynamodb::DynamodbCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dynamodb(dynamodb_cmd) => {
            dynamodb::run(dynamodb_cmd, cli.global).await?;
        }
    }

    Ok(())
}
