//! DynamoDB provisioning and seeding commands.

mod client;
mod error;
mod fixture;
mod manifest;
mod provision;
mod seed;
mod store;

pub use error::{DynamodbError, Result};

use std::path::PathBuf;
use std::time::Duration;

use dialoguer::Confirm;

use crate::prelude::*;

/// DynamoDB table management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Create the bankdb tables from the manifest.
    Provision(ProvisionCommand),

    /// Load the seed fixtures into the tables.
    Seed(SeedCommand),
}

/// Create the bankdb tables from the manifest.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Create the bankdb DynamoDB tables from a JSON manifest.

Each table spec in the manifest is issued as one create-table call. A table
that already exists is skipped with a warning; any other error aborts the
run and leaves the tables created so far in place.

Environment variables (overridden by the matching --flags):
  AWS_ENDPOINT_URL        - DynamoDB endpoint (defaults to http://localhost:8000)
  AWS_REGION              - AWS region (defaults to us-east-1)
  AWS_ACCESS_KEY_ID       - Access key id (defaults to 'local')
  AWS_SECRET_ACCESS_KEY   - Secret access key (defaults to 'local')")]
pub struct ProvisionCommand {
    /// Path to the table manifest.
    #[arg(long, default_value = "tables/tables.json")]
    pub manifest: PathBuf,

    /// Wait until every created table reports ACTIVE.
    #[arg(long)]
    pub wait: bool,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Load the seed fixtures into the tables.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Batch-load the bankdb seed fixtures into DynamoDB.

The seven fixture files are loaded in a fixed order. Items the store
reports as unprocessed are resubmitted with exponential backoff; a table
that keeps failing is logged and skipped, and the command still exits
zero. Run `provision` first.

Environment variables (overridden by the matching --flags):
  AWS_ENDPOINT_URL        - DynamoDB endpoint (defaults to http://localhost:8000)
  AWS_REGION              - AWS region (defaults to us-east-1)
  AWS_ACCESS_KEY_ID       - Access key id (defaults to 'local')
  AWS_SECRET_ACCESS_KEY   - Secret access key (defaults to 'local')")]
pub struct SeedCommand {
    /// Directory holding the seed fixture files.
    #[arg(long, default_value = "tables")]
    pub data_dir: PathBuf,

    /// Maximum batch-write attempts per batch, including the first.
    #[arg(long, default_value = "8")]
    pub max_attempts: u32,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Connection settings for the local DynamoDB instance, shared by both
/// commands. Flags take precedence over the environment variables.
#[derive(Debug, Clone, clap::Args)]
pub struct ConnectionArgs {
    /// Endpoint URL of the local DynamoDB instance.
    #[arg(long, env = "AWS_ENDPOINT_URL", default_value = "http://localhost:8000")]
    pub endpoint_url: String,

    /// AWS region.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Access key id. DynamoDB local accepts any non-empty pair.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", default_value = "local")]
    pub access_key_id: String,

    /// Secret access key.
    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        default_value = "local",
        hide_env_values = true
    )]
    pub secret_access_key: String,
}

impl ConnectionArgs {
    fn to_aws_config(&self) -> client::AwsConfig {
        client::AwsConfig {
            endpoint_url: self.endpoint_url.clone(),
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
        }
    }
}

/// Main entry point for the dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Provision(provision_cmd) => run_provision(provision_cmd, &global).await,
        DynamodbAction::Seed(seed_cmd) => run_seed(seed_cmd, &global).await,
    }
}

async fn run_provision(cmd: ProvisionCommand, global: &crate::Global) -> Result<()> {
    let aws_config = cmd.connection.to_aws_config();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        if global.is_verbose() {
            aprintln!("{} {}", p_b("Manifest:"), cmd.manifest.display());
        }
        aprintln!();
    }

    let specs = manifest::load_manifest(&cmd.manifest)?;

    if !global.is_silent() {
        aprintln!("{}", p_c("Tables to provision:"));
        for spec in &specs {
            aprintln!("  + {}", spec.name);
        }
        aprintln!();
    }

    if !cmd.force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Create {} tables?", specs.len()))
            .default(true)
            .interact()
            .map_err(|e| DynamodbError::Prompt(e.to_string()))?;

        if !confirmed {
            return Err(DynamodbError::UserCancelled);
        }
    }

    let dynamo_client = client::create_client(&aws_config).await?;
    let dynamo_store = store::DynamoDbStore::new(dynamo_client);

    let summary = provision::provision_tables(&dynamo_store, &specs, global.is_silent()).await?;

    if cmd.wait && !summary.created.is_empty() {
        if !global.is_silent() {
            aprintln!("{}", p_b("Waiting for tables to become active..."));
        }
        provision::wait_for_tables_active(
            &dynamo_store,
            &summary.created,
            Duration::from_secs(2),
        )
        .await?;
    }

    if !global.is_silent() {
        aprintln!(
            "{} {} created, {} already existing.",
            p_g("Done:"),
            summary.created.len(),
            summary.already_existing.len()
        );
    }

    Ok(())
}

async fn run_seed(cmd: SeedCommand, global: &crate::Global) -> Result<()> {
    let aws_config = cmd.connection.to_aws_config();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Data dir:"), cmd.data_dir.display());
        aprintln!();
    }

    if !cmd.force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Load seed fixtures from '{}'?",
                cmd.data_dir.display()
            ))
            .default(true)
            .interact()
            .map_err(|e| DynamodbError::Prompt(e.to_string()))?;

        if !confirmed {
            return Err(DynamodbError::UserCancelled);
        }
    }

    let dynamo_client = client::create_client(&aws_config).await?;
    let dynamo_store = store::DynamoDbStore::new(dynamo_client);
    let policy = seed::RetryPolicy::default().with_max_attempts(cmd.max_attempts);

    if global.is_verbose() && !global.is_silent() {
        aprintln!(
            "{} up to {} attempts per batch",
            p_b("Retry policy:"),
            policy.max_attempts
        );
    }

    let summary =
        seed::load_data_files(&dynamo_store, &cmd.data_dir, &policy, global.is_silent()).await;

    // Per-table failures are logged above but never surface in the exit
    // code; one bad table must not block the others.
    if !global.is_silent() {
        if summary.failures > 0 {
            aprintln!(
                "{} {} tables loaded ({} items), {} failed.",
                p_y("Done:"),
                summary.tables_loaded,
                summary.items_written,
                summary.failures
            );
        } else {
            aprintln!(
                "{} {} tables loaded ({} items).",
                p_g("Done:"),
                summary.tables_loaded,
                summary.items_written
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_connection_flags_reach_the_aws_config() {
        let cmd = ProvisionCommand::try_parse_from([
            "provision",
            "--endpoint-url",
            "http://localhost:9000",
            "--region",
            "us-west-2",
            "--access-key-id",
            "dev",
            "--secret-access-key",
            "dev-secret",
            "--force",
        ])
        .unwrap();

        let config = cmd.connection.to_aws_config();
        assert_eq!(config.endpoint_url, "http://localhost:9000");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.access_key_id, "dev");
        assert_eq!(config.secret_access_key, "dev-secret");
    }

    #[test]
    fn test_seed_command_exposes_the_same_connection_flags() {
        let cmd = SeedCommand::try_parse_from([
            "seed",
            "--endpoint-url",
            "http://localhost:9000",
            "--max-attempts",
            "3",
        ])
        .unwrap();

        assert_eq!(cmd.connection.endpoint_url, "http://localhost:9000");
        assert_eq!(cmd.max_attempts, 3);
        assert_eq!(cmd.data_dir, PathBuf::from("tables"));
    }
}
