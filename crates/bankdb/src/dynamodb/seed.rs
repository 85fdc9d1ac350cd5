//! Seed data loading flow.
//!
//! Fixture files are loaded in a fixed order; each table's items are
//! chunked, submitted, and any unprocessed subset is resubmitted under a
//! bounded retry policy. A failure is terminal for its table only — the
//! loader always finishes the full file list.

use std::path::Path;
use std::time::Duration;

use crate::prelude::*;

use super::error::{DynamodbError, Result};
use super::fixture::{self, Item};
use super::store::BatchWriter;

/// Fixture files, in load order.
pub const DATA_FILES: [&str; 7] = [
    "account_batch.json",
    "borrower_batch.json",
    "branch_batch.json",
    "customer_batch.json",
    "depositor_batch.json",
    "loan_batch.json",
    "user_batch.json",
];

/// Store-imposed maximum number of items per batch-write call.
pub const MAX_BATCH_SIZE: usize = 25;

/// Bounded retry policy for unprocessed batch-write items.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum batch-write calls per batch, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Exponential backoff, capped. `attempt` counts completed calls,
    /// starting at 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay)
    }
}

/// What a full seed run did.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub tables_loaded: usize,
    pub items_written: usize,
    pub failures: usize,
}

/// Loads every fixture file under `data_dir`, best-effort per table.
pub async fn load_data_files(
    writer: &dyn BatchWriter,
    data_dir: &Path,
    policy: &RetryPolicy,
    silent: bool,
) -> LoadSummary {
    let mut summary = LoadSummary::default();

    for file_name in DATA_FILES {
        let path = data_dir.join(file_name);
        let tables = match fixture::load_data_file(&path) {
            Ok(tables) => tables,
            Err(err) => {
                aprintln!(
                    "{}",
                    p_r(&format!("Skipping {}: {err}", path.display()))
                );
                summary.failures += 1;
                continue;
            }
        };

        for mut table in tables {
            fixture::attach_synthetic_ids(&table.table_name, &mut table.items);

            if !silent {
                aprintln!(
                    "{} {} items into table '{}'...",
                    p_b("Inserting"),
                    table.items.len(),
                    table.table_name
                );
            }

            match write_table_items(writer, &table.table_name, table.items, policy, silent).await
            {
                Ok(written) => {
                    summary.tables_loaded += 1;
                    summary.items_written += written;
                }
                Err(err) => {
                    aprintln!(
                        "{}",
                        p_r(&format!(
                            "Failed to load table '{}': {err}",
                            table.table_name
                        ))
                    );
                    summary.failures += 1;
                }
            }
        }
    }

    summary
}

/// Writes one table's items in order, chunked to the store's batch limit.
pub async fn write_table_items(
    writer: &dyn BatchWriter,
    table_name: &str,
    items: Vec<Item>,
    policy: &RetryPolicy,
    silent: bool,
) -> Result<usize> {
    let mut written = 0;
    for chunk in items.chunks(MAX_BATCH_SIZE) {
        written += write_batch(writer, table_name, chunk.to_vec(), policy, silent).await?;
    }
    Ok(written)
}

/// Submits one batch, resubmitting exactly the unprocessed subset until it
/// drains or the retry budget runs out.
async fn write_batch(
    writer: &dyn BatchWriter,
    table_name: &str,
    batch: Vec<Item>,
    policy: &RetryPolicy,
    silent: bool,
) -> Result<usize> {
    let total = batch.len();
    let mut pending = batch;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        pending = writer.batch_write(table_name, pending).await?;
        if pending.is_empty() {
            return Ok(total);
        }
        if attempts >= policy.max_attempts {
            return Err(DynamodbError::RetriesExhausted {
                table_name: table_name.to_string(),
                attempts,
                remaining: pending.len(),
            });
        }
        if !silent {
            aprintln!(
                "  {}",
                p_y(&format!(
                    "Resubmitting {} unprocessed items...",
                    pending.len()
                ))
            );
        }
        tokio::time::sleep(policy.delay_for(attempts)).await;
    }
}
