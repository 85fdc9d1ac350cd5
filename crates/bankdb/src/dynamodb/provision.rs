//! Table provisioning flow.

use std::time::Duration;

use crate::prelude::*;

use super::error::{DynamodbError, Result};
use super::manifest::TableSpec;
use super::store::{CreateOutcome, TableStatus, TableStore};

/// What a provisioning run did.
#[derive(Debug, Default)]
pub struct ProvisionSummary {
    pub created: Vec<String>,
    pub already_existing: Vec<String>,
}

/// Issues one create-table call per spec, in manifest order.
///
/// An already-existing table is a warning, not a failure; any other error
/// aborts the run, leaving earlier tables in place.
pub async fn provision_tables(
    store: &dyn TableStore,
    specs: &[TableSpec],
    silent: bool,
) -> Result<ProvisionSummary> {
    let mut summary = ProvisionSummary::default();

    for spec in specs {
        if !silent {
            aprintln!("{} {}", p_b("Creating table:"), spec.name);
        }

        match store.create_table(spec).await? {
            CreateOutcome::Created => {
                if !silent {
                    aprintln!("  {}", p_g(&format!("Table '{}' created.", spec.name)));
                }
                summary.created.push(spec.name.clone());
            }
            CreateOutcome::AlreadyExists => {
                if !silent {
                    aprintln!(
                        "  {}",
                        p_y(&format!("Table '{}' already exists. Skipping.", spec.name))
                    );
                }
                summary.already_existing.push(spec.name.clone());
            }
        }
    }

    Ok(summary)
}

/// Polls each table until it reports ACTIVE, erroring out after a bounded
/// number of attempts.
pub async fn wait_for_tables_active(
    store: &dyn TableStore,
    table_names: &[String],
    poll_delay: Duration,
) -> Result<()> {
    const MAX_ATTEMPTS: u32 = 60;

    for table_name in table_names {
        let mut active = false;
        for _ in 0..MAX_ATTEMPTS {
            if matches!(
                store.table_status(table_name).await?,
                Some(TableStatus::Active)
            ) {
                active = true;
                break;
            }
            tokio::time::sleep(poll_delay).await;
        }
        if !active {
            return Err(DynamodbError::TableActivationTimeout {
                table_name: table_name.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Scripted fake: one outcome per expected create-table call, in order.
    struct ScriptedStore {
        outcomes: Mutex<Vec<Result<CreateOutcome>>>,
        calls: Mutex<Vec<String>>,
        statuses: Mutex<Vec<Option<TableStatus>>>,
    }

    impl ScriptedStore {
        fn new(outcomes: Vec<Result<CreateOutcome>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(Vec::new()),
                statuses: Mutex::new(Vec::new()),
            }
        }

        fn with_statuses(statuses: Vec<Option<TableStatus>>) -> Self {
            let store = Self::new(Vec::new());
            *store.statuses.lock().unwrap() = statuses;
            store
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TableStore for ScriptedStore {
        async fn create_table(&self, spec: &TableSpec) -> Result<CreateOutcome> {
            self.calls.lock().unwrap().push(spec.name.clone());
            self.outcomes.lock().unwrap().remove(0)
        }

        async fn table_status(&self, _table_name: &str) -> Result<Option<TableStatus>> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.remove(0))
            } else {
                Ok(statuses[0])
            }
        }
    }

    fn spec(name: &str) -> TableSpec {
        serde_json::from_str(&format!(
            r#"{{
                "name": "{name}",
                "attributeDefinitions": [
                    {{"AttributeName": "id", "AttributeType": "S"}}
                ],
                "keySchema": [
                    {{"AttributeName": "id", "KeyType": "HASH"}}
                ],
                "billingMode": "PAY_PER_REQUEST"
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_existing_table_does_not_abort_the_run() {
        let store = ScriptedStore::new(vec![
            Ok(CreateOutcome::AlreadyExists),
            Ok(CreateOutcome::Created),
        ]);
        let specs = vec![spec("account"), spec("branch")];

        let summary = provision_tables(&store, &specs, true).await.unwrap();

        assert_eq!(store.calls(), vec!["account", "branch"]);
        assert_eq!(summary.already_existing, vec!["account"]);
        assert_eq!(summary.created, vec!["branch"]);
    }

    #[tokio::test]
    async fn test_hard_error_aborts_before_later_specs() {
        let store = ScriptedStore::new(vec![
            Ok(CreateOutcome::Created),
            Err(DynamodbError::AwsSdk("ValidationException".to_string())),
            Ok(CreateOutcome::Created),
        ]);
        let specs = vec![spec("account"), spec("branch"), spec("loan")];

        let result = provision_tables(&store, &specs, true).await;

        assert!(matches!(result, Err(DynamodbError::AwsSdk(_))));
        assert_eq!(store.calls(), vec!["account", "branch"]);
    }

    #[tokio::test]
    async fn test_wait_polls_until_active() {
        let store = ScriptedStore::with_statuses(vec![
            None,
            Some(TableStatus::Creating),
            Some(TableStatus::Active),
        ]);

        wait_for_tables_active(&store, &["account".to_string()], Duration::ZERO)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_times_out_on_stuck_table() {
        let store = ScriptedStore::with_statuses(vec![Some(TableStatus::Creating)]);

        let result =
            wait_for_tables_active(&store, &["account".to_string()], Duration::ZERO).await;

        assert!(matches!(
            result,
            Err(DynamodbError::TableActivationTimeout { table_name }) if table_name == "account"
        ));
    }
}
