//! Store access behind trait seams.
//!
//! The provision and seed flows only see `TableStore` / `BatchWriter`, so
//! tests can substitute scripted in-memory fakes for the real client.

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::types::{BillingMode, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;

use super::error::{DynamodbError, Result};
use super::fixture::Item;
use super::manifest::TableSpec;

/// Result of one create-table call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The store reported `ResourceInUseException`; treated as success.
    AlreadyExists,
}

/// Table status as reported by DescribeTable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Control-plane operations used by the provisioner.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Issues one create-table call for the spec.
    async fn create_table(&self, spec: &TableSpec) -> Result<CreateOutcome>;

    /// Fetches the current table status, `None` if the table doesn't exist.
    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>>;
}

/// Data-plane operations used by the loader.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// Submits one batch write and returns the unprocessed subset.
    async fn batch_write(&self, table_name: &str, items: Vec<Item>) -> Result<Vec<Item>>;
}

/// AWS SDK backed implementation of both store traits.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn create_table(&self, spec: &TableSpec) -> Result<CreateOutcome> {
        let mut request = self
            .client
            .create_table()
            .table_name(&spec.name)
            .set_attribute_definitions(Some(spec.sdk_attribute_definitions()?))
            .set_key_schema(Some(spec.sdk_key_schema()?))
            .set_global_secondary_indexes(spec.sdk_global_secondary_indexes()?)
            .set_local_secondary_indexes(spec.sdk_local_secondary_indexes()?)
            .set_provisioned_throughput(spec.sdk_provisioned_throughput()?);

        if let Some(mode) = &spec.billing_mode {
            request = request.billing_mode(BillingMode::from(mode.as_str()));
        }

        match request.send().await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) => match err.into_service_error() {
                CreateTableError::ResourceInUseException(_) => Ok(CreateOutcome::AlreadyExists),
                other => Err(DynamodbError::AwsSdk(other.to_string())),
            },
        }
    }

    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(response) => {
                let status = response
                    .table()
                    .and_then(|table| table.table_status())
                    .map(|status| match status {
                        aws_sdk_dynamodb::types::TableStatus::Creating => TableStatus::Creating,
                        aws_sdk_dynamodb::types::TableStatus::Updating => TableStatus::Updating,
                        aws_sdk_dynamodb::types::TableStatus::Deleting => TableStatus::Deleting,
                        _ => TableStatus::Active,
                    });
                Ok(status)
            }
            Err(err) => match err.into_service_error() {
                DescribeTableError::ResourceNotFoundException(_) => Ok(None),
                other => Err(DynamodbError::AwsSdk(other.to_string())),
            },
        }
    }
}

#[async_trait]
impl BatchWriter for DynamoDbStore {
    async fn batch_write(&self, table_name: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        let write_requests = items
            .into_iter()
            .map(|item| {
                Ok(WriteRequest::builder()
                    .put_request(
                        PutRequest::builder()
                            .set_item(Some(item))
                            .build()
                            .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
                    )
                    .build())
            })
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .client
            .batch_write_item()
            .request_items(table_name, write_requests)
            .send()
            .await
            .map_err(|err| DynamodbError::AwsSdk(err.into_service_error().to_string()))?;

        let mut unprocessed = Vec::new();
        if let Some(requests) = response
            .unprocessed_items()
            .and_then(|map| map.get(table_name))
        {
            for request in requests {
                if let Some(put) = request.put_request() {
                    unprocessed.push(put.item().clone());
                }
            }
        }
        Ok(unprocessed)
    }
}
