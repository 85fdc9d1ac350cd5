//! AWS SDK client setup.

use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

use super::error::Result;

/// Connection settings for the local DynamoDB instance, resolved from the
/// CLI flags and their environment fallbacks.
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Endpoint URL of the local DynamoDB instance.
    pub endpoint_url: String,
    /// AWS region.
    pub region: String,
    /// Access key id. DynamoDB local accepts any non-empty pair.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl AwsConfig {
    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        format!(
            "Local DynamoDB ({}, region: {})",
            self.endpoint_url, self.region
        )
    }
}

/// Creates a DynamoDB client with the given configuration.
pub async fn create_client(config: &AwsConfig) -> Result<Client> {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "bankdb-static",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint_url)
        .load()
        .await;

    Ok(Client::new(&sdk_config))
}
