//! Table manifest parsing (`tables.json`).
//!
//! The manifest is an array of table specs. Top-level keys are camelCase,
//! inner shapes keep the DynamoDB wire field names so a manifest can be
//! pasted from AWS CLI output unchanged.

use std::path::Path;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, KeyType, LocalSecondaryIndex,
    Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType,
};
use serde::Deserialize;

use super::error::{DynamodbError, Result};

/// One table to provision.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(rename = "attributeDefinitions")]
    pub attribute_definitions: Vec<AttributeDefinitionSpec>,
    #[serde(rename = "keySchema")]
    pub key_schema: Vec<KeySchemaSpec>,
    #[serde(rename = "billingMode", default)]
    pub billing_mode: Option<String>,
    #[serde(rename = "provisionedThroughput", default)]
    pub provisioned_throughput: Option<ThroughputSpec>,
    #[serde(rename = "globalSecondaryIndexes", default)]
    pub global_secondary_indexes: Vec<GsiSpec>,
    #[serde(rename = "localSecondaryIndexes", default)]
    pub local_secondary_indexes: Vec<LsiSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeDefinitionSpec {
    #[serde(rename = "AttributeName")]
    pub attribute_name: String,
    #[serde(rename = "AttributeType")]
    pub attribute_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeySchemaSpec {
    #[serde(rename = "AttributeName")]
    pub attribute_name: String,
    #[serde(rename = "KeyType")]
    pub key_type: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThroughputSpec {
    #[serde(rename = "ReadCapacityUnits")]
    pub read_capacity_units: i64,
    #[serde(rename = "WriteCapacityUnits")]
    pub write_capacity_units: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GsiSpec {
    #[serde(rename = "IndexName")]
    pub index_name: String,
    #[serde(rename = "KeySchema")]
    pub key_schema: Vec<KeySchemaSpec>,
    #[serde(rename = "Projection")]
    pub projection: ProjectionSpec,
    #[serde(rename = "ProvisionedThroughput", default)]
    pub provisioned_throughput: Option<ThroughputSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LsiSpec {
    #[serde(rename = "IndexName")]
    pub index_name: String,
    #[serde(rename = "KeySchema")]
    pub key_schema: Vec<KeySchemaSpec>,
    #[serde(rename = "Projection")]
    pub projection: ProjectionSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionSpec {
    #[serde(rename = "ProjectionType")]
    pub projection_type: String,
    #[serde(rename = "NonKeyAttributes", default)]
    pub non_key_attributes: Vec<String>,
}

/// Reads and parses the table manifest.
pub fn load_manifest(path: &Path) -> Result<Vec<TableSpec>> {
    let contents = std::fs::read_to_string(path).map_err(|source| DynamodbError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let specs: Vec<TableSpec> =
        serde_json::from_str(&contents).map_err(|source| DynamodbError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;

    for spec in &specs {
        spec.validate()?;
    }

    Ok(specs)
}

impl TableSpec {
    /// Checks the invariants the control-plane API would reject anyway,
    /// so a bad manifest fails before any table is created.
    pub fn validate(&self) -> Result<()> {
        match (&self.billing_mode, &self.provisioned_throughput) {
            (Some(_), Some(_)) => Err(DynamodbError::InvalidTableSpec {
                table_name: self.name.clone(),
                reason: "billingMode and provisionedThroughput are mutually exclusive".to_string(),
            }),
            (None, None) => Err(DynamodbError::InvalidTableSpec {
                table_name: self.name.clone(),
                reason: "one of billingMode or provisionedThroughput is required".to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn sdk_attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        self.attribute_definitions
            .iter()
            .map(|def| {
                AttributeDefinition::builder()
                    .attribute_name(&def.attribute_name)
                    .attribute_type(ScalarAttributeType::from(def.attribute_type.as_str()))
                    .build()
                    .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
            })
            .collect()
    }

    pub fn sdk_key_schema(&self) -> Result<Vec<KeySchemaElement>> {
        build_key_schema(&self.key_schema)
    }

    pub fn sdk_provisioned_throughput(&self) -> Result<Option<ProvisionedThroughput>> {
        self.provisioned_throughput
            .as_ref()
            .map(build_throughput)
            .transpose()
    }

    /// Returns `None` when the manifest declares no GSIs, so the request
    /// field is omitted instead of sent as an empty list.
    pub fn sdk_global_secondary_indexes(&self) -> Result<Option<Vec<GlobalSecondaryIndex>>> {
        if self.global_secondary_indexes.is_empty() {
            return Ok(None);
        }
        self.global_secondary_indexes
            .iter()
            .map(|gsi| {
                let mut builder = GlobalSecondaryIndex::builder()
                    .index_name(&gsi.index_name)
                    .set_key_schema(Some(build_key_schema(&gsi.key_schema)?))
                    .projection(build_projection(&gsi.projection));
                if let Some(throughput) = &gsi.provisioned_throughput {
                    builder = builder.provisioned_throughput(build_throughput(throughput)?);
                }
                builder
                    .build()
                    .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn sdk_local_secondary_indexes(&self) -> Result<Option<Vec<LocalSecondaryIndex>>> {
        if self.local_secondary_indexes.is_empty() {
            return Ok(None);
        }
        self.local_secondary_indexes
            .iter()
            .map(|lsi| {
                LocalSecondaryIndex::builder()
                    .index_name(&lsi.index_name)
                    .set_key_schema(Some(build_key_schema(&lsi.key_schema)?))
                    .projection(build_projection(&lsi.projection))
                    .build()
                    .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

fn build_key_schema(elements: &[KeySchemaSpec]) -> Result<Vec<KeySchemaElement>> {
    elements
        .iter()
        .map(|key| {
            KeySchemaElement::builder()
                .attribute_name(&key.attribute_name)
                .key_type(KeyType::from(key.key_type.as_str()))
                .build()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
        })
        .collect()
}

fn build_throughput(spec: &ThroughputSpec) -> Result<ProvisionedThroughput> {
    ProvisionedThroughput::builder()
        .read_capacity_units(spec.read_capacity_units)
        .write_capacity_units(spec.write_capacity_units)
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

fn build_projection(spec: &ProjectionSpec) -> Projection {
    let mut builder =
        Projection::builder().projection_type(ProjectionType::from(spec.projection_type.as_str()));
    if !spec.non_key_attributes.is_empty() {
        builder = builder.set_non_key_attributes(Some(spec.non_key_attributes.clone()));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_demand_spec() -> TableSpec {
        serde_json::from_str(
            r#"{
                "name": "account",
                "attributeDefinitions": [
                    {"AttributeName": "account_number", "AttributeType": "S"}
                ],
                "keySchema": [
                    {"AttributeName": "account_number", "KeyType": "HASH"}
                ],
                "billingMode": "PAY_PER_REQUEST"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_on_demand_spec() {
        let spec = on_demand_spec();

        assert_eq!(spec.name, "account");
        assert_eq!(spec.attribute_definitions.len(), 1);
        assert_eq!(spec.key_schema[0].key_type, "HASH");
        assert_eq!(spec.billing_mode.as_deref(), Some("PAY_PER_REQUEST"));
        assert!(spec.provisioned_throughput.is_none());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_parse_composite_key_with_gsi() {
        let spec: TableSpec = serde_json::from_str(
            r#"{
                "name": "loan",
                "attributeDefinitions": [
                    {"AttributeName": "loan_number", "AttributeType": "S"},
                    {"AttributeName": "branch_name", "AttributeType": "S"}
                ],
                "keySchema": [
                    {"AttributeName": "loan_number", "KeyType": "HASH"},
                    {"AttributeName": "branch_name", "KeyType": "RANGE"}
                ],
                "billingMode": "PAY_PER_REQUEST",
                "globalSecondaryIndexes": [
                    {
                        "IndexName": "branch_index",
                        "KeySchema": [
                            {"AttributeName": "branch_name", "KeyType": "HASH"}
                        ],
                        "Projection": {"ProjectionType": "ALL"}
                    }
                ]
            }"#,
        )
        .unwrap();

        let gsis = spec.sdk_global_secondary_indexes().unwrap().unwrap();
        assert_eq!(gsis.len(), 1);
        assert_eq!(gsis[0].index_name(), "branch_index");

        let key_schema = spec.sdk_key_schema().unwrap();
        assert_eq!(key_schema.len(), 2);
        assert_eq!(key_schema[0].key_type(), &KeyType::Hash);
        assert_eq!(key_schema[1].key_type(), &KeyType::Range);
    }

    #[test]
    fn test_absent_indexes_are_omitted() {
        let spec = on_demand_spec();

        assert!(spec.sdk_global_secondary_indexes().unwrap().is_none());
        assert!(spec.sdk_local_secondary_indexes().unwrap().is_none());
        assert!(spec.sdk_provisioned_throughput().unwrap().is_none());
    }

    #[test]
    fn test_billing_mode_and_throughput_are_exclusive() {
        let mut spec = on_demand_spec();
        spec.provisioned_throughput = Some(ThroughputSpec {
            read_capacity_units: 5,
            write_capacity_units: 5,
        });

        assert!(matches!(
            spec.validate(),
            Err(DynamodbError::InvalidTableSpec { .. })
        ));
    }

    #[test]
    fn test_one_billing_configuration_is_required() {
        let mut spec = on_demand_spec();
        spec.billing_mode = None;

        assert!(matches!(
            spec.validate(),
            Err(DynamodbError::InvalidTableSpec { .. })
        ));
    }

    #[test]
    fn test_provisioned_spec_builds_throughput() {
        let mut spec = on_demand_spec();
        spec.billing_mode = None;
        spec.provisioned_throughput = Some(ThroughputSpec {
            read_capacity_units: 10,
            write_capacity_units: 2,
        });

        let throughput = spec.sdk_provisioned_throughput().unwrap().unwrap();
        assert_eq!(throughput.read_capacity_units(), 10);
        assert_eq!(throughput.write_capacity_units(), 2);
    }
}
