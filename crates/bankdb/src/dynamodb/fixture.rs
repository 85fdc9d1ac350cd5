//! Seed fixture parsing.
//!
//! Each fixture file maps a table name to a list of put requests in the
//! DynamoDB JSON wire shape (`{"PutRequest": {"Item": {attr: {"S": "..."}}}}`),
//! which is converted into SDK `AttributeValue` items here.
//!
//! Two junction tables (`borrower`, `depositor`) ship without a primary key
//! of their own; a synthetic `id` is derived from their two foreign-key
//! attributes before submission.

use std::collections::HashMap;
use std::path::Path;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::Deserialize;
use serde_json::Value;

use super::error::{DynamodbError, Result};

/// One item in SDK form, ready for a put request.
pub type Item = HashMap<String, AttributeValue>;

/// The items a fixture file holds for one table.
#[derive(Debug)]
pub struct TableData {
    pub table_name: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct WriteRequestWire {
    #[serde(rename = "PutRequest")]
    put_request: PutRequestWire,
}

#[derive(Debug, Deserialize)]
struct PutRequestWire {
    #[serde(rename = "Item")]
    item: serde_json::Map<String, Value>,
}

/// Reads one fixture file and converts its items into SDK form.
pub fn load_data_file(path: &Path) -> Result<Vec<TableData>> {
    let contents = std::fs::read_to_string(path).map_err(|source| DynamodbError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let wire: HashMap<String, Vec<WriteRequestWire>> =
        serde_json::from_str(&contents).map_err(|source| DynamodbError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;

    let mut tables: Vec<TableData> = wire
        .into_iter()
        .map(|(table_name, requests)| {
            let items = requests
                .into_iter()
                .map(|request| parse_item(&table_name, &request.put_request.item))
                .collect::<Result<Vec<_>>>()?;
            Ok(TableData { table_name, items })
        })
        .collect::<Result<Vec<_>>>()?;

    // HashMap iteration order is arbitrary; keep runs deterministic.
    tables.sort_by(|a, b| a.table_name.cmp(&b.table_name));
    Ok(tables)
}

fn parse_item(table_name: &str, wire: &serde_json::Map<String, Value>) -> Result<Item> {
    wire.iter()
        .map(|(name, value)| {
            Ok((
                name.clone(),
                parse_attribute_value(table_name, value)?,
            ))
        })
        .collect()
}

/// Converts one wire-shape attribute value (`{"S": "x"}`, `{"N": "1"}`, ...)
/// into an SDK `AttributeValue`.
fn parse_attribute_value(table_name: &str, value: &Value) -> Result<AttributeValue> {
    let malformed = |reason: &str| DynamodbError::MalformedItem {
        table_name: table_name.to_string(),
        reason: reason.to_string(),
    };

    let object = value
        .as_object()
        .ok_or_else(|| malformed("attribute value is not a type-tagged object"))?;
    if object.len() != 1 {
        return Err(malformed("attribute value must carry exactly one type tag"));
    }
    let (tag, inner) = object.iter().next().expect("len checked above");

    match tag.as_str() {
        "S" => Ok(AttributeValue::S(
            inner
                .as_str()
                .ok_or_else(|| malformed("S value is not a string"))?
                .to_string(),
        )),
        "N" => Ok(AttributeValue::N(
            inner
                .as_str()
                .ok_or_else(|| malformed("N value is not a string"))?
                .to_string(),
        )),
        "BOOL" => Ok(AttributeValue::Bool(
            inner
                .as_bool()
                .ok_or_else(|| malformed("BOOL value is not a boolean"))?,
        )),
        "NULL" => Ok(AttributeValue::Null(true)),
        "M" => {
            let map = inner
                .as_object()
                .ok_or_else(|| malformed("M value is not an object"))?;
            Ok(AttributeValue::M(parse_item(table_name, map)?))
        }
        "L" => {
            let list = inner
                .as_array()
                .ok_or_else(|| malformed("L value is not an array"))?;
            Ok(AttributeValue::L(
                list.iter()
                    .map(|element| parse_attribute_value(table_name, element))
                    .collect::<Result<Vec<_>>>()?,
            ))
        }
        "SS" => Ok(AttributeValue::Ss(parse_string_array(inner, &malformed)?)),
        "NS" => Ok(AttributeValue::Ns(parse_string_array(inner, &malformed)?)),
        other => Err(DynamodbError::UnsupportedAttributeValue {
            table_name: table_name.to_string(),
            tag: other.to_string(),
        }),
    }
}

fn parse_string_array(
    value: &Value,
    malformed: &dyn Fn(&str) -> DynamodbError,
) -> Result<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| malformed("set value is not an array"))?
        .iter()
        .map(|element| {
            element
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed("set element is not a string"))
        })
        .collect()
}

/// Returns the two source attributes a junction table derives its `id` from.
pub fn synthetic_id_sources(table_name: &str) -> Option<(&'static str, &'static str)> {
    match table_name {
        "borrower" => Some(("customer_name", "loan_number")),
        "depositor" => Some(("customer_name", "account_number")),
        _ => None,
    }
}

/// Attaches the synthetic `id` attribute to junction-table items.
///
/// Items missing either source attribute are left without an id; the source
/// data treats that as acceptable input rather than an error.
pub fn attach_synthetic_ids(table_name: &str, items: &mut [Item]) {
    let Some((left, right)) = synthetic_id_sources(table_name) else {
        return;
    };

    for item in items {
        let id = match (item.get(left), item.get(right)) {
            (Some(AttributeValue::S(a)), Some(AttributeValue::S(b))) => format!("{a}::{b}"),
            _ => continue,
        };
        item.insert("id".to_string(), AttributeValue::S(id));
    }
}
