//! Transaction records and their DynamoDB item shape
//!
//! Each data row of the statement export carries seven columns, in order:
//!
//! ```text
//! Transaction Date,Posted Date,Card No.,Description,Category,Debit,Credit
//! 2024-01-02,2024-01-03,1234,COFFEE SHOP,Dining,4.50,
//! ```
//!
//! Values are copied verbatim. Dates and amounts are never parsed, and every
//! attribute is stored as a DynamoDB string.

use aws_sdk_dynamodb::types::AttributeValue;
use csv_async::StringRecord;
use csvload_common::checksum::hash_fields;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{LoaderError, LoaderResult};

/// Number of columns a data row must provide.
pub const FIELD_COUNT: usize = 7;

pub const ATTR_ID: &str = "Id";
pub const ATTR_TRANSACTION_DATE: &str = "TransactionDate";
pub const ATTR_POSTED_DATE: &str = "PostedDate";
pub const ATTR_CARD_LAST_FOUR: &str = "CardLastFour";
pub const ATTR_DESCRIPTION: &str = "Description";
pub const ATTR_CATEGORY: &str = "Category";
pub const ATTR_DEBIT: &str = "Debit";
pub const ATTR_CREDIT: &str = "Credit";

/// How the `Id` partition key of each item is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// 1-based position of the row in its file, header excluded.
    ///
    /// Restarts at 1 for every object, so two files overwrite each other's items.
    #[default]
    RowOrdinal,
    /// SHA-256 of the row's fields; identical rows share an `Id` and the
    /// later one overwrites the earlier item
    ContentHash,
    /// Random v4 UUID per row; reprocessing a file duplicates its items
    Uuid,
}

impl IdStrategy {
    /// Derive the identifier for a data row
    pub fn assign(&self, ordinal: u64, fields: &[&str]) -> String {
        match self {
            IdStrategy::RowOrdinal => ordinal.to_string(),
            IdStrategy::ContentHash => hash_fields(fields),
            IdStrategy::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl std::str::FromStr for IdStrategy {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "row-ordinal" | "ordinal" => Ok(IdStrategy::RowOrdinal),
            "content-hash" | "hash" => Ok(IdStrategy::ContentHash),
            "uuid" => Ok(IdStrategy::Uuid),
            _ => Err(LoaderError::Config(format!("Invalid id strategy: {}", s))),
        }
    }
}

impl std::fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdStrategy::RowOrdinal => write!(f, "row-ordinal"),
            IdStrategy::ContentHash => write!(f, "content-hash"),
            IdStrategy::Uuid => write!(f, "uuid"),
        }
    }
}

/// One card transaction, ready to be written as an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub transaction_date: String,
    pub posted_date: String,
    pub card_last_four: String,
    pub description: String,
    pub category: String,
    pub debit: String,
    pub credit: String,
}

impl TransactionRecord {
    /// Map a parsed CSV row to a record
    ///
    /// Rows with fewer than [`FIELD_COUNT`] fields are rejected; extra
    /// trailing fields are ignored.
    pub fn from_row(ordinal: u64, row: &StringRecord, strategy: IdStrategy) -> LoaderResult<Self> {
        if row.len() < FIELD_COUNT {
            return Err(LoaderError::ShortRow {
                line: row.position().map(|p| p.line()).unwrap_or(0),
                fields: row.len(),
                expected: FIELD_COUNT,
            });
        }

        let fields: Vec<&str> = row.iter().take(FIELD_COUNT).collect();
        Ok(Self::from_fields(strategy.assign(ordinal, &fields), &fields))
    }

    /// Build a record from exactly [`FIELD_COUNT`] fields
    fn from_fields(id: String, fields: &[&str]) -> Self {
        Self {
            id,
            transaction_date: fields[0].to_string(),
            posted_date: fields[1].to_string(),
            card_last_four: fields[2].to_string(),
            description: fields[3].to_string(),
            category: fields[4].to_string(),
            debit: fields[5].to_string(),
            credit: fields[6].to_string(),
        }
    }

    /// Attribute map for a `PutRequest`
    pub fn to_item(&self) -> HashMap<String, AttributeValue> {
        [
            (ATTR_ID, &self.id),
            (ATTR_TRANSACTION_DATE, &self.transaction_date),
            (ATTR_POSTED_DATE, &self.posted_date),
            (ATTR_CARD_LAST_FOUR, &self.card_last_four),
            (ATTR_DESCRIPTION, &self.description),
            (ATTR_CATEGORY, &self.category),
            (ATTR_DEBIT, &self.debit),
            (ATTR_CREDIT, &self.credit),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), AttributeValue::S(value.clone())))
        .collect()
    }
}
