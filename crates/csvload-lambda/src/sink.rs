//! Table writes
//!
//! One write group becomes one `BatchWriteItem` call. DynamoDB may accept a
//! call and still hand some put requests back in `UnprocessedItems` when the
//! table is throttled; those are matched back to the submitted records by
//! `Id` and returned to the caller so the write failure policy can decide
//! what to do with them.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    types::{PutRequest, WriteRequest},
    Client,
};
use tracing::{debug, instrument, warn};

use crate::error::{LoaderError, LoaderResult};
use crate::record::{TransactionRecord, ATTR_ID};

/// Destination for write groups
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// Put every record in one bulk call
    ///
    /// Returns the records the store did not apply; empty on full success.
    async fn write_batch(
        &self,
        table: &str,
        records: &[TransactionRecord],
    ) -> LoaderResult<Vec<TransactionRecord>>;
}

/// Writes groups to DynamoDB with `BatchWriteItem`
#[derive(Clone)]
pub struct DynamoBatchWriter {
    client: Client,
}

impl DynamoBatchWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared SDK configuration, honouring an endpoint
    /// override such as DynamoDB Local
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(endpoint) = endpoint {
            debug!(endpoint, "Using DynamoDB endpoint override");
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(Client::from_conf(builder.build()))
    }
}

fn put_requests(table: &str, records: &[TransactionRecord]) -> LoaderResult<Vec<WriteRequest>> {
    records
        .iter()
        .map(|record| {
            let put = PutRequest::builder()
                .set_item(Some(record.to_item()))
                .build()
                .map_err(|e| LoaderError::BatchWrite {
                    table: table.to_string(),
                    message: e.to_string(),
                })?;

            Ok(WriteRequest::builder().put_request(put).build())
        })
        .collect()
}

#[async_trait]
impl BatchWriter for DynamoBatchWriter {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn write_batch(
        &self,
        table: &str,
        records: &[TransactionRecord],
    ) -> LoaderResult<Vec<TransactionRecord>> {
        let requests = put_requests(table, records)?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(|e| LoaderError::BatchWrite {
                table: table.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let Some(pending) = output.unprocessed_items().and_then(|items| items.get(table)) else {
            return Ok(Vec::new());
        };

        let unprocessed = match_unprocessed(table, records, pending)?;
        debug!(unprocessed = unprocessed.len(), "Table left items unprocessed");

        Ok(unprocessed)
    }
}

/// Resolve returned put requests to the submitted records by `Id`
///
/// Fails when a returned item matches no submitted record.
fn match_unprocessed(
    table: &str,
    records: &[TransactionRecord],
    pending: &[WriteRequest],
) -> LoaderResult<Vec<TransactionRecord>> {
    let mut unprocessed = Vec::with_capacity(pending.len());

    for request in pending {
        let id = request
            .put_request()
            .and_then(|put| put.item().get(ATTR_ID))
            .and_then(|value| value.as_s().ok());

        match id.and_then(|id| records.iter().find(|record| &record.id == id)) {
            Some(record) => unprocessed.push(record.clone()),
            None => {
                warn!(
                    returned = pending.len(),
                    "Unprocessed item does not match any submitted record"
                );
                return Err(LoaderError::BatchWrite {
                    table: table.to_string(),
                    message: format!(
                        "{} unprocessed item(s) returned, at least one unrecognised",
                        pending.len()
                    ),
                });
            },
        }
    }

    Ok(unprocessed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn record(id: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            transaction_date: "2024-01-02".to_string(),
            posted_date: "2024-01-03".to_string(),
            card_last_four: "1234".to_string(),
            description: "COFFEE SHOP".to_string(),
            category: "Dining".to_string(),
            debit: "4.50".to_string(),
            credit: String::new(),
        }
    }

    #[test]
    fn test_put_requests_preserve_order() {
        let records = vec![record("1"), record("2"), record("3")];
        let requests = put_requests("CreditCardTransactions", &records).unwrap();

        let ids: Vec<&AttributeValue> = requests
            .iter()
            .map(|r| &r.put_request().unwrap().item()[ATTR_ID])
            .collect();

        assert_eq!(
            ids,
            vec![
                &AttributeValue::S("1".to_string()),
                &AttributeValue::S("2".to_string()),
                &AttributeValue::S("3".to_string()),
            ]
        );
        assert!(requests.iter().all(|r| r.delete_request().is_none()));
    }

    #[test]
    fn test_unprocessed_items_resolve_to_submitted_records() {
        let records = vec![record("1"), record("2"), record("3")];
        let returned = put_requests("CreditCardTransactions", &[record("3"), record("1")]).unwrap();

        let unprocessed = match_unprocessed("CreditCardTransactions", &records, &returned).unwrap();

        assert_eq!(unprocessed, vec![record("3"), record("1")]);
    }

    #[test]
    fn test_unrecognised_unprocessed_item_is_an_error() {
        let records = vec![record("1"), record("2")];
        let mut returned = put_requests("CreditCardTransactions", &[record("2")]).unwrap();
        returned.push(WriteRequest::builder().build());

        let err = match_unprocessed("CreditCardTransactions", &records, &returned).unwrap_err();

        assert!(matches!(err, LoaderError::BatchWrite { .. }));
    }
}
