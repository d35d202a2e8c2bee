//! Shared test doubles for the pipeline and handler tests
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use csvload_lambda::{
    BatchWriter, LoaderError, LoaderResult, ObjectBody, ObjectLocation, ObjectSource,
    TransactionRecord,
};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;

pub const HEADER: &str =
    "Transaction Date,Posted Date,Card No.,Description,Category,Debit,Credit";

/// One CSV data line; `n` picks the day and amount so rows are distinguishable
pub fn data_line(n: usize) -> String {
    format!(
        "2024-01-{day:02},2024-01-{day:02},1234,\"MERCHANT {n}, INC\",Shopping,{n}.00,",
        day = (n % 28) + 1,
        n = n
    )
}

/// Header followed by `rows` data lines
pub fn statement_csv(rows: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for n in 1..=rows {
        csv.push_str(&data_line(n));
        csv.push('\n');
    }
    csv
}

/// Row-ordinal ids for a range of data rows
pub fn ordinal_ids(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|n| n.to_string()).collect()
}

/// Object source backed by in-memory bodies
#[derive(Default)]
pub struct MemorySource {
    objects: HashMap<ObjectLocation, Vec<u8>>,
    pub opened: Mutex<Vec<ObjectLocation>>,
}

impl MemorySource {
    pub fn with_object(mut self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Self {
        self.objects
            .insert(ObjectLocation::new(bucket, key), body.into());
        self
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    async fn open(&self, location: &ObjectLocation) -> LoaderResult<ObjectBody> {
        self.opened.lock().unwrap().push(location.clone());

        match self.objects.get(location) {
            Some(body) => Ok(Box::pin(Cursor::new(body.clone()))),
            None => Err(LoaderError::ObjectRead {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                message: "NoSuchKey: The specified key does not exist.".to_string(),
            }),
        }
    }
}

/// Scripted reply for one `write_batch` call
#[derive(Debug, Clone)]
pub enum Reply {
    /// Every record applied
    Accept,
    /// The call itself fails
    Fail(&'static str),
    /// The last `n` records come back unprocessed
    LeaveUnprocessed(usize),
}

/// Batch writer that records every call and replays scripted replies.
/// Calls beyond the script are accepted.
#[derive(Default)]
pub struct RecordingWriter {
    calls: Mutex<Vec<(String, Vec<TransactionRecord>)>>,
    script: Mutex<VecDeque<Reply>>,
}

impl RecordingWriter {
    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            calls: Mutex::default(),
            script: Mutex::new(replies.into_iter().collect()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<TransactionRecord>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, records)| records.clone())
            .collect()
    }

    pub fn tables(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(table, _)| table.clone())
            .collect()
    }

    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(Vec::len).collect()
    }

    pub fn call_ids(&self) -> Vec<Vec<String>> {
        self.calls()
            .iter()
            .map(|records| records.iter().map(|r| r.id.clone()).collect())
            .collect()
    }
}

#[async_trait]
impl BatchWriter for RecordingWriter {
    async fn write_batch(
        &self,
        table: &str,
        records: &[TransactionRecord],
    ) -> LoaderResult<Vec<TransactionRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push((table.to_string(), records.to_vec()));

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Accept);

        match reply {
            Reply::Accept => Ok(Vec::new()),
            Reply::Fail(message) => Err(LoaderError::BatchWrite {
                table: table.to_string(),
                message: message.to_string(),
            }),
            Reply::LeaveUnprocessed(n) => {
                let keep = records.len().saturating_sub(n);
                Ok(records[keep..].to_vec())
            },
        }
    }
}
