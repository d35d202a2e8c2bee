//! Configuration management
//!
//! Loaded once per cold start from the function's environment. A `.env`
//! file is honoured for local runs against MinIO or DynamoDB Local.

use crate::error::{LoaderError, LoaderResult};
use crate::record::IdStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Loader Configuration Constants
// ============================================================================

/// Default target table.
pub const DEFAULT_TABLE_NAME: &str = "CreditCardTransactions";

/// Upper bound on put requests per `BatchWriteItem` call.
pub const DYNAMODB_MAX_BATCH_SIZE: usize = 25;

/// Default number of records per write group.
pub const DEFAULT_MAX_BATCH_SIZE: usize = DYNAMODB_MAX_BATCH_SIZE;

/// Default attempts per batch under the retry policy, including the first.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry; doubled on every further attempt.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;

/// What to do when a bulk write fails or leaves items unprocessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", tag = "policy")]
pub enum WriteFailurePolicy {
    /// Fail the invocation on the first failed batch
    Abort,
    /// Log the failure and carry on with the next batch
    #[default]
    LogAndContinue,
    /// Resubmit with exponential backoff, then log and carry on
    Retry { max_attempts: u32, base_delay_ms: u64 },
}

impl WriteFailurePolicy {
    /// Retry policy with the default attempt count and delay
    pub fn retry() -> Self {
        WriteFailurePolicy::Retry {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }

    /// Backoff before the given retry (1-based), or None when attempts are exhausted
    pub fn backoff(&self, retry: u32) -> Option<Duration> {
        match *self {
            WriteFailurePolicy::Retry {
                max_attempts,
                base_delay_ms,
            } if retry < max_attempts => {
                let factor = 1u64 << retry.saturating_sub(1).min(16);
                Some(Duration::from_millis(base_delay_ms.saturating_mul(factor)))
            },
            _ => None,
        }
    }
}

impl std::str::FromStr for WriteFailurePolicy {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" | "abort-on-error" => Ok(WriteFailurePolicy::Abort),
            "log-and-continue" | "continue" => Ok(WriteFailurePolicy::LogAndContinue),
            "retry" | "retry-with-backoff" => Ok(WriteFailurePolicy::retry()),
            _ => Err(LoaderError::Config(format!("Invalid write failure policy: {}", s))),
        }
    }
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Target DynamoDB table
    pub table_name: String,

    /// Records per write group, 1..=25
    pub max_batch_size: usize,

    /// How item identifiers are derived
    pub id_strategy: IdStrategy,

    /// Behaviour on failed bulk writes
    pub write_failure_policy: WriteFailurePolicy,

    /// Endpoint override for the object store
    pub s3_endpoint: Option<String>,

    /// Endpoint override for the table store
    pub dynamodb_endpoint: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            id_strategy: IdStrategy::default(),
            write_failure_policy: WriteFailurePolicy::default(),
            s3_endpoint: None,
            dynamodb_endpoint: None,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> LoaderResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Read configuration from environment variables
    ///
    /// - `TABLE_NAME`
    /// - `MAX_BATCH_SIZE`
    /// - `ID_STRATEGY`: row-ordinal, content-hash, uuid
    /// - `WRITE_FAILURE_POLICY`: abort, log-and-continue, retry
    /// - `WRITE_RETRY_MAX_ATTEMPTS`, `WRITE_RETRY_BASE_DELAY_MS`
    /// - `S3_ENDPOINT`, `DYNAMODB_ENDPOINT`
    pub fn from_env() -> LoaderResult<Self> {
        let mut config = Self::default();

        if let Ok(table) = std::env::var("TABLE_NAME") {
            config.table_name = table;
        }

        if let Some(size) = parse_env_var("MAX_BATCH_SIZE")? {
            config.max_batch_size = size;
        }

        if let Ok(strategy) = std::env::var("ID_STRATEGY") {
            config.id_strategy = strategy.parse()?;
        }

        if let Ok(policy) = std::env::var("WRITE_FAILURE_POLICY") {
            config.write_failure_policy = policy.parse()?;
        }

        if let WriteFailurePolicy::Retry {
            ref mut max_attempts,
            ref mut base_delay_ms,
        } = config.write_failure_policy
        {
            if let Some(attempts) = parse_env_var("WRITE_RETRY_MAX_ATTEMPTS")? {
                *max_attempts = attempts;
            }
            if let Some(delay) = parse_env_var("WRITE_RETRY_BASE_DELAY_MS")? {
                *base_delay_ms = delay;
            }
        }

        config.s3_endpoint = std::env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty());
        config.dynamodb_endpoint = std::env::var("DYNAMODB_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty());

        config.validate()?;

        Ok(config)
    }

    /// Set the target table
    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    /// Set the write group size
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Set the identifier strategy
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Set the write failure policy
    pub fn with_write_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure_policy = policy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> LoaderResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(LoaderError::Config("Table name cannot be empty".to_string()));
        }

        if self.max_batch_size == 0 || self.max_batch_size > DYNAMODB_MAX_BATCH_SIZE {
            return Err(LoaderError::Config(format!(
                "Max batch size must be between 1 and {}, got {}",
                DYNAMODB_MAX_BATCH_SIZE, self.max_batch_size
            )));
        }

        if let WriteFailurePolicy::Retry { max_attempts, .. } = self.write_failure_policy {
            if max_attempts == 0 {
                return Err(LoaderError::Config(
                    "Retry max attempts must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Parse a numeric variable if it is set
fn parse_env_var<T: std::str::FromStr>(name: &str) -> LoaderResult<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LoaderError::Config(format!("Invalid {}: {}", name, value))),
        Err(_) => Ok(None),
    }
}
