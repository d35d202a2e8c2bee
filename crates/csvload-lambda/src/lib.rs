//! csvload Lambda Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads CSV card statements dropped into S3 into a DynamoDB table.
//!
//! An EventBridge "Object Created" notification names the object; the
//! [`Handler`] streams it through the [`LoadPipeline`], which writes the
//! rows in `BatchWriteItem` groups of up to 25 items.
//!
//! # Example
//!
//! ```no_run
//! use aws_config::BehaviorVersion;
//! use csvload_lambda::{DynamoBatchWriter, Handler, LoaderConfig, S3ObjectSource, TriggerNotification};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LoaderConfig::load()?;
//!     let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
//!     let handler = Handler::new(
//!         config,
//!         S3ObjectSource::from_sdk_config(&sdk_config, None),
//!         DynamoBatchWriter::from_sdk_config(&sdk_config, None),
//!     );
//!
//!     let event = TriggerNotification::object_created("statements", "2024/01.csv", 0);
//!     let report = handler.handle(event).await?;
//!     assert!(report.is_complete());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod pipeline;
pub mod quote;
pub mod record;
pub mod sink;
pub mod source;

pub use config::{LoaderConfig, WriteFailurePolicy};
pub use error::{LoaderError, LoaderResult};
pub use event::{ObjectLocation, TriggerNotification};
pub use handler::Handler;
pub use pipeline::{LoadOutcome, LoadPipeline, LoadReport};
pub use quote::MalformedQuote;
pub use record::{IdStrategy, TransactionRecord};
pub use sink::{BatchWriter, DynamoBatchWriter};
pub use source::{ObjectBody, ObjectSource, S3ObjectSource};
