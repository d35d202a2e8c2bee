//! Function entry point logic
//!
//! [`Handler`] owns the collaborators built at cold start and runs one load
//! per trigger notification.

use tracing::{error, info, instrument};

use crate::config::LoaderConfig;
use crate::error::LoaderResult;
use crate::event::TriggerNotification;
use crate::pipeline::{LoadPipeline, LoadReport};
use crate::sink::BatchWriter;
use crate::source::ObjectSource;

pub struct Handler<S, W> {
    config: LoaderConfig,
    source: S,
    writer: W,
}

impl<S, W> Handler<S, W>
where
    S: ObjectSource,
    W: BatchWriter,
{
    pub fn new(config: LoaderConfig, source: S, writer: W) -> Self {
        Self {
            config,
            source,
            writer,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Load the object named by `event` into the table
    ///
    /// Fails when the event is unusable, when the object cannot be fetched,
    /// or when a batch fails under the abort policy. Malformed input only
    /// marks the report as aborted.
    #[instrument(skip_all)]
    pub async fn handle(&self, event: TriggerNotification) -> LoaderResult<LoadReport> {
        let location = event.location()?;

        info!(
            bucket = %location.bucket,
            key = %location.key,
            size = event.object_size(),
            reason = %event.detail.reason,
            "Received object notification"
        );

        let body = self.source.open(&location).await.map_err(|e| {
            error!(error = %e, location = %location, "Couldn't get object");
            e
        })?;

        let mut report = LoadPipeline::new(&self.writer, &self.config)
            .run(body)
            .await?;
        report.object = Some(location);

        Ok(report)
    }
}
