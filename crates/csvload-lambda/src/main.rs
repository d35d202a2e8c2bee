//! csvload - Lambda bootstrap

use aws_config::BehaviorVersion;
use csvload_common::logging::{init_logging, LogConfig};
use csvload_lambda::{
    DynamoBatchWriter, Handler, LoadReport, LoaderConfig, S3ObjectSource, TriggerNotification,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let log_config = LogConfig::from_env()?;
    init_logging(&log_config)?;

    let config = LoaderConfig::load()?;
    info!(
        table = %config.table_name,
        max_batch_size = config.max_batch_size,
        id_strategy = %config.id_strategy,
        write_failure_policy = ?config.write_failure_policy,
        "Loader configured"
    );

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let source = S3ObjectSource::from_sdk_config(&sdk_config, config.s3_endpoint.as_deref());
    let writer = DynamoBatchWriter::from_sdk_config(&sdk_config, config.dynamodb_endpoint.as_deref());

    let handler = Handler::new(config, source, writer);
    let handler = &handler;

    run(service_fn(move |event: LambdaEvent<TriggerNotification>| async move {
        let report: LoadReport = handler.handle(event.payload).await?;
        Ok::<_, Error>(report)
    }))
    .await
}
