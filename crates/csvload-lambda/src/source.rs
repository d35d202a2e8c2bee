//! Object store access

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::{error::DisplayErrorContext, Client};
use std::pin::Pin;
use tokio::io::AsyncRead;
use tracing::{debug, instrument};

use crate::error::{LoaderError, LoaderResult};
use crate::event::ObjectLocation;

/// Readable body of a fetched object. Dropping it closes the stream.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// Source of the objects named by trigger notifications
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Open the object for streaming reads
    async fn open(&self, location: &ObjectLocation) -> LoaderResult<ObjectBody>;
}

/// Reads objects from S3 with `GetObject`
#[derive(Clone)]
pub struct S3ObjectSource {
    client: Client,
}

impl S3ObjectSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared SDK configuration
    ///
    /// An endpoint override switches to path-style addressing, which MinIO
    /// and LocalStack require.
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);

        if let Some(endpoint) = endpoint {
            debug!(endpoint, "Using S3 endpoint override");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    #[instrument(skip_all, fields(location = %location))]
    async fn open(&self, location: &ObjectLocation) -> LoaderResult<ObjectBody> {
        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| LoaderError::ObjectRead {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(
            content_length = response.content_length().unwrap_or(0),
            content_type = response.content_type().unwrap_or("unknown"),
            "Opened object stream"
        );

        Ok(Box::pin(response.body.into_async_read()))
    }
}
