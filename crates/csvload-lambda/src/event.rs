//! Trigger notification
//!
//! The function is subscribed to EventBridge "Object Created" events from
//! the statements bucket. Only the `detail` object is needed:
//!
//! ```json
//! {
//!   "detail-type": "Object Created",
//!   "source": "aws.s3",
//!   "detail": {
//!     "bucket": { "name": "statements" },
//!     "object": { "key": "2024/01.csv", "size": 1024 },
//!     "reason": "PutObject"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, LoaderResult};

/// EventBridge envelope around an S3 object notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerNotification {
    #[serde(rename = "detail-type", default, skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub detail: ObjectCreatedDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreatedDetail {
    #[serde(default)]
    pub reason: String,
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
    #[serde(default)]
    pub size: u64,
}

/// Bucket and key of the object to load
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl TriggerNotification {
    /// Build a notification for a bucket and key, as EventBridge would
    pub fn object_created(bucket: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            detail_type: Some("Object Created".to_string()),
            source: Some("aws.s3".to_string()),
            detail: ObjectCreatedDetail {
                reason: "PutObject".to_string(),
                bucket: BucketRef { name: bucket.into() },
                object: ObjectRef {
                    key: key.into(),
                    size,
                },
            },
        }
    }

    /// Extract the object location, rejecting blank bucket names or keys
    pub fn location(&self) -> LoaderResult<ObjectLocation> {
        let bucket = self.detail.bucket.name.trim();
        let key = self.detail.object.key.as_str();

        if bucket.is_empty() {
            return Err(LoaderError::InvalidEvent("bucket name is empty".to_string()));
        }
        if key.is_empty() {
            return Err(LoaderError::InvalidEvent("object key is empty".to_string()));
        }

        Ok(ObjectLocation::new(bucket, key))
    }

    pub fn object_size(&self) -> u64 {
        self.detail.object.size
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_eventbridge_payload() {
        let payload = serde_json::json!({
            "version": "0",
            "id": "17793124-05d4-b198-2fde-7ededc63b103",
            "detail-type": "Object Created",
            "source": "aws.s3",
            "account": "111122223333",
            "time": "2024-01-05T18:43:48Z",
            "region": "us-east-1",
            "resources": ["arn:aws:s3:::statements"],
            "detail": {
                "version": "0",
                "bucket": { "name": "statements" },
                "object": {
                    "key": "2024/january.csv",
                    "size": 5,
                    "etag": "b1946ac92492d2347c6235b4d2611184",
                    "sequencer": "00617F08299329D189"
                },
                "request-id": "N4N7GDK58NMKJ12R",
                "requester": "123456789012",
                "reason": "PutObject"
            }
        });

        let event: TriggerNotification = serde_json::from_value(payload).unwrap();

        assert_eq!(event.detail.reason, "PutObject");
        assert_eq!(event.object_size(), 5);
        assert_eq!(
            event.location().unwrap(),
            ObjectLocation::new("statements", "2024/january.csv")
        );
    }

    #[test]
    fn test_minimal_payload() {
        let payload = r#"{"detail":{"bucket":{"name":"b"},"object":{"key":"k.csv"}}}"#;
        let event: TriggerNotification = serde_json::from_str(payload).unwrap();

        assert_eq!(event.detail_type, None);
        assert_eq!(event.object_size(), 0);
        assert_eq!(event.location().unwrap().to_string(), "s3://b/k.csv");
    }

    #[test]
    fn test_missing_detail_is_rejected() {
        let payload = r#"{"detail-type":"Object Created"}"#;
        assert!(serde_json::from_str::<TriggerNotification>(payload).is_err());
    }

    #[test]
    fn test_blank_location_is_invalid() {
        let event = TriggerNotification::object_created(" ", "k.csv", 1);
        assert!(matches!(event.location(), Err(LoaderError::InvalidEvent(_))));

        let event = TriggerNotification::object_created("b", "", 1);
        assert!(matches!(event.location(), Err(LoaderError::InvalidEvent(_))));
    }
}
