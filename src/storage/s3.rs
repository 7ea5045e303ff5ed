//! S3-compatible object store
//!
//! Talks to any S3 API endpoint (AWS, MinIO, R2, ...) through aws-sdk-s3.
//! The client is built once from the configured endpoint and region and
//! picks up credentials from the default provider chain.

use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client,
    config::{Builder, Region},
    error::{DisplayErrorContext, SdkError},
    operation::get_object::{GetObjectError, GetObjectOutput},
    primitives::{ByteStream, DateTime as AwsDateTime},
    types::Object,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, instrument};

use super::client::{
    BodyStream, BucketRef, ListingPage, ObjectStore, ObjectSummary, RawObject, StoreError,
    StoreResult,
};

/// Object store backed by an S3 API endpoint
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Create a client for the endpoint and region of `bucket`
    pub async fn new(bucket: &BucketRef, force_path_style: bool) -> Self {
        debug!(
            endpoint = %bucket.endpoint(),
            region = %bucket.region(),
            "Creating S3 client"
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(bucket.region().to_string()))
            .endpoint_url(bucket.endpoint())
            .load()
            .await;

        let config = Builder::from(&shared)
            .force_path_style(force_path_style)
            .build();

        Self { client: S3Client::from_conf(config) }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn list_page(&self, bucket: &str, cursor: Option<&str>) -> StoreResult<ListingPage> {
        let mut request = self.client.list_objects_v2().bucket(bucket);

        if let Some(token) = cursor {
            request = request.continuation_token(token);
        }

        let output = request.send().await.map_err(classify)?;

        let objects: Vec<ObjectSummary> = output
            .contents()
            .iter()
            .map(|object| summary_from(bucket, object))
            .collect();

        debug!(count = objects.len(), truncated = ?output.is_truncated(), "Listed S3 page");

        Ok(ListingPage {
            objects,
            is_truncated: output.is_truncated().unwrap_or(false),
            continuation_token: output.next_continuation_token().map(String::from),
        })
    }

    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<RawObject> {
        let output = self.client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_get(e, key))?;

        let metadata = raw_metadata(&output);
        Ok(RawObject {
            metadata,
            body: body_stream(output.body),
        })
    }
}

fn summary_from(bucket: &str, object: &Object) -> ObjectSummary {
    ObjectSummary {
        bucket_name: bucket.to_string(),
        key: object.key().unwrap_or_default().to_string(),
        size: object.size().unwrap_or(0),
        last_modified: object.last_modified().and_then(to_chrono),
        e_tag: object.e_tag().map(String::from),
        storage_class: object.storage_class().map(|c| c.as_str().to_string()),
    }
}

/// Collect the response headers S3 returned into a header-keyed map
fn raw_metadata(output: &GetObjectOutput) -> BTreeMap<String, Value> {
    let mut metadata = BTreeMap::new();

    let mut put = |name: &str, value: Option<&str>| {
        if let Some(value) = value {
            metadata.insert(name.to_string(), Value::from(value));
        }
    };

    put("Content-Type", output.content_type());
    put("ETag", output.e_tag());
    put("Accept-Ranges", output.accept_ranges());
    put("Content-Encoding", output.content_encoding());
    put("Content-Disposition", output.content_disposition());
    put("Content-Language", output.content_language());
    put("Cache-Control", output.cache_control());
    put("x-amz-version-id", output.version_id());
    put("x-amz-storage-class", output.storage_class().map(|c| c.as_str()));

    if let Some(length) = output.content_length() {
        metadata.insert("Content-Length".to_string(), Value::from(length));
    }

    if let Some(modified) = output.last_modified().and_then(to_chrono) {
        metadata.insert("Last-Modified".to_string(), Value::from(modified.to_rfc3339()));
    }

    if let Some(user) = output.metadata() {
        for (name, value) in user {
            metadata.insert(format!("x-amz-meta-{}", name), Value::from(value.as_str()));
        }
    }

    metadata
}

fn body_stream(body: ByteStream) -> BodyStream {
    futures::stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(io::Error::other), body))
    })
    .boxed()
}

fn to_chrono(value: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

/// Map an SDK failure onto the service/client split
///
/// A response from the service (any status) is a service error; failing to
/// build, send, or parse the request is a client error.
fn classify<E>(err: SdkError<E>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ServiceError(_) => StoreError::Service(message),
        _ => StoreError::Client(message),
    }
}

/// Like [`classify`], but a missing key becomes [`StoreError::NotFound`]
fn classify_get(err: SdkError<GetObjectError>, key: &str) -> StoreError {
    if is_not_found_error(&err) {
        StoreError::NotFound(key.to_string())
    } else {
        classify(err)
    }
}

/// Helper to check if a GetObject failure means the key does not exist
fn is_not_found_error(err: &SdkError<GetObjectError>) -> bool {
    match err {
        SdkError::ServiceError(ctx) => {
            ctx.err().is_no_such_key() || ctx.raw().status().as_u16() == 404
        }
        _ => false,
    }
}
