//! Bucket reader
//!
//! Resolves pagination and turns every backend failure into in-band data:
//! listings fail as a single error string, object fetches as an `error`
//! field. Nothing here returns an `Err` to the HTTP layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::client::{BucketRef, ObjectStore, ObjectSummary, StoreError, StoreResult};

/// Message returned for every failure other than a missing key
pub const ERROR_GENERIC: &str = "A system error has occurred";
/// Message returned when the requested key does not exist
pub const ERROR_NOT_FOUND: &str = "Object not found";

/// Aggregated bucket listing
#[derive(Debug, Clone, PartialEq)]
pub enum ListResult {
    Objects(Vec<ObjectSummary>),
    Keys(Vec<String>),
    Failed(String),
}

impl ListResult {
    /// Entries in the rendered array; a failure counts as one
    pub fn entry_count(&self) -> usize {
        match self {
            ListResult::Objects(objects) => objects.len(),
            ListResult::Keys(keys) => keys.len(),
            ListResult::Failed(_) => 1,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ListResult::Failed(_))
    }
}

/// Every variant renders as a JSON array; a failure is `["<message>"]`
impl Serialize for ListResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ListResult::Objects(objects) => objects.serialize(serializer),
            ListResult::Keys(keys) => keys.serialize(serializer),
            ListResult::Failed(message) => [message].serialize(serializer),
        }
    }
}

/// Raw metadata of one object merged with its decoded body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDetail {
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
    pub body: String,
}

impl ObjectDetail {
    fn new(mut metadata: BTreeMap<String, Value>, body: String) -> Self {
        // `body` is serialized after the flattened map; keep the key unique
        metadata.remove("body");
        Self { metadata, body }
    }
}

/// Result of fetching a single object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectFetch {
    Found(ObjectDetail),
    Failed { error: String },
}

impl ObjectFetch {
    fn failed(message: &str) -> Self {
        ObjectFetch::Failed { error: message.to_string() }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ObjectFetch::Found(_))
    }
}

/// Read-only view over one bucket
pub struct BucketReader {
    bucket: BucketRef,
    store: Arc<dyn ObjectStore>,
    fetch_concurrency: usize,
}

impl BucketReader {
    /// Create a reader fetching one object at a time
    pub fn new(bucket: BucketRef, store: Arc<dyn ObjectStore>) -> Self {
        Self { bucket, store, fetch_concurrency: 1 }
    }

    /// Allow up to `limit` object fetches in flight during [`get_all`](Self::get_all)
    pub fn with_fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = limit.max(1);
        self
    }

    pub fn bucket(&self) -> &BucketRef {
        &self.bucket
    }

    /// List every object in the bucket, following continuation tokens
    pub async fn list_all(&self, keys_only: bool) -> ListResult {
        debug!(keys_only, bucket = %self.bucket.name(), "Loading list of objects");

        match self.drain_listing().await {
            Ok(objects) if keys_only => {
                ListResult::Keys(objects.into_iter().map(|o| o.key).collect())
            }
            Ok(objects) => ListResult::Objects(objects),
            Err(e) => {
                log_listing_failure(&e, keys_only);
                ListResult::Failed(ERROR_GENERIC.to_string())
            }
        }
    }

    async fn drain_listing(&self) -> StoreResult<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.store
                .list_page(self.bucket.name(), cursor.as_deref())
                .await?;
            pages += 1;
            objects.extend(page.objects);

            if !page.is_truncated {
                break;
            }

            match page.continuation_token {
                Some(token) => cursor = Some(token),
                None => {
                    return Err(StoreError::Service(format!(
                        "page {} is truncated but has no continuation token",
                        pages
                    )));
                }
            }
        }

        info!(count = objects.len(), pages, "Listed bucket");
        Ok(objects)
    }

    /// Fetch one object with its body
    pub async fn get_one(&self, key: &str) -> ObjectFetch {
        debug!(key = %key, "Loading object");

        match self.fetch(key).await {
            Ok(detail) => {
                debug!(key = %key, fields = detail.metadata.len(), "Returning object");
                ObjectFetch::Found(detail)
            }
            Err(StoreError::NotFound(_)) => {
                debug!(key = %key, "Object not found");
                ObjectFetch::failed(ERROR_NOT_FOUND)
            }
            Err(StoreError::Service(e)) => {
                error!(key = %key, error = %e, "Service issue retrieving object");
                ObjectFetch::failed(ERROR_GENERIC)
            }
            Err(StoreError::Client(e)) => {
                error!(key = %key, error = %e, "Client issue retrieving object");
                ObjectFetch::failed(ERROR_GENERIC)
            }
        }
    }

    async fn fetch(&self, key: &str) -> StoreResult<ObjectDetail> {
        let raw = self.store.get_object(self.bucket.name(), key).await?;

        let bytes: Vec<u8> = raw.body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(|e| StoreError::Client(format!("input stream reading failed: {}", e)))?;

        let body = String::from_utf8_lossy(&bytes).into_owned();
        Ok(ObjectDetail::new(raw.metadata, body))
    }

    /// Fetch every object in the bucket, in listing order
    ///
    /// A failed listing yields a single generic error entry without issuing
    /// any object fetch.
    pub async fn get_all(&self) -> Vec<ObjectFetch> {
        debug!(bucket = %self.bucket.name(), "Loading all objects");

        let keys: Vec<String> = match self.drain_listing().await {
            Ok(objects) => objects.into_iter().map(|o| o.key).collect(),
            Err(e) => {
                log_listing_failure(&e, true);
                warn!("Key listing failed, skipping object fetches");
                return vec![ObjectFetch::failed(ERROR_GENERIC)];
            }
        };

        futures::stream::iter(keys)
            .map(|key| async move { self.get_one(&key).await })
            .buffered(self.fetch_concurrency)
            .collect()
            .await
    }
}

fn log_listing_failure(err: &StoreError, keys_only: bool) {
    match err {
        StoreError::Client(e) => {
            error!(error = %e, keys_only, "Client issue retrieving list of objects");
        }
        e => {
            error!(error = %e, keys_only, "Service issue retrieving list of objects");
        }
    }
}
