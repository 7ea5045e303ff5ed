//! Object store contract
//!
//! The reader talks to the backend only through [`ObjectStore`], so the S3
//! client and in-memory test stores are interchangeable.

use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Error Types
// ============================================================================

/// Outcome classes of a failed backend call
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested key does not exist in the bucket
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The backend was reached but rejected or failed the request
    #[error("Service error: {0}")]
    Service(String),

    /// The backend could not be reached, or its response could not be read
    #[error("Client error: {0}")]
    Client(String),
}

/// Result type for object store operations
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Backend Types
// ============================================================================

/// Immutable reference to the bucket being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRef {
    name: String,
    endpoint: String,
    region: String,
}

impl BucketRef {
    pub fn new(name: &str, endpoint: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            region: region.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Listing metadata for a single object
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub bucket_name: String,
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(rename = "eTag")]
    pub e_tag: Option<String>,
    pub storage_class: Option<String>,
}

impl ObjectSummary {
    /// Summary carrying only a key, as produced by bare listings
    pub fn with_key(bucket: &str, key: &str) -> Self {
        Self {
            bucket_name: bucket.to_string(),
            key: key.to_string(),
            size: 0,
            last_modified: None,
            e_tag: None,
            storage_class: None,
        }
    }
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub objects: Vec<ObjectSummary>,
    /// More pages follow this one
    pub is_truncated: bool,
    /// Cursor for the next page, present when truncated
    pub continuation_token: Option<String>,
}

impl ListingPage {
    /// A page with no successor
    pub fn last(objects: Vec<ObjectSummary>) -> Self {
        Self { objects, is_truncated: false, continuation_token: None }
    }

    /// A page followed by the page behind `token`
    pub fn truncated(objects: Vec<ObjectSummary>, token: impl Into<String>) -> Self {
        Self { objects, is_truncated: true, continuation_token: Some(token.into()) }
    }
}

/// Object content as delivered by the backend
pub type BodyStream = BoxStream<'static, io::Result<Bytes>>;

/// A fetched object before its body has been read
pub struct RawObject {
    /// Raw response metadata keyed by header name
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub body: BodyStream,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Read access to an object-storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one listing page of `bucket`
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `cursor` - Continuation token of the previous page, `None` for the first page
    async fn list_page(&self, bucket: &str, cursor: Option<&str>) -> StoreResult<ListingPage>;

    /// Fetch a single object by key
    ///
    /// A missing key is reported as [`StoreError::NotFound`].
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<RawObject>;
}
