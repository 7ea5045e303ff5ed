//! In-memory object store for tests

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use super::client::{
    BodyStream, BucketRef, ListingPage, ObjectStore, ObjectSummary, RawObject, StoreError,
    StoreResult,
};
use super::reader::BucketReader;

pub(crate) const TEST_BUCKET: &str = "test-bucket";

/// Summaries `TestKey0..TestKey{size-1}`
pub(crate) fn test_list(size: usize) -> Vec<ObjectSummary> {
    (0..size)
        .map(|i| ObjectSummary::with_key(TEST_BUCKET, &format!("TestKey{}", i)))
        .collect()
}

/// Summaries `p{page}-TestKey0..p{page}-TestKey{size-1}`
pub(crate) fn page_list(page: usize, size: usize) -> Vec<ObjectSummary> {
    (0..size)
        .map(|i| ObjectSummary::with_key(TEST_BUCKET, &format!("p{}-TestKey{}", page, i)))
        .collect()
}

/// Keys of `MockStore::paged(count, size)` in listing order
pub(crate) fn paged_keys(count: usize, size: usize) -> Vec<String> {
    (0..count)
        .flat_map(|page| page_list(page, size))
        .map(|summary| summary.key)
        .collect()
}

fn body(chunks: Vec<io::Result<Bytes>>) -> BodyStream {
    futures::stream::iter(chunks).boxed()
}

/// How the store answers a fetch for one key
pub(crate) enum Fetch {
    Body(&'static str),
    /// Stream fails after the first chunk
    Broken,
    Missing,
    Rejected,
}

/// Store serving a fixed sequence of listing pages and canned objects
#[derive(Default)]
pub(crate) struct MockStore {
    pub(crate) pages: Vec<StoreResult<ListingPage>>,
    pub(crate) objects: Vec<(&'static str, Fetch)>,
    /// Cursor presented on each listing request, in order
    pub(crate) cursors: Mutex<Vec<Option<String>>>,
    /// Keys requested through `get_object`, in order
    pub(crate) fetched: Mutex<Vec<String>>,
}

impl MockStore {
    /// `count` pages of `size` distinct entries each, chained by tokens
    pub(crate) fn paged(count: usize, size: usize) -> Self {
        let pages = (0..count)
            .map(|i| {
                if i + 1 < count {
                    Ok(ListingPage::truncated(page_list(i, size), format!("token-{}", i + 1)))
                } else {
                    Ok(ListingPage::last(page_list(i, size)))
                }
            })
            .collect();
        Self { pages, ..Default::default() }
    }

    /// A single listing page holding `objects` in order
    pub(crate) fn with_objects(objects: Vec<(&'static str, Fetch)>) -> Self {
        let keys = objects
            .iter()
            .map(|(key, _)| ObjectSummary::with_key(TEST_BUCKET, key))
            .collect();
        Self { pages: vec![Ok(ListingPage::last(keys))], objects, ..Default::default() }
    }

    /// Every listing request fails with a client error
    pub(crate) fn unreachable() -> Self {
        Self {
            pages: vec![Err(StoreError::Client("connection refused".to_string()))],
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn list_page(&self, bucket: &str, cursor: Option<&str>) -> StoreResult<ListingPage> {
        assert_eq!(bucket, TEST_BUCKET);
        self.cursors.lock().unwrap().push(cursor.map(String::from));

        // no cursor starts a new listing; a token selects the page after its issuer
        let index = match cursor {
            None => 0,
            Some(token) => {
                let issuer = self.pages.iter().position(|page| {
                    matches!(page, Ok(p) if p.continuation_token.as_deref() == Some(token))
                });
                match issuer {
                    Some(i) => i + 1,
                    None => panic!("unknown continuation token {}", token),
                }
            }
        };

        match self.pages.get(index) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(e)) => Err(e.clone()),
            None => panic!("listing requested past the last page"),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<RawObject> {
        assert_eq!(bucket, TEST_BUCKET);
        self.fetched.lock().unwrap().push(key.to_string());

        match self.objects.iter().find(|(k, _)| *k == key).map(|(_, f)| f) {
            Some(Fetch::Body(text)) => Ok(RawObject {
                metadata: BTreeMap::new(),
                body: body(vec![Ok(Bytes::from(text.to_string()))]),
            }),
            Some(Fetch::Broken) => Ok(RawObject {
                metadata: BTreeMap::new(),
                body: body(vec![
                    Ok(Bytes::from_static(b"Hello")),
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
                ]),
            }),
            Some(Fetch::Rejected) => Err(StoreError::Service("AccessDenied".to_string())),
            Some(Fetch::Missing) | None => Err(StoreError::NotFound(key.to_string())),
        }
    }
}

/// Reader over `store`, returning the store for inspection
pub(crate) fn test_reader(store: MockStore) -> (BucketReader, Arc<MockStore>) {
    let store = Arc::new(store);
    let bucket = BucketRef::new(TEST_BUCKET, "http://localhost:9000", "us-east-1");
    (BucketReader::new(bucket, store.clone()), store)
}
