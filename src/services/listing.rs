//! Paginated listing sessions.
//!
//! A [`ListingSession`] owns the state of one listing view: the current
//! path, filter and page size, the continuation token of the last page, and
//! the items accumulated so far. Changing any of path, filter or count starts
//! a new session at `token = None`; tokens are only ever replayed verbatim.

use crate::{
    errors::ClientResult,
    models::{
        bucket::Bucket,
        object::ObjectEntry,
        page::{ListingQuery, Page, normalize_filter},
        path::{compose_key, normalize_path, parent_path},
    },
    services::api_client::ApiClient,
};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Something that can serve one page of a listing for a query.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch the page selected by `query.token`.
    async fn fetch_page(&self, query: &ListingQuery) -> ClientResult<Page<Self::Item>>;

    /// Fully-qualified identity of `item` when listed under `query`.
    fn item_key(&self, query: &ListingQuery, item: &Self::Item) -> String;
}

/// Pages through `GET /buckets`.
#[derive(Clone, Debug)]
pub struct BucketSource {
    client: ApiClient,
}

impl BucketSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for BucketSource {
    type Item = Bucket;

    async fn fetch_page(&self, query: &ListingQuery) -> ClientResult<Page<Bucket>> {
        self.client.list_buckets(query).await
    }

    fn item_key(&self, _query: &ListingQuery, item: &Bucket) -> String {
        item.name.clone()
    }
}

/// Pages through `GET /buckets/{bucket}`.
#[derive(Clone, Debug)]
pub struct ObjectSource {
    client: ApiClient,
    bucket: String,
}

impl ObjectSource {
    pub fn new(client: ApiClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl PageSource for ObjectSource {
    type Item = ObjectEntry;

    async fn fetch_page(&self, query: &ListingQuery) -> ClientResult<Page<ObjectEntry>> {
        self.client.list_objects(&self.bucket, query).await
    }

    fn item_key(&self, query: &ListingQuery, item: &ObjectEntry) -> String {
        item.full_key(&query.path)
    }
}

/// State of one listing view.
pub struct ListingSession<S: PageSource> {
    source: S,
    query: ListingQuery,
    items: Vec<S::Item>,
    seen: HashSet<String>,
    duplicates: usize,
    exhausted: bool,
    pages_loaded: usize,
}

impl<S: PageSource> ListingSession<S> {
    /// Start a session. Any token already present on `query` is discarded.
    pub fn new(source: S, mut query: ListingQuery) -> Self {
        query.token = None;
        query.path = normalize_path(&query.path);
        query.filter = normalize_filter(&query.filter);
        Self {
            source,
            query,
            items: Vec::new(),
            seen: HashSet::new(),
            duplicates: 0,
            exhausted: false,
            pages_loaded: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub fn path(&self) -> &str {
        &self.query.path
    }

    pub fn filter(&self) -> &str {
        &self.query.filter
    }

    pub fn count(&self) -> u32 {
        self.query.count()
    }

    /// Token that the next `load_more` will send, if any.
    pub fn next_token(&self) -> Option<&str> {
        self.query.token.as_deref()
    }

    /// Items accumulated since the session (re)started, in page order.
    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<S::Item> {
        self.items
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Items whose fully-qualified key had already been listed since the
    /// session (re)started. They are kept in `items`, not dropped.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Whether another page may exist. True before the first fetch.
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Drop accumulated state and start over at `token = None`.
    pub fn reset(&mut self) {
        self.query.token = None;
        self.items.clear();
        self.seen.clear();
        self.duplicates = 0;
        self.exhausted = false;
        self.pages_loaded = 0;
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.query.filter = normalize_filter(filter);
        self.reset();
    }

    pub fn set_path(&mut self, path: &str) {
        self.query.path = normalize_path(path);
        self.reset();
    }

    /// Change the page size (clamped to the backend maximum). In-flight pages
    /// are never resized; the session restarts instead.
    pub fn set_count(&mut self, count: u32) {
        self.query.set_count(count);
        self.reset();
    }

    /// Fetch the next page and append it.
    ///
    /// Returns the newly appended items. Once the backend has returned a page
    /// without a token this returns an empty slice without issuing a request.
    /// On error nothing in the session changes, so the call can be retried.
    pub async fn load_more(&mut self) -> ClientResult<&[S::Item]> {
        if self.exhausted {
            return Ok(&[]);
        }

        let page = self.source.fetch_page(&self.query).await?;
        let start = self.items.len();
        debug!(
            path = %self.query.path,
            filter = %self.query.filter,
            count = self.query.count(),
            received = page.items.len(),
            more = page.next_token.is_some(),
            "listing page loaded"
        );

        for item in page.items {
            let key = self.source.item_key(&self.query, &item);
            if !self.seen.insert(key.clone()) {
                warn!(key = %key, "listing returned a key already seen in this session");
                self.duplicates += 1;
            }
            self.items.push(item);
        }

        self.exhausted = page.next_token.is_none();
        self.query.token = page.next_token;
        self.pages_loaded += 1;

        Ok(&self.items[start..])
    }

    /// Follow continuation tokens until the end of the sequence.
    pub async fn load_all(&mut self) -> ClientResult<&[S::Item]> {
        while self.has_more() {
            self.load_more().await?;
        }
        Ok(&self.items)
    }
}

impl<S: PageSource<Item = ObjectEntry>> ListingSession<S> {
    /// Fully-qualified key of an entry listed in this session.
    pub fn full_key(&self, entry: &ObjectEntry) -> String {
        entry.full_key(&self.query.path)
    }

    /// Descend into a directory entry. Returns `false` (and leaves the
    /// session alone) for regular objects.
    pub fn open_dir(&mut self, entry: &ObjectEntry) -> bool {
        if !entry.is_dir {
            return false;
        }
        let path = compose_key(&self.query.path, &entry.key);
        self.set_path(&path);
        true
    }

    /// Move one level up. Returns `false` at the root.
    pub fn go_up(&mut self) -> bool {
        if self.query.path.is_empty() {
            return false;
        }
        let parent = parent_path(&self.query.path).to_string();
        self.set_path(&parent);
        true
    }
}
