//! Pages and queries for the paginated listing endpoints.

use crate::models::{bucket::Bucket, object::ObjectEntry};
use serde::{Deserialize, Deserializer};

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_count(count: u32) -> u32 {
    count.clamp(1, MAX_PAGE_SIZE)
}

/// Filters are prefix matches; surrounding whitespace is never meaningful.
pub fn normalize_filter(filter: &str) -> String {
    filter.trim().to_string()
}

/// One page of a listing.
///
/// `next_token == None` marks the end of the sequence. Any other value must be
/// passed back verbatim to continue.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Parameters of a single listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// Prefix to list under; `""` is the root. Ignored for bucket listings.
    pub path: String,
    /// Server-side filter applied to names.
    pub filter: String,
    /// Requested page size. Always within `1..=MAX_PAGE_SIZE`.
    count: u32,
    /// Continuation token from the previous page, if any.
    pub token: Option<String>,
}

impl ListingQuery {
    pub fn new(path: impl Into<String>, filter: impl Into<String>, count: u32) -> Self {
        Self {
            path: path.into(),
            filter: normalize_filter(&Into::<String>::into(filter)),
            count: clamp_count(count),
            token: None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = clamp_count(count);
    }

    /// Query-string pairs for this request. Empty values are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if !self.path.is_empty() {
            pairs.push(("path", self.path.clone()));
        }
        pairs.push(("count", self.count.to_string()));
        if !self.filter.is_empty() {
            pairs.push(("filter", self.filter.clone()));
        }
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("token", token.to_string()));
        }
        pairs
    }
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self::new("", "", DEFAULT_PAGE_SIZE)
    }
}

/// Wire body of `GET /buckets`.
#[derive(Debug, Deserialize)]
pub struct BucketPageBody {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub buckets: Vec<Bucket>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub next_token: Option<String>,
}

/// Wire body of `GET /buckets/{bucket}`.
#[derive(Debug, Deserialize)]
pub struct ObjectPageBody {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub list: Vec<ObjectEntry>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub next_token: Option<String>,
}

impl From<BucketPageBody> for Page<Bucket> {
    fn from(body: BucketPageBody) -> Self {
        Page {
            items: body.buckets,
            next_token: body.next_token,
        }
    }
}

impl From<ObjectPageBody> for Page<ObjectEntry> {
    fn from(body: ObjectPageBody) -> Self {
        Page {
            items: body.list,
            next_token: body.next_token,
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|t| !t.is_empty()))
}
