//! Represents a logical bucket as reported by the manager backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A storage bucket.
///
/// Bucket names are unique and immutable once created. The backend may omit
/// the creation date for storage providers that do not track it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Unique bucket name.
    pub name: String,

    /// When this bucket was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /buckets`.
#[derive(Serialize, Debug)]
pub struct CreateBucketReq<'a> {
    pub name: &'a str,
}

const BUCKET_NAME_MIN_LEN: usize = 3;

/// Reject bucket names the backend would refuse anyway.
///
/// Mirrors the backend's own checks (non-empty, at least three characters,
/// no `/`) so the user gets the message without a round trip.
pub fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("bucket name is required".into());
    }
    if name.len() < BUCKET_NAME_MIN_LEN {
        return Err(format!(
            "bucket name cannot be shorter than {} characters",
            BUCKET_NAME_MIN_LEN
        ));
    }
    if name.contains('/') {
        return Err("bucket name cannot contain `/`".into());
    }
    Ok(())
}
