//! Represents one row of an object listing.

use crate::models::path::compose_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry within an object listing.
///
/// `key` is relative to the path the listing was requested for, so it is not
/// unique across a bucket. Directory entries are synthesized by the backend
/// from common key prefixes and carry neither size nor modification time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Key segment relative to the listing path.
    pub key: String,

    /// Size in bytes; absent for directories.
    #[serde(default)]
    pub size: Option<i64>,

    /// Timestamp when the object was last modified; absent for directories.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// Whether this entry groups keys under a common prefix.
    #[serde(default)]
    pub is_dir: bool,
}

impl ObjectEntry {
    /// Fully-qualified key of this entry for a listing made at `path`.
    ///
    /// Use this for downloads, deletes and navigation; never the bare `key`.
    pub fn full_key(&self, path: &str) -> String {
        compose_key(path, &self.key)
    }
}
