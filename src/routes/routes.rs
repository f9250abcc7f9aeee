//! Endpoints exposed by the manager backend, relative to its `/api` base URL.
//!
//! ## Structure
//! - **Bucket-level endpoints**
//!   - `GET    /buckets`           - list buckets (count, filter, token)
//!   - `POST   /buckets`           - create bucket (`{"name": ...}`)
//!   - `GET    /buckets/{bucket}`  - list objects (path, count, filter, token)
//!   - `DELETE /buckets/{bucket}`  - delete bucket (`?recursive=true`)
//!
//! - **Object-level endpoints**
//!   - `PUT    /buckets/{bucket}/objects`       - multipart upload (`key`, `file`)
//!   - `GET    /buckets/{bucket}/objects/{key}` - download
//!   - `DELETE /buckets/{bucket}/objects/{key}` - delete (`?recursive=true`)
//!
//! Keys travel as a single percent-encoded segment, so `photos/2025/img.jpg`
//! becomes `photos%2F2025%2Fimg.jpg`.

use crate::errors::{ClientError, ClientResult};
use reqwest::Url;

/// A backend endpoint with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Buckets,
    Bucket { bucket: &'a str },
    Objects { bucket: &'a str },
    Object { bucket: &'a str, key: &'a str },
}

impl Endpoint<'_> {
    /// Resolve this endpoint against the backend base URL.
    pub fn url(&self, base: &Url) -> ClientResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ClientError::validation(format!("endpoint `{}` cannot be a base URL", base))
            })?;
            segments.pop_if_empty().push("buckets");
            match *self {
                Endpoint::Buckets => {}
                Endpoint::Bucket { bucket } => {
                    segments.push(bucket);
                }
                Endpoint::Objects { bucket } => {
                    segments.push(bucket).push("objects");
                }
                Endpoint::Object { bucket, key } => {
                    segments.push(bucket).push("objects").push(key);
                }
            }
        }
        Ok(url)
    }
}

/// Parse and sanity-check the configured backend base URL.
pub fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let url = Url::parse(raw)
        .map_err(|err| ClientError::validation(format!("invalid endpoint `{}`: {}", raw, err)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::validation(format!(
            "endpoint `{}` must use http or https",
            raw
        )));
    }
    if url.cannot_be_a_base() {
        return Err(ClientError::validation(format!(
            "endpoint `{}` cannot be a base URL",
            raw
        )));
    }
    Ok(url)
}
