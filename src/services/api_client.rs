//! src/services/api_client.rs
//!
//! ApiClient - one request per backend operation against the manager's REST
//! API. There is no retry, caching, or compensation here: each call either
//! succeeds or surfaces the backend's answer verbatim as a `ClientError`.

use crate::{
    errors::{ClientError, ClientResult},
    models::{
        bucket::{Bucket, CreateBucketReq, validate_bucket_name},
        object::ObjectEntry,
        page::{BucketPageBody, ListingQuery, ObjectPageBody, Page},
    },
    routes::routes::{Endpoint, parse_base_url},
    services::batch::with_path,
};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{
    Body, Client, Method, RequestBuilder, Response, Url,
    header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const OCTET_STREAM: &str = "application/octet-stream";

/// Thin typed wrapper over the manager backend.
///
/// Cheap to clone: the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

/// An object download whose body has not been consumed yet.
#[derive(Debug)]
pub struct ObjectDownload {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    response: Response,
}

impl ObjectDownload {
    /// Stream the body into `writer`, returning the number of bytes written.
    pub async fn write_to<W>(self, writer: &mut W) -> ClientResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written: u64 = 0;
        let mut stream = self.response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Buffer the whole body in memory.
    pub async fn bytes(self) -> ClientResult<Bytes> {
        Ok(self.response.bytes().await?)
    }
}

impl ApiClient {
    /// Create a client for the backend rooted at `base_url` (including the
    /// `/api` prefix), using transport defaults for timeouts.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = Client::builder().build()?;
        Self::with_client(base_url, http)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: Client) -> ClientResult<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch one page of buckets. `query.path` is ignored.
    pub async fn list_buckets(&self, query: &ListingQuery) -> ClientResult<Page<Bucket>> {
        let url = Endpoint::Buckets.url(&self.base_url)?;
        let mut pairs = query.query_pairs();
        pairs.retain(|(name, _)| *name != "path");
        let request = self.http.get(url).query(&pairs);
        let body: BucketPageBody = self.send_json(Method::GET, request).await?;
        Ok(body.into())
    }

    /// Fetch one page of objects under `query.path` in `bucket`.
    pub async fn list_objects(
        &self,
        bucket: &str,
        query: &ListingQuery,
    ) -> ClientResult<Page<ObjectEntry>> {
        ensure_bucket(bucket)?;
        let url = Endpoint::Bucket { bucket }.url(&self.base_url)?;
        let request = self.http.get(url).query(&query.query_pairs());
        let body: ObjectPageBody = self.send_json(Method::GET, request).await?;
        Ok(body.into())
    }

    /// Create a bucket.
    ///
    /// Returns `Validation` for names the backend would reject and `Conflict`
    /// when the bucket already exists.
    pub async fn create_bucket(&self, name: &str) -> ClientResult<()> {
        ensure_bucket(name)?;
        let url = Endpoint::Buckets.url(&self.base_url)?;
        let request = self.http.post(url).json(&CreateBucketReq { name });
        self.send(Method::POST, request).await?;
        info!(bucket = %name, "bucket created");
        Ok(())
    }

    /// Delete a bucket. Without `recursive` the backend refuses non-empty
    /// buckets, which surfaces as an error rather than a no-op.
    pub async fn delete_bucket(&self, name: &str, recursive: bool) -> ClientResult<()> {
        ensure_bucket(name)?;
        let url = Endpoint::Bucket { bucket: name }.url(&self.base_url)?;
        let request = self.http.delete(url).query(&recursive_param(recursive));
        self.send(Method::DELETE, request).await?;
        info!(bucket = %name, recursive, "bucket deleted");
        Ok(())
    }

    /// Upload the file at `source` as `key`, streaming it from disk.
    ///
    /// Returns the number of bytes sent.
    pub async fn upload_file(&self, bucket: &str, key: &str, source: &Path) -> ClientResult<u64> {
        let file = File::open(source)
            .await
            .map_err(|err| with_path(err, source))?;
        let len = file
            .metadata()
            .await
            .map_err(|err| with_path(err, source))?
            .len();
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.rsplit('/').next().unwrap_or(key).to_string());

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, len)
            .file_name(file_name)
            .mime_str(OCTET_STREAM)?;
        self.put_object(bucket, key, part).await?;
        Ok(len)
    }

    /// Upload an in-memory payload as `key`.
    pub async fn upload_bytes(&self, bucket: &str, key: &str, data: Bytes) -> ClientResult<u64> {
        let len = data.len() as u64;
        let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
        let part = Part::stream_with_length(Body::from(data), len)
            .file_name(file_name)
            .mime_str(OCTET_STREAM)?;
        self.put_object(bucket, key, part).await?;
        Ok(len)
    }

    async fn put_object(&self, bucket: &str, key: &str, file: Part) -> ClientResult<()> {
        ensure_bucket(bucket)?;
        ensure_key(key)?;
        let url = Endpoint::Objects { bucket }.url(&self.base_url)?;
        let form = Form::new().text("key", key.to_string()).part("file", file);
        let request = self.http.put(url).multipart(form);
        self.send(Method::PUT, request).await?;
        debug!(bucket = %bucket, key = %key, "object uploaded");
        Ok(())
    }

    /// Start downloading `key`. The body is streamed by the returned handle.
    pub async fn download_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectDownload> {
        let url = self.download_url(bucket, key)?;
        let response = self.send(Method::GET, self.http.get(url)).await?;

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        Ok(ObjectDownload {
            content_type,
            content_length,
            response,
        })
    }

    /// Direct URL of an object, suitable for handing to a browser.
    pub fn download_url(&self, bucket: &str, key: &str) -> ClientResult<Url> {
        ensure_bucket(bucket)?;
        ensure_key(key)?;
        Endpoint::Object { bucket, key }.url(&self.base_url)
    }

    /// Delete `key`; `recursive` removes everything under it when it names a
    /// directory.
    pub async fn delete_object(&self, bucket: &str, key: &str, recursive: bool) -> ClientResult<()> {
        ensure_bucket(bucket)?;
        ensure_key(key)?;
        let url = Endpoint::Object { bucket, key }.url(&self.base_url)?;
        let request = self.http.delete(url).query(&recursive_param(recursive));
        self.send(Method::DELETE, request).await?;
        debug!(bucket = %bucket, key = %key, recursive, "object deleted");
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let response = self.send(method, request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Issue a request tagged with a fresh request id and map non-2xx
    /// statuses to `ClientError`.
    async fn send(&self, method: Method, request: RequestBuilder) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let request = match HeaderValue::from_str(&request_id) {
            Ok(value) => request.header(REQUEST_ID_HEADER, value),
            Err(_) => request,
        };

        let response = request.send().await.inspect_err(|err| {
            debug!(%method, request_id = %request_id, error = %err, "request failed");
        })?;

        let status = response.status();
        debug!(
            %method,
            url = %response.url(),
            request_id = %request_id,
            status = status.as_u16(),
            "response received"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_status(status, body))
    }
}

fn recursive_param(recursive: bool) -> Vec<(&'static str, &'static str)> {
    if recursive {
        vec![("recursive", "true")]
    } else {
        Vec::new()
    }
}

fn ensure_bucket(name: &str) -> ClientResult<()> {
    validate_bucket_name(name).map_err(ClientError::Validation)
}

fn ensure_key(key: &str) -> ClientResult<()> {
    if key.trim().is_empty() {
        return Err(ClientError::validation("object key is required"));
    }
    Ok(())
}
