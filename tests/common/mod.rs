//! In-process mock of the manager backend.
//!
//! Serves the same REST surface as the real backend over an in-memory
//! bucket map, bound to an ephemeral port on 127.0.0.1. Continuation tokens
//! are base64-encoded offsets so the client can only treat them as opaque.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct MockBucket {
    pub created_at: Option<DateTime<Utc>>,
    pub objects: BTreeMap<String, Vec<u8>>,
}

/// One recorded request: method, request path and decoded query. Uploads
/// record their multipart `key` field as a query entry.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
pub struct MockState {
    pub buckets: BTreeMap<String, MockBucket>,
    /// Keys whose upload or delete is answered with a 500.
    pub fail_keys: HashSet<String>,
    /// Keys whose download body is cut off after the first chunk.
    pub truncated_keys: HashSet<String>,
    /// Number of upcoming listing calls to answer with a 503.
    pub fail_next_lists: usize,
    pub requests: Vec<Recorded>,
}

pub type Shared = Arc<Mutex<MockState>>;

pub struct MockServer {
    pub base_url: String,
    pub state: Shared,
}

impl MockServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = router().with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn add_bucket(&self, name: &str) {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single();
        self.state.lock().unwrap().buckets.insert(
            name.to_string(),
            MockBucket {
                created_at,
                objects: BTreeMap::new(),
            },
        );
    }

    pub fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .objects
            .insert(key.to_string(), data.to_vec());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    pub fn fail_key(&self, key: &str) {
        self.state.lock().unwrap().fail_keys.insert(key.to_string());
    }

    pub fn truncate_download(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .truncated_keys
            .insert(key.to_string());
    }

    pub fn fail_next_lists(&self, n: usize) {
        self.state.lock().unwrap().fail_next_lists = n;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Recorded requests matching `method`, oldest first.
    pub fn requests_for(&self, method: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

fn router() -> Router<Shared> {
    Router::new()
        .route("/api/buckets", get(list_buckets).post(create_bucket))
        .route("/api/buckets/{bucket}", get(list_objects).delete(delete_bucket))
        .route("/api/buckets/{bucket}/objects", put(upload_object))
        .route(
            "/api/buckets/{bucket}/objects/{key}",
            get(get_object).delete(delete_object),
        )
}

fn record(state: &mut MockState, method: &str, path: String, query: &HashMap<String, String>) {
    state.requests.push(Recorded {
        method: method.to_string(),
        path,
        query: query.clone(),
    });
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn encode_token(offset: usize) -> String {
    general_purpose::STANDARD.encode(offset.to_string())
}

fn decode_token(token: Option<&String>) -> Result<usize, Response> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(0);
    };
    general_purpose::STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "invalid continuation token"))
}

fn page_count(query: &HashMap<String, String>) -> Result<usize, Response> {
    match query.get("count") {
        None => Ok(50),
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=1000).contains(&n) => Ok(n),
            _ => Err(error(StatusCode::BAD_REQUEST, "invalid count")),
        },
    }
}

fn paginate(entries: Vec<Value>, offset: usize, count: usize) -> (Vec<Value>, Option<String>) {
    let start = offset.min(entries.len());
    let end = (start + count).min(entries.len());
    let next = (end < entries.len()).then(|| encode_token(end));
    (entries[start..end].to_vec(), next)
}

fn take_list_failure(state: &mut MockState) -> Option<Response> {
    if state.fail_next_lists > 0 {
        state.fail_next_lists -= 1;
        return Some(error(StatusCode::SERVICE_UNAVAILABLE, "backend unavailable"));
    }
    None
}

async fn list_buckets(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "GET", "/api/buckets".into(), &query);
    if let Some(resp) = take_list_failure(&mut state) {
        return resp;
    }

    let (count, offset) = match (page_count(&query), decode_token(query.get("token"))) {
        (Ok(c), Ok(o)) => (c, o),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let filter = query.get("filter").cloned().unwrap_or_default();

    let entries: Vec<Value> = state
        .buckets
        .iter()
        .filter(|(name, _)| name.starts_with(&filter))
        .map(|(name, b)| json!({ "name": name, "created_at": b.created_at }))
        .collect();
    let (page, next) = paginate(entries, offset, count);

    let mut body = json!({ "buckets": page });
    if let Some(next) = next {
        body["next_token"] = json!(next);
    }
    Json(body).into_response()
}

#[derive(Deserialize)]
struct CreateBucketBody {
    name: String,
}

async fn create_bucket(State(state): State<Shared>, Json(body): Json<CreateBucketBody>) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "POST", "/api/buckets".into(), &HashMap::new());
    if body.name.len() < 3 {
        return error(
            StatusCode::BAD_REQUEST,
            "Bucket name cannot be shorter than 3 characters",
        );
    }
    if state.buckets.contains_key(&body.name) {
        return error(StatusCode::CONFLICT, "Bucket already exists");
    }
    state.buckets.insert(
        body.name,
        MockBucket {
            created_at: Some(Utc::now()),
            objects: BTreeMap::new(),
        },
    );
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_bucket(
    State(state): State<Shared>,
    Path(bucket): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "DELETE", format!("/api/buckets/{}", bucket), &query);
    let recursive = query.get("recursive").map(String::as_str) == Some("true");

    let Some(existing) = state.buckets.get(&bucket) else {
        return error(StatusCode::NOT_FOUND, "bucket not found");
    };
    if !existing.objects.is_empty() && !recursive {
        return error(StatusCode::CONFLICT, "Bucket is not empty");
    }
    state.buckets.remove(&bucket);
    StatusCode::NO_CONTENT.into_response()
}

/// Delimiter listing: directories first, then files, each relative to `path`.
async fn list_objects(
    State(state): State<Shared>,
    Path(bucket): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "GET", format!("/api/buckets/{}", bucket), &query);
    if let Some(resp) = take_list_failure(&mut state) {
        return resp;
    }

    let (count, offset) = match (page_count(&query), decode_token(query.get("token"))) {
        (Ok(c), Ok(o)) => (c, o),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let Some(existing) = state.buckets.get(&bucket) else {
        return error(StatusCode::NOT_FOUND, "bucket not found");
    };

    let mut path_prefix = query.get("path").cloned().unwrap_or_default();
    if !path_prefix.is_empty() && !path_prefix.ends_with('/') {
        path_prefix.push('/');
    }
    let prefix = format!(
        "{}{}",
        path_prefix,
        query.get("filter").cloned().unwrap_or_default()
    );

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for (key, data) in existing.objects.range(prefix.clone()..) {
        if !key.starts_with(&prefix) {
            break;
        }
        let rel = &key[path_prefix.len()..];
        match rel.find('/') {
            Some(pos) => {
                let dir = &rel[..pos];
                if dirs.last().map(String::as_str) != Some(dir) {
                    dirs.push(dir.to_string());
                }
            }
            None => files.push(json!({
                "key": rel,
                "size": data.len(),
                "last_modified": "2025-01-01T00:00:00Z",
            })),
        }
    }

    let mut entries: Vec<Value> = dirs
        .into_iter()
        .map(|d| json!({ "key": d, "is_dir": true }))
        .collect();
    entries.extend(files);
    let (page, next) = paginate(entries, offset, count);

    let mut body = json!({ "list": page });
    if let Some(next) = next {
        body["next_token"] = json!(next);
    }
    Json(body).into_response()
}

async fn upload_object(
    State(state): State<Shared>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let mut key = None;
    let mut data = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().map(str::to_string);
                let bytes: Bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(err) => return error(StatusCode::BAD_REQUEST, &err.to_string()),
                };
                match name.as_deref() {
                    Some("key") => key = Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Some("file") => data = Some(bytes.to_vec()),
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(err) => return error(StatusCode::BAD_REQUEST, &err.to_string()),
        }
    }

    let mut state = state.lock().unwrap();
    record(
        &mut state,
        "PUT",
        format!("/api/buckets/{}/objects", bucket),
        &key.iter().map(|k| ("key".to_string(), k.clone())).collect::<HashMap<_, _>>(),
    );
    let (Some(key), Some(data)) = (key, data) else {
        return error(StatusCode::BAD_REQUEST, "key and file are required");
    };
    if state.fail_keys.contains(&key) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "upload rejected");
    }
    let Some(existing) = state.buckets.get_mut(&bucket) else {
        return error(StatusCode::NOT_FOUND, "bucket not found");
    };
    existing.objects.insert(key, data);
    StatusCode::CREATED.into_response()
}

async fn get_object(
    State(state): State<Shared>,
    Path((bucket, key)): Path<(String, String)>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(
        &mut state,
        "GET",
        format!("/api/buckets/{}/objects/{}", bucket, key),
        &HashMap::new(),
    );
    let truncated = state.truncated_keys.contains(&key);
    match state.buckets.get(&bucket).and_then(|b| b.objects.get(&key)) {
        Some(data) if truncated => {
            let half = Bytes::copy_from_slice(&data[..data.len() / 2]);
            let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                Ok(half),
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection dropped",
                )),
            ];
            (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                Body::from_stream(futures::stream::iter(chunks)),
            )
                .into_response()
        }
        Some(data) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            data.clone(),
        )
            .into_response(),
        None => error(StatusCode::NOT_FOUND, "object not found"),
    }
}

async fn delete_object(
    State(state): State<Shared>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(
        &mut state,
        "DELETE",
        format!("/api/buckets/{}/objects/{}", bucket, key),
        &query,
    );
    if state.fail_keys.contains(&key) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "delete rejected");
    }
    let recursive = query.get("recursive").map(String::as_str) == Some("true");
    let Some(existing) = state.buckets.get_mut(&bucket) else {
        return error(StatusCode::NOT_FOUND, "bucket not found");
    };

    let dir_prefix = format!("{}/", key.trim_end_matches('/'));
    let has_children = existing.objects.keys().any(|k| k.starts_with(&dir_prefix));
    if has_children && !recursive {
        return error(StatusCode::BAD_REQUEST, "directory is not empty");
    }
    existing.objects.retain(|k, _| k != &key && !k.starts_with(&dir_prefix));
    StatusCode::NO_CONTENT.into_response()
}
