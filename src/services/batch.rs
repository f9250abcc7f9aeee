//! Multi-item uploads and deletes.
//!
//! Every item is an independent request: one failure never aborts the rest,
//! and the caller gets aggregate counts back. Items run through a queue with
//! a concurrency cap; a cap of 1 awaits each request before starting the next.

use crate::{
    errors::{ClientError, ClientResult},
    models::path::compose_key,
    services::api_client::ApiClient,
};
use futures::{StreamExt, stream};
use std::{
    fmt,
    future::Future,
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{info, warn};

/// Outcome of one failed item.
#[derive(Debug)]
pub struct BatchFailure {
    pub item: String,
    pub error: ClientError,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Failed items in submission order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs batch items through a bounded queue.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    concurrency: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::sequential()
    }
}

impl BatchRunner {
    /// A runner with at most `concurrency` requests in flight (minimum 1).
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// One request at a time, in order.
    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Apply `op` to every item and count the outcomes.
    ///
    /// `operation` names the batch in logs. An empty batch is rejected as a
    /// validation error since there is nothing selected to act on.
    pub async fn run<T, F, Fut, R>(
        &self,
        operation: &str,
        items: Vec<T>,
        mut op: F,
    ) -> ClientResult<BatchReport>
    where
        T: fmt::Display,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ClientResult<R>>,
    {
        if items.is_empty() {
            return Err(ClientError::validation(format!(
                "{}: nothing selected",
                operation
            )));
        }

        let outcomes: Vec<(String, ClientResult<R>)> = stream::iter(items)
            .map(|item| {
                let label = item.to_string();
                let fut = op(item);
                async move { (label, fut.await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (item, outcome) in outcomes {
            match outcome {
                Ok(_) => report.succeeded += 1,
                Err(error) => {
                    warn!(operation, item = %item, error = %error, "batch item failed");
                    report.failed += 1;
                    report.failures.push(BatchFailure { item, error });
                }
            }
        }

        info!(
            operation,
            succeeded = report.succeeded,
            failed = report.failed,
            "batch finished"
        );
        Ok(report)
    }
}

/// One file scheduled for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    /// Fully-qualified destination key.
    pub key: String,
    /// Local file to read.
    pub source: PathBuf,
}

impl fmt::Display for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// A planned upload entry.
#[derive(Debug)]
pub enum PlannedUpload {
    File(UploadItem),
    /// A source that could not be read. It counts as a failed item without
    /// issuing a request.
    Unreadable { source: PathBuf, error: ClientError },
}

impl fmt::Display for PlannedUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedUpload::File(item) => fmt::Display::fmt(item, f),
            PlannedUpload::Unreadable { source, .. } => write!(f, "{}", source.display()),
        }
    }
}

/// Expand local files and directories into upload entries under `path`.
///
/// A file becomes `path/<file name>`. A directory is walked and each file
/// inside keeps its location relative to the directory's parent, so
/// uploading `photos/` yields keys such as `path/photos/2025/a.jpg`.
/// Sources keep the order they were given in; files found inside a
/// directory are sorted by key. A source that cannot be read becomes an
/// `Unreadable` entry in its place.
pub async fn plan_uploads(path: &str, sources: &[PathBuf]) -> Vec<PlannedUpload> {
    let mut plan = Vec::new();
    for source in sources {
        match plan_source(path, source).await {
            Ok(items) => plan.extend(items.into_iter().map(PlannedUpload::File)),
            Err(error) => {
                warn!(source = %source.display(), error = %error, "cannot read upload source");
                plan.push(PlannedUpload::Unreadable {
                    source: source.clone(),
                    error,
                });
            }
        }
    }
    plan
}

async fn plan_source(path: &str, source: &Path) -> ClientResult<Vec<UploadItem>> {
    let meta = fs::metadata(source)
        .await
        .map_err(|err| with_path(err, source))?;
    let name = file_name(source)?;
    if !meta.is_dir() {
        return Ok(vec![UploadItem {
            key: compose_key(path, &name),
            source: source.to_path_buf(),
        }]);
    }

    let mut items = Vec::new();
    let mut pending = vec![(source.to_path_buf(), name)];
    while let Some((dir, rel)) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|err| with_path(err, &dir))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| with_path(err, &dir))?
        {
            let child = entry.path();
            let child_rel = format!("{}/{}", rel, file_name(&child)?);
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| with_path(err, &child))?;
            if file_type.is_dir() {
                pending.push((child, child_rel));
            } else {
                items.push(UploadItem {
                    key: compose_key(path, &child_rel),
                    source: child,
                });
            }
        }
    }

    items.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(items)
}

/// Prefix an I/O error with the path it concerns.
pub(crate) fn with_path(err: io::Error, path: &Path) -> ClientError {
    ClientError::Io(io::Error::new(
        err.kind(),
        format!("{}: {}", path.display(), err),
    ))
}

fn file_name(path: &Path) -> ClientResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ClientError::validation(format!("`{}` has no file name", path.display()))
        })
}

impl ApiClient {
    /// Upload every planned file, each as its own request.
    pub async fn upload_many(
        &self,
        runner: &BatchRunner,
        bucket: &str,
        plan: Vec<PlannedUpload>,
    ) -> ClientResult<BatchReport> {
        runner
            .run("upload", plan, |planned| async move {
                match planned {
                    PlannedUpload::File(item) => {
                        self.upload_file(bucket, &item.key, &item.source).await
                    }
                    PlannedUpload::Unreadable { error, .. } => Err(error),
                }
            })
            .await
    }

    /// Delete every key, each as its own request.
    pub async fn delete_many(
        &self,
        runner: &BatchRunner,
        bucket: &str,
        keys: Vec<String>,
        recursive: bool,
    ) -> ClientResult<BatchReport> {
        runner
            .run("delete", keys, |key| async move {
                self.delete_object(bucket, &key, recursive).await
            })
            .await
    }
}
