//! Object subcommands: list, upload, download, delete.
//!
//! Keys given on the command line are relative to `--path`, the same way the
//! listing shows them; they are joined into fully-qualified keys before any
//! request is made.

use crate::{
    config::{ListArgs, ObjectCommand},
    handlers::{HandlerContext, render},
    models::{
        page::ListingQuery,
        path::{compose_key, normalize_path},
    },
    services::{
        batch::{BatchReport, plan_uploads},
        listing::{ListingSession, ObjectSource},
    },
};
use anyhow::{Context, Result, bail};
use std::{io::Write, path::PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{info, warn};

pub async fn run<W: Write>(ctx: &HandlerContext, cmd: ObjectCommand, out: &mut W) -> Result<()> {
    match cmd {
        ObjectCommand::List { bucket, path, list } => {
            list_objects(ctx, &bucket, &path, list, out).await
        }
        ObjectCommand::Upload {
            bucket,
            files,
            path,
        } => upload_objects(ctx, &bucket, &path, files, out).await,
        ObjectCommand::Download {
            bucket,
            key,
            path,
            output,
        } => download_object(ctx, &bucket, &path, &key, output, out).await,
        ObjectCommand::Delete {
            bucket,
            keys,
            path,
            recursive,
        } => delete_objects(ctx, &bucket, &path, keys, recursive, out).await,
    }
}

pub async fn list_objects<W: Write>(
    ctx: &HandlerContext,
    bucket: &str,
    path: &str,
    args: ListArgs,
    out: &mut W,
) -> Result<()> {
    let count = args.count.unwrap_or(ctx.config.page_size);
    let query = ListingQuery::new(path, args.filter, count);
    let source = ObjectSource::new(ctx.client.clone(), bucket);
    let mut session = ListingSession::new(source, query);

    if args.all {
        session.load_all().await.context("loading objects")?;
    } else {
        session.load_more().await.context("loading objects")?;
    }

    writeln!(out, "{}:/{}", bucket, session.path())?;
    render::write_objects(out, session.items())?;
    if session.has_more() {
        writeln!(out, "... more objects available (use --all)")?;
    }
    Ok(())
}

pub async fn upload_objects<W: Write>(
    ctx: &HandlerContext,
    bucket: &str,
    path: &str,
    files: Vec<PathBuf>,
    out: &mut W,
) -> Result<()> {
    let path = normalize_path(path);
    let plan = plan_uploads(&path, &files).await;
    info!(bucket = %bucket, files = plan.len(), "uploading");

    let report = ctx
        .client
        .upload_many(&ctx.runner, bucket, plan)
        .await
        .context("uploading files")?;

    if report.is_success() {
        writeln!(out, "Successfully uploaded {} file(s)", report.succeeded)?;
    } else {
        writeln!(
            out,
            "Uploaded {} files, {} failed",
            report.succeeded, report.failed
        )?;
    }
    fail_on_errors("upload", &report, out)
}

pub async fn download_object<W: Write>(
    ctx: &HandlerContext,
    bucket: &str,
    path: &str,
    key: &str,
    output: Option<PathBuf>,
    out: &mut W,
) -> Result<()> {
    let full_key = compose_key(&normalize_path(path), key);
    let download = ctx
        .client
        .download_object(bucket, &full_key)
        .await
        .with_context(|| format!("downloading `{}`", full_key))?;

    match output {
        Some(dest) => {
            let mut file = File::create(&dest)
                .await
                .with_context(|| format!("creating {}", dest.display()))?;
            let written = match download.write_to(&mut file).await {
                Ok(written) => written,
                Err(err) => {
                    drop(file);
                    if let Err(rm_err) = tokio::fs::remove_file(&dest).await {
                        warn!(
                            path = %dest.display(),
                            error = %rm_err,
                            "could not remove partial download"
                        );
                    }
                    return Err(err).with_context(|| format!("downloading `{}`", full_key));
                }
            };
            file.sync_all().await?;
            writeln!(out, "Downloaded {} ({} bytes) to {}", full_key, written, dest.display())?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            download
                .write_to(&mut stdout)
                .await
                .with_context(|| format!("downloading `{}`", full_key))?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

pub async fn delete_objects<W: Write>(
    ctx: &HandlerContext,
    bucket: &str,
    path: &str,
    keys: Vec<String>,
    recursive: bool,
    out: &mut W,
) -> Result<()> {
    let path = normalize_path(path);
    let keys: Vec<String> = keys.iter().map(|k| compose_key(&path, k)).collect();

    if let [key] = keys.as_slice() {
        ctx.client
            .delete_object(bucket, key, recursive)
            .await
            .with_context(|| format!("deleting object `{}`", key))?;
        writeln!(out, "Object \"{}\" was deleted", key)?;
        return Ok(());
    }

    let report = ctx
        .client
        .delete_many(&ctx.runner, bucket, keys, recursive)
        .await
        .context("deleting objects")?;

    if report.is_success() {
        writeln!(out, "{} object(s) deleted", report.succeeded)?;
    } else {
        writeln!(
            out,
            "Deleted {} objects, {} failed",
            report.succeeded, report.failed
        )?;
    }
    fail_on_errors("delete", &report, out)
}

fn fail_on_errors<W: Write>(operation: &str, report: &BatchReport, out: &mut W) -> Result<()> {
    for failure in &report.failures {
        writeln!(out, "  {}: {}", failure.item, failure.error)?;
    }
    if report.failed > 0 {
        bail!(
            "{} of {} {} request(s) failed",
            report.failed,
            report.total(),
            operation
        );
    }
    Ok(())
}
