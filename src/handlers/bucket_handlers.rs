//! Bucket subcommands: list, create, delete.

use crate::{
    config::{BucketCommand, ListArgs},
    handlers::{HandlerContext, render},
    models::page::ListingQuery,
    services::listing::{BucketSource, ListingSession},
};
use anyhow::{Context, Result};
use std::io::Write;

pub async fn run<W: Write>(ctx: &HandlerContext, cmd: BucketCommand, out: &mut W) -> Result<()> {
    match cmd {
        BucketCommand::List(args) => list_buckets(ctx, args, out).await,
        BucketCommand::Create { name } => create_bucket(ctx, &name, out).await,
        BucketCommand::Delete { name, recursive } => {
            delete_bucket(ctx, &name, recursive, out).await
        }
    }
}

/// One page of buckets, or every page with `--all`.
pub async fn list_buckets<W: Write>(ctx: &HandlerContext, args: ListArgs, out: &mut W) -> Result<()> {
    let count = args.count.unwrap_or(ctx.config.page_size);
    let query = ListingQuery::new("", args.filter, count);
    let mut session = ListingSession::new(BucketSource::new(ctx.client.clone()), query);

    if args.all {
        session.load_all().await.context("loading buckets")?;
    } else {
        session.load_more().await.context("loading buckets")?;
    }

    render::write_buckets(out, session.items())?;
    if session.has_more() {
        writeln!(out, "... more buckets available (use --all)")?;
    }
    Ok(())
}

pub async fn create_bucket<W: Write>(ctx: &HandlerContext, name: &str, out: &mut W) -> Result<()> {
    ctx.client
        .create_bucket(name)
        .await
        .with_context(|| format!("creating bucket `{}`", name))?;
    writeln!(out, "Bucket \"{}\" created", name)?;
    Ok(())
}

pub async fn delete_bucket<W: Write>(
    ctx: &HandlerContext,
    name: &str,
    recursive: bool,
    out: &mut W,
) -> Result<()> {
    ctx.client
        .delete_bucket(name, recursive)
        .await
        .with_context(|| format!("deleting bucket `{}`", name))?;
    writeln!(out, "Bucket \"{}\" was deleted", name)?;
    Ok(())
}
