//! Command handlers for the `s3manager` binary.
//!
//! Each handler performs one user-level action through the API client and
//! writes a human-readable result to the supplied writer; logs go to stderr.

pub mod bucket_handlers;
pub mod object_handlers;
pub mod render;

use crate::{
    config::{AppConfig, Command},
    services::{api_client::ApiClient, batch::BatchRunner},
};
use anyhow::{Context, Result};
use std::io::Write;

/// Everything a handler needs: the client, the merged config and the batch
/// runner sized from it.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    pub client: ApiClient,
    pub config: AppConfig,
    pub runner: BatchRunner,
}

impl HandlerContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = ApiClient::new(&config.endpoint)
            .with_context(|| format!("configuring client for {}", config.endpoint))?;
        Ok(Self {
            client,
            runner: BatchRunner::new(config.concurrency),
            config,
        })
    }
}

/// Dispatch a parsed command.
pub async fn dispatch<W: Write>(ctx: &HandlerContext, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Buckets(cmd) => bucket_handlers::run(ctx, cmd, out).await,
        Command::Objects(cmd) => object_handlers::run(ctx, cmd, out).await,
    }
}
