use crate::models::page::{DEFAULT_PAGE_SIZE, clamp_count};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::{env, path::PathBuf, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL, including the `/api` prefix.
    pub endpoint: String,
    /// Default page size for listings.
    pub page_size: u32,
    /// Maximum requests in flight for multi-item uploads and deletes.
    pub concurrency: usize,
}

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/api";
const DEFAULT_CONCURRENCY: usize = 1;

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Command-line client for the S3 manager API")]
pub struct Args {
    /// Backend base URL (overrides S3MANAGER_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Default page size, at most 1000 (overrides S3MANAGER_PAGE_SIZE)
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Parallel requests for multi-file uploads/deletes (overrides S3MANAGER_CONCURRENCY)
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bucket operations
    #[command(subcommand)]
    Buckets(BucketCommand),

    /// Object operations
    #[command(subcommand)]
    Objects(ObjectCommand),
}

/// Listing flags shared by buckets and objects.
#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Only show entries matching this filter
    #[arg(long, default_value = "")]
    pub filter: String,

    /// Page size for this listing
    #[arg(long)]
    pub count: Option<u32>,

    /// Follow continuation tokens to the end instead of printing one page
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BucketCommand {
    /// List buckets
    List(ListArgs),

    /// Create a bucket
    Create { name: String },

    /// Delete a bucket
    Delete {
        name: String,
        /// Remove every object in the bucket as well
        #[arg(long)]
        recursive: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ObjectCommand {
    /// List objects under a path
    List {
        bucket: String,
        /// Directory to list; empty is the bucket root
        #[arg(long, default_value = "")]
        path: String,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Upload files or directories
    Upload {
        bucket: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory to upload into
        #[arg(long, default_value = "")]
        path: String,
    },

    /// Download an object
    Download {
        bucket: String,
        key: String,
        /// Directory the key is relative to
        #[arg(long, default_value = "")]
        path: String,
        /// Destination file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete objects
    Delete {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
        /// Directory the keys are relative to
        #[arg(long, default_value = "")]
        path: String,
        /// Delete directories with everything under them
        #[arg(long)]
        recursive: bool,
    },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        let args = Args::parse();
        let cfg = Self::merge(&args, |name| env::var(name))?;
        Ok((cfg, args.command))
    }

    /// Merge parsed args over environment values read through `lookup`.
    pub fn merge<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_endpoint = lookup("S3MANAGER_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
        let env_page_size = parse_env(&lookup, "S3MANAGER_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let env_concurrency = parse_env(&lookup, "S3MANAGER_CONCURRENCY", DEFAULT_CONCURRENCY)?;

        // --- Merge ---
        Ok(Self {
            endpoint: args.endpoint.clone().unwrap_or(env_endpoint),
            page_size: clamp_count(args.page_size.unwrap_or(env_page_size)),
            concurrency: args.concurrency.unwrap_or(env_concurrency).max(1),
        })
    }
}

fn parse_env<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
