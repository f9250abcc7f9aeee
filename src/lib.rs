//! Client for the S3 manager REST API.
//!
//! - [`services::api_client::ApiClient`] issues one request per backend operation.
//! - [`services::listing::ListingSession`] pages through bucket and object
//!   listings with opaque continuation tokens.
//! - [`services::batch::BatchRunner`] runs multi-item uploads and deletes with
//!   per-item success/failure accounting.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use errors::{ClientError, ClientResult};
pub use models::{
    bucket::Bucket,
    object::ObjectEntry,
    page::{ListingQuery, Page},
};
pub use services::{
    api_client::ApiClient,
    batch::{BatchReport, BatchRunner, PlannedUpload, UploadItem},
    listing::{BucketSource, ListingSession, ObjectSource, PageSource},
};
