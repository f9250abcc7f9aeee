//! Client-side services: the HTTP client, listing sessions and batch runs.

pub mod api_client;
pub mod batch;
pub mod listing;
