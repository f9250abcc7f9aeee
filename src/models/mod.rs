//! Core data models for the object storage manager client.
//!
//! These mirror the JSON bodies exchanged with the manager backend and the
//! query state used to page through listings.

pub mod bucket;
pub mod object;
pub mod page;
pub mod path;
