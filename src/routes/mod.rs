//! REST surface of the manager backend.

pub mod routes;
