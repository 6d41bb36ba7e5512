//! # Backend Collaborators
//!
//! [`ShipmentBackend`] and [`JobBackend`] are the seams between the staging
//! core and everything behind HTTP. [`HttpBackendClient`] is the production
//! implementation; tests substitute in-memory doubles.

pub mod backend;
pub mod http;

pub use backend::{CreatedRecord, JobBackend, ShipmentBackend, SubmittedJob};
pub use http::HttpBackendClient;
