//! # Async Job Poller
//!
//! Polls long-running import and scrape jobs until they reach a terminal
//! state, chaining a single scrape job after a successful import when a
//! scrape configuration was supplied.

pub mod job_poller;

pub use job_poller::{AsyncJobPoller, PollerEvent};
