//! HTTP endpoint modules.
//!
//! Each sub-module owns one router; `crate::router` decides where it is mounted.

pub mod authorized;
pub mod config;
pub mod conversations;
pub mod doc;
pub mod feedback;
pub mod health;
pub mod info;
pub mod metrics;
pub mod models;
pub mod query;
pub mod root;
pub mod streaming_query;
