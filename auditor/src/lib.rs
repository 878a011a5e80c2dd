//! Cross-region worst-query audit pipeline.
//!
//! Discovers which regions host the target project's data, extracts the
//! most expensive and slowest queries in the audited window, ranks them
//! project-wide, enriches each with schema and anti-pattern context, asks a
//! generative model for remediation guidance and publishes the assembled
//! report.

pub mod config;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
