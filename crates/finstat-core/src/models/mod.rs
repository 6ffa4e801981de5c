//! Data models for parsed statements and pipeline configuration.

pub mod config;
pub mod record;
