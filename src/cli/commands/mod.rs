//! CLI command implementations

pub mod clear;
pub mod completions;
pub mod files;
pub mod import;
pub mod query;
pub mod remove;
pub mod status;
