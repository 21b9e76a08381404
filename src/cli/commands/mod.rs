//! CLI command implementations

pub mod catalog;
pub mod completions;
pub mod consolidate;
pub mod estimate;
pub mod init;
pub mod order;
