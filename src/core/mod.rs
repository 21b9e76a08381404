//! Core module - project layout, configuration and record storage

pub mod catalog;
pub mod config;
pub mod loader;
pub mod project;
pub mod submission;

pub use catalog::ProjectCatalog;
pub use config::Config;
pub use project::{Project, ProjectError, RecordDir};
pub use submission::{
    submit_order, BomStore, FileBomStore, SubmissionError, SubmissionReport, SubmissionWarning,
};
