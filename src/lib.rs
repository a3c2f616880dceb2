pub mod boundary;
pub mod build;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod conventional;
pub mod domain;
pub mod error;
pub mod git;
pub mod guard;
pub mod manifest;
pub mod registry;
pub mod ui;
pub mod version;

pub use error::{ReleaseError, Result};
