//! autopub - watch-folder video publishing automation
//!
//! This library crate exposes the pipeline stages for integration testing.

pub mod api;
pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod runner;
pub mod scanner;
