//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod coverage;
pub mod extract;
