//! CLI subcommands.

pub mod build;
pub mod config;
pub mod dev;
pub mod init;
pub mod list;
pub mod serve;
