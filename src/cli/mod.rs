//! Command-line entry points
//!
//! - `serve`: HTTP server (developer API, portal, probes, metrics)
//! - `rollup`: one-shot usage rollup, for cron

pub mod rollup;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Directory Developer API - keys, rate limits, and usage for the public API
#[derive(Parser)]
#[command(name = "directory-devapi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Snapshot today's usage counters into durable daily records and exit
    Rollup(rollup::RollupArgs),
}

/// Load `.env` and layered configuration, then install logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}
