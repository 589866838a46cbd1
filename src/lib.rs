pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod llm;
pub mod models;
pub mod records;
pub mod report;
pub mod synthesizer;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use std::ffi::OsString;

use cli::Cli;
use config::AppConfig;
use error::AppError;

pub async fn run() -> Result<(), AppError> {
  run_from(std::env::args_os()).await
}

/// Arguments are parsed before the environment is read, so `--help` and
/// usage errors never depend on configuration.
pub async fn run_from<I, T>(args: I) -> Result<(), AppError>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let cli = Cli::try_parse_from(args)?;

  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let config = AppConfig::from_env()?;
  telemetry::init(&config.log_level)?;

  cli::run_with(cli, config).await
}
