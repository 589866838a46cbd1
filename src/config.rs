//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file by the entry point.

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::engine::{PlanMode, QuotaPolicy};
use crate::llm::{GeminiSettings, GEMINI_API_BASE, GEMINI_MODEL};

const DEFAULT_DATABASE_URL: &str = "sqlite://sleowl.db?mode=rwc";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {reason}")]
  InvalidValue { name: &'static str, reason: String },

  #[error("Invalid provider base URL: {0}")]
  InvalidBaseUrl(#[from] url::ParseError),
}

/// Top-level configuration for the engine and its collaborators
#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Present only when `GEMINI_API_KEY` is set and non-empty
  pub gemini: Option<GeminiSettings>,
  pub plan_mode: PlanMode,
  pub quota_policy: QuotaPolicy,
  pub database_url: String,
  pub log_level: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let timeout = match non_empty_var("SLEOWL_PROVIDER_TIMEOUT_SECS") {
      Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|e| {
        ConfigError::InvalidValue {
          name: "SLEOWL_PROVIDER_TIMEOUT_SECS",
          reason: e.to_string(),
        }
      })?)),
      None => None,
    };

    let gemini = match non_empty_var("GEMINI_API_KEY") {
      Some(api_key) => {
        let base = non_empty_var("GEMINI_API_BASE").unwrap_or_else(|| GEMINI_API_BASE.to_string());
        Some(GeminiSettings {
          api_key,
          model: non_empty_var("GEMINI_MODEL").unwrap_or_else(|| GEMINI_MODEL.to_string()),
          base_url: Url::parse(&base)?,
          timeout,
        })
      }
      None => None,
    };

    let plan_mode: PlanMode = parse_var("SLEOWL_PLAN_MODE")?.unwrap_or_default();
    let quota_policy: QuotaPolicy = parse_var("SLEOWL_QUOTA_POLICY")?.unwrap_or_default();

    Ok(Self {
      gemini,
      plan_mode,
      quota_policy,
      database_url: non_empty_var("DATABASE_URL")
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
      log_level: non_empty_var("SLEOWL_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    })
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  env::var(name)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
  T: std::str::FromStr<Err = String>,
{
  non_empty_var(name)
    .map(|raw| raw.parse::<T>())
    .transpose()
    .map_err(|reason| ConfigError::InvalidValue { name, reason })
}
