//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Canned provider payloads
//! - Helper assertions

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use url::Url;

use crate::llm::{GeminiSettings, GEMINI_MODEL};
use crate::models::{DiagnosticInput, NewDiagnosticRecord, PhysicalState};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  crate::db::run_migrations(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// 70 kg / 175 cm, 3 h/week, Normal, 7/10 (BMI 22.86, high performance)
pub fn mock_input() -> DiagnosticInput {
  DiagnosticInput {
    name: "Asha".to_string(),
    weight_kg: 70.0,
    height_cm: 175.0,
    exercise_hours_per_week: 3,
    physical_state: PhysicalState::Normal,
    mental_energy_score: 7,
    notes: Some("knee feels stiff".to_string()),
  }
}

/// A storable record with the fields aggregates care about
pub fn mock_record(name: &str, bmi: f64, category: &str, mental: i64) -> NewDiagnosticRecord {
  NewDiagnosticRecord {
    user_name: name.to_string(),
    weight_kg: 70.0,
    height_cm: 175.0,
    exercise_hours_per_week: 3,
    physical_state: "normal".to_string(),
    mental_energy_score: mental,
    notes: None,
    bmi,
    bmi_category: category.to_string(),
    recovery_tier: "high_performance".to_string(),
    nutrition: "NUTRITION PROTOCOL: Maintenance".to_string(),
    recovery: "RECOVERY PROTOCOL: High Performance".to_string(),
    plan_origin: "deterministic".to_string(),
    generated_at: Utc::now(),
  }
}

/// ---------------------------------------------------------------------------
/// Provider Fixtures
/// ---------------------------------------------------------------------------

/// Settings pointing the adapter at a mock server
pub fn mock_gemini_settings(base_url: &str) -> GeminiSettings {
  GeminiSettings {
    api_key: "test-key".to_string(),
    model: GEMINI_MODEL.to_string(),
    base_url: Url::parse(base_url).expect("valid mock server url"),
    timeout: None,
  }
}

/// A successful generateContent body whose single text part is `text`
pub fn gemini_success_body(text: &str) -> String {
  json!({
    "candidates": [{
      "content": { "role": "model", "parts": [{ "text": text }] },
      "finishReason": "STOP"
    }]
  })
  .to_string()
}

/// A provider error body
pub fn gemini_error_body(code: u16, message: &str, status: &str) -> String {
  json!({ "error": { "code": code, "message": message, "status": status } }).to_string()
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name = 'sleep_diagnostics'",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let input = mock_input();
    assert!(input.weight_kg > 0.0 && input.height_cm > 0.0);
    assert!((1..=10).contains(&input.mental_energy_score));

    let settings = mock_gemini_settings("http://127.0.0.1:1234");
    assert_eq!(settings.model, "gemini-2.5-flash");
  }
}
