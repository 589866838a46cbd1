//! Diagnostic history storage
//!
//! Append-only writes plus the read path used for aggregate display.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::{DbError, DbPool};
use crate::models::{DiagnosticRecord, NewDiagnosticRecord};

/// Append one record, returning its row id
pub async fn insert_record(pool: &DbPool, record: &NewDiagnosticRecord) -> Result<i64, DbError> {
  let result = sqlx::query(
    r#"
    INSERT INTO sleep_diagnostics (
      user_name, weight_kg, height_cm, exercise_hours_per_week,
      physical_state, mental_energy_score, notes, bmi, bmi_category,
      recovery_tier, nutrition, recovery, plan_origin, generated_at, created_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
    "#,
  )
  .bind(&record.user_name)
  .bind(record.weight_kg)
  .bind(record.height_cm)
  .bind(record.exercise_hours_per_week)
  .bind(&record.physical_state)
  .bind(record.mental_energy_score)
  .bind(&record.notes)
  .bind(record.bmi)
  .bind(&record.bmi_category)
  .bind(&record.recovery_tier)
  .bind(&record.nutrition)
  .bind(&record.recovery)
  .bind(&record.plan_origin)
  .bind(record.generated_at)
  .bind(chrono::Utc::now())
  .execute(pool)
  .await?;

  let id = result.last_insert_rowid();
  debug!(id, "diagnostic record stored");
  Ok(id)
}

/// Full history, oldest first
pub async fn load_history(pool: &DbPool) -> Result<Vec<DiagnosticRecord>, DbError> {
  let records = sqlx::query_as::<_, DiagnosticRecord>(
    "SELECT * FROM sleep_diagnostics ORDER BY created_at ASC, id ASC",
  )
  .fetch_all(pool)
  .await?;

  Ok(records)
}

/// ---------------------------------------------------------------------------
/// Aggregates
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
  pub total: usize,
  /// Record count per stored BMI category
  pub by_category: BTreeMap<String, usize>,
  pub by_origin: BTreeMap<String, usize>,
  pub average_bmi: Option<f64>,
  pub bmi_series: Vec<f64>,
  pub mental_energy_series: Vec<i64>,
}

impl HistorySummary {
  pub fn compute(records: &[DiagnosticRecord]) -> Self {
    let mut by_category = BTreeMap::new();
    let mut by_origin = BTreeMap::new();

    for record in records {
      *by_category.entry(record.bmi_category.clone()).or_insert(0) += 1;
      *by_origin.entry(record.plan_origin.clone()).or_insert(0) += 1;
    }

    let bmi_series: Vec<f64> = records.iter().map(|r| r.bmi).collect();
    let average_bmi = if bmi_series.is_empty() {
      None
    } else {
      let avg = bmi_series.iter().sum::<f64>() / bmi_series.len() as f64;
      Some((avg * 100.0).round() / 100.0)
    };

    Self {
      total: records.len(),
      by_category,
      by_origin,
      average_bmi,
      bmi_series,
      mental_energy_series: records.iter().map(|r| r.mental_energy_score).collect(),
    }
  }
}

pub async fn summarize_history(pool: &DbPool) -> Result<HistorySummary, DbError> {
  let records = load_history(pool).await?;
  Ok(HistorySummary::compute(&records))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
