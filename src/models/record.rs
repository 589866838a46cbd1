use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{BmiResult, RecoveryState};
use crate::models::{DiagnosticInput, Plan};

/// A stored diagnostic row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiagnosticRecord {
  pub id: i64,
  pub user_name: String,
  pub weight_kg: f64,
  pub height_cm: f64,
  pub exercise_hours_per_week: i64,
  pub physical_state: String,
  pub mental_energy_score: i64,
  pub notes: Option<String>,
  pub bmi: f64,
  pub bmi_category: String,
  pub recovery_tier: String,
  pub nutrition: String,
  pub recovery: String,
  pub plan_origin: String,
  pub generated_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

/// For inserting new records (without id, created_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiagnosticRecord {
  pub user_name: String,
  pub weight_kg: f64,
  pub height_cm: f64,
  pub exercise_hours_per_week: i64,
  pub physical_state: String,
  pub mental_energy_score: i64,
  pub notes: Option<String>,
  pub bmi: f64,
  pub bmi_category: String,
  pub recovery_tier: String,
  pub nutrition: String,
  pub recovery: String,
  pub plan_origin: String,
  pub generated_at: DateTime<Utc>,
}

impl NewDiagnosticRecord {
  /// Flatten one submission and its plan into a storable row
  pub fn from_parts(
    input: &DiagnosticInput,
    bmi: &BmiResult,
    recovery: &RecoveryState,
    plan: &Plan,
  ) -> Self {
    Self {
      user_name: input.name.clone(),
      weight_kg: input.weight_kg,
      height_cm: input.height_cm,
      exercise_hours_per_week: i64::from(input.exercise_hours_per_week),
      physical_state: input.physical_state.as_str().to_string(),
      mental_energy_score: i64::from(input.mental_energy_score),
      notes: input.notes.clone(),
      bmi: bmi.bmi,
      bmi_category: bmi.category.as_str().to_string(),
      recovery_tier: recovery.tier.as_str().to_string(),
      nutrition: plan.sections.nutrition.clone(),
      recovery: plan.sections.recovery.clone(),
      plan_origin: plan.origin.as_str().to_string(),
      generated_at: plan.generated_at,
    }
  }
}
