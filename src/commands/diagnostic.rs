use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{compute_bmi, AnalysisError, BmiResult, RecoveryState};
use crate::db::AppState;
use crate::engine::{PlanOutcome, PlanRequest};
use crate::models::{DiagnosticInput, NewDiagnosticRecord};
use crate::records::insert_record;

/// Whether the computed plan reached the history store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SyncStatus {
  Stored(i64),
  /// No plan was produced, so nothing was written
  Skipped,
  /// The plan is still valid; only the write failed
  Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticOutcome {
  pub input: DiagnosticInput,
  pub bmi: BmiResult,
  pub recovery: RecoveryState,
  pub plan: PlanOutcome,
  pub sync: SyncStatus,
}

/// Run one submission end to end: BMI, classification, plan selection,
/// then persistence. Only invalid weight/height fails the request.
pub async fn diagnose(
  state: &AppState,
  input: DiagnosticInput,
) -> Result<DiagnosticOutcome, AnalysisError> {
  let bmi = compute_bmi(input.weight_kg, input.height_cm)?;
  let recovery = RecoveryState::from_input(&input);

  info!(
    bmi = bmi.bmi,
    category = %bmi.category,
    tier = %recovery.tier,
    strategy = state.strategy.name(),
    "running diagnostic"
  );

  let plan = state
    .strategy
    .run(&PlanRequest {
      input: &input,
      bmi: &bmi,
      recovery: &recovery,
    })
    .await;

  let sync = match plan.plan() {
    Some(ready) => {
      let record = NewDiagnosticRecord::from_parts(&input, &bmi, &recovery, ready);
      match insert_record(&state.db, &record).await {
        Ok(id) => SyncStatus::Stored(id),
        Err(e) => {
          warn!(error = %e, "failed to store diagnostic record");
          SyncStatus::Failed(e.to_string())
        }
      }
    }
    None => SyncStatus::Skipped,
  };

  Ok(DiagnosticOutcome {
    input,
    bmi,
    recovery,
    plan,
    sync,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::{PlanMode, PlanStrategy, QuotaPolicy, UnavailableReason};
  use crate::llm::GeminiClient;
  use crate::models::{PhysicalState, PlanOrigin};
  use crate::records::load_history;
  use crate::test_utils::{
    gemini_error_body, gemini_success_body, mock_gemini_settings, mock_input, setup_test_db,
  };

  fn deterministic_state(db: crate::db::DbPool) -> AppState {
    AppState {
      db,
      strategy: PlanStrategy::select(None, PlanMode::Auto, QuotaPolicy::Surface),
    }
  }

  #[tokio::test]
  async fn test_deterministic_diagnostic_is_stored() {
    let state = deterministic_state(setup_test_db().await);

    let outcome = diagnose(&state, mock_input()).await.unwrap();
    assert_eq!(outcome.bmi.bmi, 22.86);

    let plan = outcome.plan.plan().expect("plan ready");
    assert_eq!(plan.origin, PlanOrigin::Deterministic);
    assert!(plan.nutrition().contains("Maintenance"));
    assert!(plan.recovery().contains("3 hours"));
    assert!(matches!(outcome.sync, SyncStatus::Stored(_)));

    let history = load_history(&state.db).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].nutrition, plan.nutrition());
    assert_eq!(history[0].plan_origin, "deterministic");
  }

  #[tokio::test]
  async fn test_underweight_low_energy_example() {
    let state = deterministic_state(setup_test_db().await);
    let input = DiagnosticInput {
      name: "Ravi".to_string(),
      weight_kg: 50.0,
      height_cm: 170.0,
      exercise_hours_per_week: 2,
      physical_state: PhysicalState::Normal,
      mental_energy_score: 3,
      notes: None,
    };

    let outcome = diagnose(&state, input).await.unwrap();
    assert_eq!(outcome.bmi.bmi, 17.3);
    let plan = outcome.plan.plan().unwrap();
    assert!(plan.nutrition().contains("Caloric Surplus"));
    assert!(plan.recovery().contains("3/10"));
  }

  #[tokio::test]
  async fn test_invalid_weight_fails_request() {
    let state = deterministic_state(setup_test_db().await);
    let mut input = mock_input();
    input.weight_kg = 0.0;

    let err = diagnose(&state, input).await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
    assert!(load_history(&state.db).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_persistence_failure_keeps_plan() {
    let pool = setup_test_db().await;
    sqlx::query("DROP TABLE sleep_diagnostics")
      .execute(&pool)
      .await
      .unwrap();
    let state = deterministic_state(pool);

    let outcome = diagnose(&state, mock_input()).await.unwrap();
    assert!(outcome.plan.plan().is_some());
    assert!(matches!(outcome.sync, SyncStatus::Failed(_)));
  }

  #[tokio::test]
  async fn test_generated_plan_via_provider() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
      .with_status(200)
      .with_body(gemini_success_body(
        r#"```json
{"nutrition": "Chickpea curry", "recovery": "Active rest"}
```"#,
      ))
      .create_async()
      .await;

    let client = GeminiClient::new(mock_gemini_settings(&server.url())).unwrap();
    let state = AppState {
      db: setup_test_db().await,
      strategy: PlanStrategy::select(Some(client), PlanMode::Auto, QuotaPolicy::Surface),
    };

    let outcome = diagnose(&state, mock_input()).await.unwrap();
    let plan = outcome.plan.plan().unwrap();
    assert_eq!(plan.origin, PlanOrigin::Generated);
    assert_eq!(plan.nutrition(), "Chickpea curry");

    let history = load_history(&state.db).await.unwrap();
    assert_eq!(history[0].plan_origin, "generated");
  }

  #[tokio::test]
  async fn test_quota_exhaustion_is_not_persisted() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
      .with_status(429)
      .with_body(gemini_error_body(429, "Resource has been exhausted", "RESOURCE_EXHAUSTED"))
      .create_async()
      .await;

    let client = GeminiClient::new(mock_gemini_settings(&server.url())).unwrap();
    let state = AppState {
      db: setup_test_db().await,
      strategy: PlanStrategy::select(Some(client), PlanMode::Auto, QuotaPolicy::Surface),
    };

    let outcome = diagnose(&state, mock_input()).await.unwrap();
    assert_eq!(
      outcome.plan,
      PlanOutcome::Unavailable {
        reason: UnavailableReason::Quota
      }
    );
    assert_eq!(outcome.sync, SyncStatus::Skipped);
    assert!(load_history(&state.db).await.unwrap().is_empty());
  }
}
