//! Plan selection policy
//!
//! Chooses between the generative adapter and the rule-based synthesizer
//! and decides what a caller sees when the provider fails. Two entry
//! states, each submission independent:
//!
//! - `Generative`: one provider call, no retry. Success is `Ready`, quota
//!   is `Unavailable(Quota)`, anything else is `Unavailable(EngineFault)`.
//! - `Deterministic`: the synthesizer, which always succeeds.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{BmiResult, RecoveryState};
use crate::llm::{GeminiClient, LlmError};
use crate::models::{DiagnosticInput, Plan};
use crate::synthesizer;

/// ---------------------------------------------------------------------------
/// Policy Settings
/// ---------------------------------------------------------------------------

/// Which engine to prefer when a provider key is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
  /// Generative when a key is configured, deterministic otherwise
  #[default]
  Auto,
  /// Always use the synthesizer, even with a key configured
  Deterministic,
}

impl std::str::FromStr for PlanMode {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "auto" => Ok(Self::Auto),
      "deterministic" => Ok(Self::Deterministic),
      _ => Err(format!("Unknown plan mode: {}", s)),
    }
  }
}

/// What to do when the provider reports exhausted quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
  /// Tell the caller capacity is exhausted
  #[default]
  Surface,
  /// Serve a deterministic plan instead
  Fallback,
}

impl std::str::FromStr for QuotaPolicy {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "surface" => Ok(Self::Surface),
      "fallback" => Ok(Self::Fallback),
      _ => Err(format!("Unknown quota policy: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Outcomes
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
  Quota,
  EngineFault(String),
}

impl UnavailableReason {
  /// Message shown to the end user
  pub fn user_message(&self) -> String {
    match self {
      UnavailableReason::Quota => "AI capacity exhausted. Please retry later.".to_string(),
      UnavailableReason::EngineFault(detail) => format!("AI engine fault: {}", detail),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
  Ready { plan: Plan },
  Unavailable { reason: UnavailableReason },
}

impl PlanOutcome {
  pub fn plan(&self) -> Option<&Plan> {
    match self {
      PlanOutcome::Ready { plan } => Some(plan),
      PlanOutcome::Unavailable { .. } => None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Strategies
/// ---------------------------------------------------------------------------

/// Everything a strategy needs to produce a plan for one submission
pub struct PlanRequest<'a> {
  pub input: &'a DiagnosticInput,
  pub bmi: &'a BmiResult,
  pub recovery: &'a RecoveryState,
}

/// A fallible, remote source of plans
pub trait PlanSource {
  fn produce(
    &self,
    request: &PlanRequest<'_>,
  ) -> impl std::future::Future<Output = Result<Plan, LlmError>> + Send;
}

/// Rule-based source backed by the synthesizer. Total, so no `Result`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicSource;

impl DeterministicSource {
  pub fn produce(&self, request: &PlanRequest<'_>) -> Plan {
    synthesizer::synthesize(
      request.bmi,
      request.recovery,
      request.input.exercise_hours_per_week,
      &request.input.name,
    )
  }
}

impl PlanSource for GeminiClient {
  async fn produce(&self, request: &PlanRequest<'_>) -> Result<Plan, LlmError> {
    self.request_plan(request.input, request.bmi).await
  }
}

/// The strategy picked once from configuration
pub enum PlanStrategy {
  Generative {
    client: GeminiClient,
    quota_policy: QuotaPolicy,
  },
  Deterministic(DeterministicSource),
}

impl PlanStrategy {
  /// Select a strategy: generative only when a client exists and the mode allows it
  pub fn select(client: Option<GeminiClient>, mode: PlanMode, quota_policy: QuotaPolicy) -> Self {
    match (client, mode) {
      (Some(client), PlanMode::Auto) => PlanStrategy::Generative {
        client,
        quota_policy,
      },
      _ => PlanStrategy::Deterministic(DeterministicSource),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      PlanStrategy::Generative { .. } => "generative",
      PlanStrategy::Deterministic(_) => "deterministic",
    }
  }

  pub async fn run(&self, request: &PlanRequest<'_>) -> PlanOutcome {
    match self {
      PlanStrategy::Deterministic(source) => PlanOutcome::Ready {
        plan: source.produce(request),
      },
      PlanStrategy::Generative {
        client,
        quota_policy,
      } => run_generative(client, *quota_policy, request).await,
    }
  }
}

/// One attempt against a generative source, mapped onto the policy outcomes
pub async fn run_generative<S: PlanSource>(
  source: &S,
  quota_policy: QuotaPolicy,
  request: &PlanRequest<'_>,
) -> PlanOutcome {
  match source.produce(request).await {
    Ok(plan) => {
      info!(origin = %plan.origin, "generated plan ready");
      PlanOutcome::Ready { plan }
    }
    Err(LlmError::QuotaExceeded(detail)) => match quota_policy {
      QuotaPolicy::Surface => {
        warn!(%detail, "provider quota exhausted");
        PlanOutcome::Unavailable {
          reason: UnavailableReason::Quota,
        }
      }
      QuotaPolicy::Fallback => {
        warn!(%detail, "provider quota exhausted, serving deterministic plan");
        PlanOutcome::Ready {
          plan: DeterministicSource.produce(request),
        }
      }
    },
    Err(e) => {
      warn!(error = %e, "generative engine fault");
      PlanOutcome::Unavailable {
        reason: UnavailableReason::EngineFault(e.to_string()),
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analysis::compute_bmi;
  use crate::models::{PhysicalState, PlanOrigin, PlanSections};
  use crate::test_utils::{mock_gemini_settings, mock_input};

  /// Canned generative source for policy tests
  struct StubSource(Result<Plan, LlmError>);

  impl PlanSource for StubSource {
    async fn produce(&self, _request: &PlanRequest<'_>) -> Result<Plan, LlmError> {
      self.0.clone()
    }
  }

  fn generated_plan() -> Plan {
    Plan::new(
      PlanSections {
        nutrition: "gen nutrition".to_string(),
        recovery: "gen recovery".to_string(),
      },
      PlanOrigin::Generated,
    )
  }

  async fn outcome_for(source: StubSource, policy: QuotaPolicy) -> PlanOutcome {
    let input = mock_input();
    let bmi = compute_bmi(input.weight_kg, input.height_cm).unwrap();
    let recovery = RecoveryState::from_input(&input);
    let request = PlanRequest {
      input: &input,
      bmi: &bmi,
      recovery: &recovery,
    };
    run_generative(&source, policy, &request).await
  }

  #[test]
  fn test_select_without_client_is_deterministic() {
    let strategy = PlanStrategy::select(None, PlanMode::Auto, QuotaPolicy::Surface);
    assert_eq!(strategy.name(), "deterministic");
  }

  #[test]
  fn test_select_prefers_determinism_when_configured() {
    let client = GeminiClient::new(mock_gemini_settings("http://127.0.0.1:9")).unwrap();
    let strategy = PlanStrategy::select(Some(client), PlanMode::Deterministic, QuotaPolicy::Surface);
    assert_eq!(strategy.name(), "deterministic");

    let client = GeminiClient::new(mock_gemini_settings("http://127.0.0.1:9")).unwrap();
    let strategy = PlanStrategy::select(Some(client), PlanMode::Auto, QuotaPolicy::Surface);
    assert_eq!(strategy.name(), "generative");
  }

  #[tokio::test]
  async fn test_deterministic_strategy_always_ready() {
    let strategy = PlanStrategy::select(None, PlanMode::Auto, QuotaPolicy::Surface);

    for (weight, score, state) in [
      (40.0, 1, PhysicalState::Injured),
      (70.0, 10, PhysicalState::Peak),
      (130.0, 6, PhysicalState::Fatigued),
    ] {
      let mut input = mock_input();
      input.weight_kg = weight;
      input.mental_energy_score = score;
      input.physical_state = state;
      let bmi = compute_bmi(input.weight_kg, input.height_cm).unwrap();
      let recovery = RecoveryState::from_input(&input);
      let request = PlanRequest {
        input: &input,
        bmi: &bmi,
        recovery: &recovery,
      };

      let outcome = strategy.run(&request).await;
      let plan = outcome.plan().expect("deterministic plan");
      assert_eq!(plan.origin, PlanOrigin::Deterministic);
    }
  }

  #[tokio::test]
  async fn test_generated_success_is_ready() {
    let outcome = outcome_for(StubSource(Ok(generated_plan())), QuotaPolicy::Surface).await;
    assert_eq!(outcome.plan().map(|p| p.origin), Some(PlanOrigin::Generated));
  }

  #[tokio::test]
  async fn test_quota_is_surfaced_not_masked() {
    let source = StubSource(Err(LlmError::QuotaExceeded("429".to_string())));
    let outcome = outcome_for(source, QuotaPolicy::Surface).await;
    assert_eq!(
      outcome,
      PlanOutcome::Unavailable {
        reason: UnavailableReason::Quota
      }
    );
  }

  #[tokio::test]
  async fn test_quota_fallback_when_opted_in() {
    let source = StubSource(Err(LlmError::QuotaExceeded("429".to_string())));
    let outcome = outcome_for(source, QuotaPolicy::Fallback).await;
    assert_eq!(outcome.plan().map(|p| p.origin), Some(PlanOrigin::Deterministic));
  }

  #[tokio::test]
  async fn test_other_faults_never_fall_back() {
    for err in [
      LlmError::Authentication("bad key".to_string()),
      LlmError::Transient("timeout".to_string()),
      LlmError::MalformedResponse("no json".to_string()),
    ] {
      let outcome = outcome_for(StubSource(Err(err.clone())), QuotaPolicy::Fallback).await;
      assert_eq!(
        outcome,
        PlanOutcome::Unavailable {
          reason: UnavailableReason::EngineFault(err.to_string())
        }
      );
    }
  }

  #[test]
  fn test_user_messages_distinguish_quota() {
    let quota = UnavailableReason::Quota.user_message();
    let fault = UnavailableReason::EngineFault("Transient provider error: timeout".to_string())
      .user_message();
    assert!(quota.contains("capacity exhausted"));
    assert!(fault.starts_with("AI engine fault"));
    assert_ne!(quota, fault);
  }

  #[test]
  fn test_deterministic_source_is_total() {
    let input = mock_input();
    let bmi = compute_bmi(input.weight_kg, input.height_cm).unwrap();
    let recovery = RecoveryState::from_input(&input);
    let request = PlanRequest {
      input: &input,
      bmi: &bmi,
      recovery: &recovery,
    };

    let plan = DeterministicSource.produce(&request);
    assert_eq!(plan.origin, PlanOrigin::Deterministic);
    assert_eq!(
      plan.sections,
      synthesizer::synthesize_sections(&bmi, &recovery, 3, "Asha")
    );
  }
}
