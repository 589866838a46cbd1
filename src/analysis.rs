//! Deterministic analysis layer for intake data
//!
//! Computes BMI and classifies the subject's body composition and recovery
//! state. Every function here is pure; the plan engines consume the results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DiagnosticInput, PhysicalState};

/// ---------------------------------------------------------------------------
/// Thresholds
/// ---------------------------------------------------------------------------

const UNDERWEIGHT_BELOW: f64 = 18.5;
const ELEVATED_ABOVE: f64 = 25.0;
const LOW_ENERGY_MAX_SCORE: u8 = 5;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum AnalysisError {
  #[error("Invalid input: {0}")]
  InvalidInput(String),
}

/// ---------------------------------------------------------------------------
/// BMI
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
  Underweight, // < 18.5
  Optimal,     // 18.5 - 25.0 inclusive
  Elevated,    // > 25.0
}

impl BmiCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      BmiCategory::Underweight => "underweight",
      BmiCategory::Optimal => "optimal",
      BmiCategory::Elevated => "elevated",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      BmiCategory::Underweight => "Underweight",
      BmiCategory::Optimal => "Optimal",
      BmiCategory::Elevated => "Elevated",
    }
  }
}

impl std::fmt::Display for BmiCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
  /// Rounded half-up to 2 decimal places; this is the persisted value
  pub bmi: f64,
  pub category: BmiCategory,
}

/// Compute BMI from weight (kg) and height (cm).
///
/// No clamping: anything that is not a finite positive number is rejected.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Result<BmiResult, AnalysisError> {
  if !(weight_kg.is_finite() && weight_kg > 0.0) {
    return Err(AnalysisError::InvalidInput(format!(
      "weight must be greater than 0 kg, got {}",
      weight_kg
    )));
  }
  if !(height_cm.is_finite() && height_cm > 0.0) {
    return Err(AnalysisError::InvalidInput(format!(
      "height must be greater than 0 cm, got {}",
      height_cm
    )));
  }

  let height_m = height_cm / 100.0;
  let bmi = round_2dp(weight_kg / (height_m * height_m));

  Ok(BmiResult {
    bmi,
    category: classify(bmi),
  })
}

/// Round half-up to two decimals (inputs are always positive here)
fn round_2dp(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// Map a BMI value onto its category. [18.5, 25.0] is Optimal.
pub fn classify(bmi: f64) -> BmiCategory {
  match bmi {
    b if b < UNDERWEIGHT_BELOW => BmiCategory::Underweight,
    b if b > ELEVATED_ABOVE => BmiCategory::Elevated,
    _ => BmiCategory::Optimal,
  }
}

/// ---------------------------------------------------------------------------
/// Recovery
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryTier {
  LowEnergy,
  HighPerformance,
}

impl RecoveryTier {
  pub fn as_str(&self) -> &'static str {
    match self {
      RecoveryTier::LowEnergy => "low_energy",
      RecoveryTier::HighPerformance => "high_performance",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      RecoveryTier::LowEnergy => "Low Energy",
      RecoveryTier::HighPerformance => "High Performance",
    }
  }
}

impl std::fmt::Display for RecoveryTier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Recovery tier together with the signals it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryState {
  pub tier: RecoveryTier,
  pub mental_energy_score: u8,
  pub physical_state: PhysicalState,
}

impl RecoveryState {
  pub fn assess(mental_energy_score: u8, physical_state: PhysicalState) -> Self {
    Self {
      tier: classify_energy(mental_energy_score, physical_state),
      mental_energy_score,
      physical_state,
    }
  }

  pub fn from_input(input: &DiagnosticInput) -> Self {
    Self::assess(input.mental_energy_score, input.physical_state)
  }
}

/// A low score or a compromised physical state is each enough on its own.
pub fn classify_energy(mental_energy_score: u8, physical_state: PhysicalState) -> RecoveryTier {
  let compromised = matches!(
    physical_state,
    PhysicalState::Fatigued | PhysicalState::Injured
  );

  if mental_energy_score <= LOW_ENERGY_MAX_SCORE || compromised {
    RecoveryTier::LowEnergy
  } else {
    RecoveryTier::HighPerformance
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
