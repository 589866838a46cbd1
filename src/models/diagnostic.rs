use serde::{Deserialize, Serialize};

/// Self-reported physical condition at intake time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalState {
  Peak,
  Normal,
  Fatigued,
  Injured,
}

impl PhysicalState {
  pub fn as_str(&self) -> &'static str {
    match self {
      PhysicalState::Peak => "peak",
      PhysicalState::Normal => "normal",
      PhysicalState::Fatigued => "fatigued",
      PhysicalState::Injured => "injured",
    }
  }

  /// Human label used in prompts and reports
  pub fn label(&self) -> &'static str {
    match self {
      PhysicalState::Peak => "Peak",
      PhysicalState::Normal => "Normal",
      PhysicalState::Fatigued => "Fatigued",
      PhysicalState::Injured => "Injured",
    }
  }
}

impl std::fmt::Display for PhysicalState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for PhysicalState {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "peak" => Ok(Self::Peak),
      "normal" => Ok(Self::Normal),
      "fatigued" => Ok(Self::Fatigued),
      "injured" => Ok(Self::Injured),
      _ => Err(format!("Unknown physical state: {}", s)),
    }
  }
}

/// One intake submission. Built once by the caller and never mutated.
///
/// The form layer range-checks `mental_energy_score` (1-10); weight and
/// height are re-checked by the BMI calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticInput {
  pub name: String,
  pub weight_kg: f64,
  pub height_cm: f64,
  pub exercise_hours_per_week: u32,
  pub physical_state: PhysicalState,
  pub mental_energy_score: u8,
  pub notes: Option<String>,
}

impl DiagnosticInput {
  /// Name as shown in plan text and reports ("Client" when left blank)
  pub fn display_name(&self) -> &str {
    display_name(&self.name)
  }
}

pub fn display_name(name: &str) -> &str {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    "Client"
  } else {
    trimmed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_physical_state_parse_is_case_insensitive() {
    assert_eq!("Injured".parse::<PhysicalState>().unwrap(), PhysicalState::Injured);
    assert_eq!(" PEAK ".parse::<PhysicalState>().unwrap(), PhysicalState::Peak);
    assert!("sleepy".parse::<PhysicalState>().is_err());
  }

  #[test]
  fn test_physical_state_round_trips_through_str() {
    for state in [
      PhysicalState::Peak,
      PhysicalState::Normal,
      PhysicalState::Fatigued,
      PhysicalState::Injured,
    ] {
      assert_eq!(state.as_str().parse::<PhysicalState>().unwrap(), state);
    }
  }

  #[test]
  fn test_blank_name_displays_as_client() {
    assert_eq!(display_name(""), "Client");
    assert_eq!(display_name("   "), "Client");
    assert_eq!(display_name(" Asha "), "Asha");
  }
}
