use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which engine produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
  Generated,
  Deterministic,
}

impl PlanOrigin {
  pub fn as_str(&self) -> &'static str {
    match self {
      PlanOrigin::Generated => "generated",
      PlanOrigin::Deterministic => "deterministic",
    }
  }
}

impl std::fmt::Display for PlanOrigin {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The two named sections every plan carries, whichever engine wrote it.
/// This is also the JSON shape the generative provider is asked to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSections {
  pub nutrition: String,
  pub recovery: String,
}

/// Recommendation handed to the report renderer and persistence.
/// Built once per submission; never re-derived from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
  pub sections: PlanSections,
  pub origin: PlanOrigin,
  pub generated_at: DateTime<Utc>,
}

impl Plan {
  pub fn new(sections: PlanSections, origin: PlanOrigin) -> Self {
    Self {
      sections,
      origin,
      generated_at: Utc::now(),
    }
  }

  pub fn nutrition(&self) -> &str {
    &self.sections.nutrition
  }

  pub fn recovery(&self) -> &str {
    &self.sections.recovery
  }
}
