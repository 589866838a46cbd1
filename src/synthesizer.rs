//! Rule-based plan synthesizer
//!
//! Builds the nutrition and recovery sections from classification output
//! alone. No I/O, no clock reads in the text, so identical inputs always
//! produce identical sections. This is the engine used whenever the
//! generative provider is not configured.

use crate::analysis::{BmiCategory, BmiResult, RecoveryState, RecoveryTier};
use crate::models::diagnostic::display_name;
use crate::models::{Plan, PlanOrigin, PlanSections};

/// Dietary constraint applied to every plan, generated or not
pub const DIETARY_CONSTRAINT: &str = "vegetarian";

/// Build a deterministic plan. Total: every input combination yields a plan.
pub fn synthesize(
  bmi: &BmiResult,
  recovery: &RecoveryState,
  exercise_hours_per_week: u32,
  name: &str,
) -> Plan {
  Plan::new(
    synthesize_sections(bmi, recovery, exercise_hours_per_week, name),
    PlanOrigin::Deterministic,
  )
}

/// Section text only, without the timestamp
pub fn synthesize_sections(
  bmi: &BmiResult,
  recovery: &RecoveryState,
  exercise_hours_per_week: u32,
  name: &str,
) -> PlanSections {
  PlanSections {
    nutrition: nutrition_section(bmi, display_name(name)),
    recovery: recovery_section(recovery, exercise_hours_per_week),
  }
}

fn nutrition_section(bmi: &BmiResult, name: &str) -> String {
  let label = bmi.category.label();

  match bmi.category {
    BmiCategory::Underweight => format!(
      "NUTRITION PROTOCOL: Caloric Surplus\n\
       {name}, your BMI of {bmi:.2} is in the {label} range.\n\
       - Eat 300-500 kcal above maintenance every day.\n\
       - Build meals around {diet} protein: paneer, lentils, chickpeas, tofu and Greek yogurt.\n\
       - Add calorie-dense whole foods: nuts, nut butters, seeds, dried fruit and whole milk.\n\
       - Eat 5-6 smaller meals instead of 3 large ones.\n\
       - Re-measure in 4 weeks and target 0.25-0.5 kg of gain per week.",
      name = name,
      bmi = bmi.bmi,
      label = label,
      diet = DIETARY_CONSTRAINT,
    ),
    BmiCategory::Elevated => format!(
      "NUTRITION PROTOCOL: Caloric Deficit\n\
       {name}, your BMI of {bmi:.2} is in the {label} range.\n\
       - Eat 300-500 kcal below maintenance every day.\n\
       - Keep {diet} protein high to protect muscle: lentils, beans, tofu, tempeh and low-fat dairy.\n\
       - Fill half of every plate with non-starchy vegetables.\n\
       - Replace refined grains and sugary drinks with whole grains and water.\n\
       - Re-measure in 4 weeks and target 0.5 kg of loss per week.",
      name = name,
      bmi = bmi.bmi,
      label = label,
      diet = DIETARY_CONSTRAINT,
    ),
    BmiCategory::Optimal => format!(
      "NUTRITION PROTOCOL: Maintenance\n\
       {name}, your BMI of {bmi:.2} is in the {label} range.\n\
       - Eat at maintenance calories and keep portions consistent.\n\
       - Balance each {diet} meal: legumes or dairy for protein, whole grains, vegetables and healthy fats.\n\
       - Aim for 1.2-1.6 g of protein per kg of body weight on training days.\n\
       - Hydrate with 30-35 ml of water per kg of body weight.\n\
       - Re-measure monthly to confirm you stay in range.",
      name = name,
      bmi = bmi.bmi,
      label = label,
      diet = DIETARY_CONSTRAINT,
    ),
  }
}

fn recovery_section(recovery: &RecoveryState, exercise_hours_per_week: u32) -> String {
  let tier = recovery.tier.label();

  match recovery.tier {
    RecoveryTier::LowEnergy => format!(
      "RECOVERY PROTOCOL: {tier}\n\
       Mental energy is {score}/10 with a physical state of {state}.\n\
       - Prioritise 8-9 hours of sleep on a fixed schedule.\n\
       - Replace hard sessions with low-intensity work: walking, mobility and light yoga.\n\
       - Schedule at least 2 full rest days this week.\n\
       - Re-assess once mental energy is above 5/10.",
      tier = tier,
      score = recovery.mental_energy_score,
      state = recovery.physical_state.label(),
    ),
    RecoveryTier::HighPerformance => format!(
      "RECOVERY PROTOCOL: {tier}\n\
       You currently train {hours} hours per week with mental energy at {score}/10.\n\
       - Apply progressive overload: add 5-10% volume or load each week.\n\
       - Keep 7-8 hours of sleep to absorb the extra training.\n\
       - Take 1 deload week every 4-6 weeks.\n\
       - Keep at least 1 full rest day per week.",
      tier = tier,
      hours = exercise_hours_per_week,
      score = recovery.mental_energy_score,
    ),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
