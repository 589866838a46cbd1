use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::commands::{self, DiagnosticOutcome, SyncStatus};
use crate::config::AppConfig;
use crate::db::{self, AppState};
use crate::engine::{PlanMode, PlanOutcome, PlanStrategy};
use crate::error::AppError;
use crate::llm::GeminiClient;
use crate::models::{DiagnosticInput, PhysicalState};
use crate::records::HistorySummary;
use crate::report::{write_report, ReportRenderer, TextReport};

#[derive(Parser, Debug)]
#[command(
  name = "sleowl",
  about = "Sleowl bio-kinetic diagnostic engine: BMI, recovery and diet plans",
  version
)]
pub struct Cli {
  /// Override DATABASE_URL
  #[arg(long, global = true)]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run a diagnostic and print the plan
  Diagnose(DiagnoseArgs),
  /// Show aggregate history of stored diagnostics
  History(HistoryArgs),
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
  /// Client name (may be blank)
  #[arg(long, default_value = "")]
  name: String,
  /// Weight in kilograms
  #[arg(long)]
  weight: f64,
  /// Height in centimetres
  #[arg(long)]
  height: f64,
  /// Exercise hours per week
  #[arg(long, default_value_t = 0)]
  exercise_hours: u32,
  /// Physical state: peak, normal, fatigued or injured
  #[arg(long, default_value = "normal")]
  state: PhysicalState,
  /// Mental energy score from 1 to 10
  #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
  mental_energy: u8,
  /// Free-form notes passed to the generative engine
  #[arg(long)]
  notes: Option<String>,
  /// Use the rule-based engine even if a provider key is configured
  #[arg(long)]
  deterministic: bool,
  /// Write a downloadable report to this path
  #[arg(long)]
  report: Option<PathBuf>,
  /// Print the outcome as JSON
  #[arg(long)]
  json: bool,
  /// Confirm the output is informational and not medical advice
  #[arg(long)]
  acknowledge: bool,
}

#[derive(Args, Debug)]
struct HistoryArgs {
  /// Print the summary as JSON
  #[arg(long)]
  json: bool,
}

impl DiagnoseArgs {
  fn to_input(&self) -> DiagnosticInput {
    DiagnosticInput {
      name: self.name.clone(),
      weight_kg: self.weight,
      height_cm: self.height,
      exercise_hours_per_week: self.exercise_hours,
      physical_state: self.state,
      mental_energy_score: self.mental_energy,
      notes: self.notes.clone(),
    }
  }
}

/// Execute an already parsed command line against the loaded configuration
pub async fn run_with(cli: Cli, config: AppConfig) -> Result<(), AppError> {
  let database_url = cli.database_url.unwrap_or_else(|| config.database_url.clone());

  match cli.command {
    Command::Diagnose(args) => {
      // Consent is a caller-side gate; the engine itself never checks it
      if !args.acknowledge {
        return Err(AppError::ConsentRequired);
      }
      let state = build_state(&config, &database_url, args.deterministic).await?;
      run_diagnose(&state, args, &mut std::io::stdout(), &mut std::io::stderr()).await
    }
    Command::History(args) => {
      let pool = db::initialize_db(&database_url).await?;
      let summary = commands::history(&pool).await?;
      print_history(&mut std::io::stdout(), &summary, args.json)
    }
  }
}

async fn build_state(
  config: &AppConfig,
  database_url: &str,
  force_deterministic: bool,
) -> Result<AppState, AppError> {
  let mode = if force_deterministic {
    PlanMode::Deterministic
  } else {
    config.plan_mode
  };

  let client = match &config.gemini {
    Some(settings) => Some(GeminiClient::new(settings.clone())?),
    None => {
      warn!("GEMINI_API_KEY not set, using the deterministic engine");
      None
    }
  };

  let strategy = PlanStrategy::select(client, mode, config.quota_policy);
  info!(strategy = strategy.name(), "plan strategy selected");

  Ok(AppState {
    db: db::initialize_db(database_url).await?,
    strategy,
  })
}

async fn run_diagnose(
  state: &AppState,
  args: DiagnoseArgs,
  out: &mut impl Write,
  err: &mut impl Write,
) -> Result<(), AppError> {
  let outcome = commands::diagnose(state, args.to_input()).await?;

  if args.json {
    writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
  } else {
    print_outcome(out, &outcome)?;
  }

  // The plan is already shown and stored; a failed report only warns
  if let (Some(path), Some(plan)) = (&args.report, outcome.plan.plan()) {
    match write_report(&TextReport, path, &outcome.input.name, plan, &outcome.bmi) {
      Ok(bytes) => info!(
        path = %path.display(),
        bytes,
        content_type = TextReport.content_type(),
        "report written"
      ),
      Err(report_err) => {
        warn!(path = %path.display(), error = %report_err, "report not written");
        writeln!(
          err,
          "Warning: report not written to {}: {}",
          path.display(),
          report_err
        )?;
      }
    }
  }

  Ok(())
}

fn print_outcome(out: &mut impl Write, outcome: &DiagnosticOutcome) -> Result<(), AppError> {
  writeln!(out, "BMI: {:.2} ({})", outcome.bmi.bmi, outcome.bmi.category.label())?;
  writeln!(out, "Recovery tier: {}", outcome.recovery.tier.label())?;
  writeln!(out)?;

  match &outcome.plan {
    PlanOutcome::Ready { plan } => {
      writeln!(out, "[{} plan]", plan.origin)?;
      writeln!(out, "{}", plan.nutrition())?;
      writeln!(out)?;
      writeln!(out, "{}", plan.recovery())?;
    }
    PlanOutcome::Unavailable { reason } => writeln!(out, "{}", reason.user_message())?,
  }

  match &outcome.sync {
    SyncStatus::Stored(id) => writeln!(out, "\nSynced to history (record {}).", id)?,
    SyncStatus::Skipped => {}
    SyncStatus::Failed(detail) => writeln!(out, "\nWarning: history sync failed: {}", detail)?,
  }
  Ok(())
}

fn print_history(out: &mut impl Write, summary: &HistorySummary, json: bool) -> Result<(), AppError> {
  if json {
    writeln!(out, "{}", serde_json::to_string_pretty(summary)?)?;
    return Ok(());
  }

  writeln!(out, "Diagnostics stored: {}", summary.total)?;
  if let Some(avg) = summary.average_bmi {
    writeln!(out, "Average BMI: {:.2}", avg)?;
  }
  for (category, count) in &summary.by_category {
    writeln!(out, "  {}: {}", category, count)?;
  }
  for (origin, count) in &summary.by_origin {
    writeln!(out, "  {} plans: {}", origin, count)?;
  }
  Ok(())
}
