//! Downloadable report rendering
//!
//! Consumers only see bytes; nothing in the engine depends on the layout.

use std::fmt::Write as _;
use thiserror::Error;

use crate::analysis::BmiResult;
use crate::models::diagnostic::display_name;
use crate::models::Plan;

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("Failed to render report: {0}")]
  Render(#[from] std::fmt::Error),

  #[error("Failed to write report: {0}")]
  Io(#[from] std::io::Error),
}

pub trait ReportRenderer {
  /// MIME type of the rendered bytes
  fn content_type(&self) -> &'static str;

  fn render(&self, name: &str, plan: &Plan, bmi: &BmiResult) -> Result<Vec<u8>, ReportError>;
}

/// Plain UTF-8 text report
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReport;

const TITLE: &str = "SLEOWL BIO-KINETIC REPORT";

impl ReportRenderer for TextReport {
  fn content_type(&self) -> &'static str {
    "text/plain; charset=utf-8"
  }

  fn render(&self, name: &str, plan: &Plan, bmi: &BmiResult) -> Result<Vec<u8>, ReportError> {
    let rule = "=".repeat(TITLE.len());
    let mut out = String::new();

    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Client:    {}", display_name(name))?;
    writeln!(out, "BMI:       {:.2} ({})", bmi.bmi, bmi.category.label())?;
    writeln!(out, "Engine:    {}", plan.origin)?;
    writeln!(out, "Generated: {}", plan.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out)?;
    writeln!(out, "{}", plan.nutrition())?;
    writeln!(out)?;
    writeln!(out, "{}", plan.recovery())?;
    writeln!(out)?;
    writeln!(out, "This report is informational and is not medical advice.")?;

    Ok(out.into_bytes())
  }
}

/// Render and write a report to `path`
pub fn write_report<R: ReportRenderer>(
  renderer: &R,
  path: &std::path::Path,
  name: &str,
  plan: &Plan,
  bmi: &BmiResult,
) -> Result<usize, ReportError> {
  let bytes = renderer.render(name, plan, bmi)?;
  std::fs::write(path, &bytes)?;
  Ok(bytes.len())
}
