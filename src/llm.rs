//! Generative plan adapter
//!
//! Delegates plan text to the Gemini `generateContent` API and translates
//! provider failures into the error taxonomy the selection policy needs.
//! One outbound request per call; no retries happen here.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::analysis::BmiResult;
use crate::models::{DiagnosticInput, Plan, PlanOrigin, PlanSections};
use crate::synthesizer::DIETARY_CONSTRAINT;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Connection settings for the provider. The API key is passed through as-is.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
  pub api_key: String,
  pub model: String,
  pub base_url: Url,
  pub timeout: Option<Duration>,
}

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum LlmError {
  #[error("Provider quota exceeded: {0}")]
  QuotaExceeded(String),

  #[error("Authentication failed: {0}")]
  Authentication(String),

  #[error("Transient provider error: {0}")]
  Transient(String),

  #[error("Malformed response: {0}")]
  MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self {
    // Timeouts, connect failures and body read errors are all retryable by the caller
    LlmError::Transient(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents: Vec<RequestContent>,
  generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
  role: String,
  parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
  text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  max_output_tokens: u32,
  response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  content: Option<CandidateContent>,
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  #[serde(default)]
  message: String,
  #[serde(default)]
  status: String,
  #[serde(default)]
  details: Vec<GeminiErrorInfo>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorInfo {
  reason: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Prompt
/// ---------------------------------------------------------------------------

/// The single prompt sent per submission. Kept stable: mocked provider
/// fixtures are keyed on its shape.
pub fn build_prompt(input: &DiagnosticInput, bmi: &BmiResult) -> String {
  let notes = input
    .notes
    .as_deref()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .unwrap_or("none");

  format!(
    r#"As a Sleowl scientist, create a personalized diet and recovery plan.

CLIENT PROFILE:
- Name: {name}
- BMI: {bmi:.2}
- Exercise: {hours} hours per week
- Physical state: {state}
- Mental energy: {score}/10
- Notes: {notes}

DIETARY CONSTRAINT: {diet}

Respond with valid JSON in this exact format:
{{
  "nutrition": "Diet guidance for this client",
  "recovery": "Rest, sleep and training guidance for this client"
}}"#,
    name = input.display_name(),
    bmi = bmi.bmi,
    hours = input.exercise_hours_per_week,
    state = input.physical_state.label(),
    score = input.mental_energy_score,
    notes = notes,
    diet = DIETARY_CONSTRAINT,
  )
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  settings: GeminiSettings,
}

impl GeminiClient {
  pub fn new(settings: GeminiSettings) -> Result<Self, LlmError> {
    let mut builder = Client::builder();
    if let Some(timeout) = settings.timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    Ok(Self { client, settings })
  }

  fn endpoint(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.settings.base_url.as_str().trim_end_matches('/'),
      self.settings.model
    )
  }

  /// Send one prompt and return the first text part of the first candidate
  pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
    let request = GenerateRequest {
      contents: vec![RequestContent {
        role: "user".to_string(),
        parts: vec![RequestPart {
          text: prompt.to_string(),
        }],
      }],
      generation_config: GenerationConfig {
        max_output_tokens: MAX_OUTPUT_TOKENS,
        response_mime_type: "application/json".to_string(),
      },
    };

    let response = self
      .client
      .post(self.endpoint())
      .header("x-goog-api-key", &self.settings.api_key)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      let err = classify_failure(status, &body);
      warn!(status = status.as_u16(), error = %err, "provider rejected request");
      return Err(err);
    }

    let parsed: GenerateResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    let candidate = parsed
      .candidates
      .into_iter()
      .next()
      .ok_or_else(|| LlmError::MalformedResponse("No candidates in response".to_string()))?;
    let finish_reason = candidate.finish_reason;

    candidate
      .content
      .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
      .filter(|text| !text.trim().is_empty())
      .ok_or_else(|| {
        LlmError::MalformedResponse(format!(
          "No text content in response (finish reason: {})",
          finish_reason.as_deref().unwrap_or("unknown")
        ))
      })
  }

  /// Ask the provider for a plan and parse it into the two-section shape
  pub async fn request_plan(
    &self,
    input: &DiagnosticInput,
    bmi: &BmiResult,
  ) -> Result<Plan, LlmError> {
    let prompt = build_prompt(input, bmi);
    debug!(model = %self.settings.model, prompt_len = prompt.len(), "requesting generated plan");

    let text = self.complete(&prompt).await?;
    let sections = parse_sections(&text)?;

    Ok(Plan::new(sections, PlanOrigin::Generated))
  }
}

/// Map a non-success HTTP response onto the adapter taxonomy
fn classify_failure(status: StatusCode, body: &str) -> LlmError {
  let detail = serde_json::from_str::<GeminiErrorResponse>(body).ok();
  let message = detail
    .as_ref()
    .map(|d| d.error.message.clone())
    .filter(|m| !m.is_empty())
    .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

  let provider_status = detail.as_ref().map(|d| d.error.status.as_str()).unwrap_or("");
  let invalid_key = detail
    .as_ref()
    .map(|d| {
      d.error
        .details
        .iter()
        .any(|info| info.reason.as_deref() == Some("API_KEY_INVALID"))
    })
    .unwrap_or(false);

  if status == StatusCode::TOO_MANY_REQUESTS || provider_status == "RESOURCE_EXHAUSTED" {
    return LlmError::QuotaExceeded(message);
  }

  if status == StatusCode::UNAUTHORIZED
    || status == StatusCode::FORBIDDEN
    || invalid_key
    || matches!(provider_status, "UNAUTHENTICATED" | "PERMISSION_DENIED")
  {
    return LlmError::Authentication(message);
  }

  LlmError::Transient(message)
}

/// Parse provider text into plan sections; both must be present and non-empty
pub fn parse_sections(text: &str) -> Result<PlanSections, LlmError> {
  let json_str = extract_json(text)?;

  let sections: PlanSections = serde_json::from_str(&json_str)
    .map_err(|e| LlmError::MalformedResponse(format!("{}: {}", e, json_str)))?;

  if sections.nutrition.trim().is_empty() || sections.recovery.trim().is_empty() {
    return Err(LlmError::MalformedResponse(
      "Plan sections must not be empty".to_string(),
    ));
  }

  Ok(PlanSections {
    nutrition: sections.nutrition.trim().to_string(),
    recovery: sections.recovery.trim().to_string(),
  })
}

/// Extract JSON from model output (handles markdown code blocks)
fn extract_json(text: &str) -> Result<String, LlmError> {
  if text.trim().starts_with('{') {
    return Ok(text.trim().to_string());
  }

  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Ok(text[start..=end].to_string());
    }
  }

  Err(LlmError::MalformedResponse(
    "Could not extract JSON from response".to_string(),
  ))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
