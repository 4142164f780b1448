//! Minimal chat-completions client (Azure OpenAI or any OpenAI-compatible API).
//!
//! We only call chat.completions and ask for plain text or a JSON object.
//! Every call goes through `with_retry`: transient failures (timeouts,
//! connection errors, 408/429/5xx) are retried with exponential backoff,
//! anything else is returned at once.
//!
//! Calls are instrumented and log model names, latencies, token usage and
//! response sizes, never contents. The API key is never logged.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::{AiProvider, AiSettings};
use crate::domain::{Difficulty, Exercise, ExerciseType};
use crate::error::AiError;
use crate::grading::Evaluation;
use crate::normalize::repair::parse_lenient;
use crate::prompts::{enhance_with_preferences, CertificationTemplate, LearningPreferences, Prompts};
use crate::util::{fill_template, trunc_for_log};

/// Sampling parameters for one kind of call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChatParams {
  pub temperature: f32,
  pub max_tokens: Option<u32>,
  /// Ask for `response_format = json_object`.
  pub json: bool,
}

impl ChatParams {
  pub const LEARNING_PATH: Self = Self { temperature: 0.7, max_tokens: Some(4000), json: true };
  pub const QUIZ: Self = Self { temperature: 0.8, max_tokens: Some(2000), json: true };
  // Exercises are requested without JSON mode; the repair filter copes with chatter.
  pub const EXERCISE: Self = Self { temperature: 0.7, max_tokens: Some(1500), json: false };
  pub const EXPLAIN: Self = Self { temperature: 0.5, max_tokens: Some(1000), json: false };
  pub const HINT: Self = Self { temperature: 0.3, max_tokens: Some(300), json: false };
  pub const EVALUATION: Self = Self { temperature: 0.2, max_tokens: Some(800), json: true };
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub initial_backoff: Duration,
  pub max_backoff: Duration,
}

impl RetryPolicy {
  pub fn from_settings(ai: &AiSettings) -> Self {
    Self {
      max_attempts: ai.retry_attempts.max(1),
      initial_backoff: ai.retry_min,
      max_backoff: ai.retry_max.max(ai.retry_min),
    }
  }

  /// Delay after the `attempt`-th failure (1-based): initial · 2^(attempt-1), capped.
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
  }
}

/// Run `op` until it succeeds, fails non-transiently, or attempts run out.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, AiError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, AiError>>,
{
  let attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(v) => return Ok(v),
      Err(e) if e.is_transient() && attempt < attempts => {
        let delay = policy.delay_for(attempt);
        warn!(target: "openai", %label, attempt, ?delay, error = %e, "transient failure, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

/// Inputs of a learning-path generation call.
pub struct PathPrompt<'a> {
  pub goal: &'a str,
  pub level: Difficulty,
  pub time_commitment: &'a str,
  pub preferences: &'a LearningPreferences,
  pub certification: Option<&'a CertificationTemplate>,
}

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  provider: AiProvider,
  model: String,
  retry: RetryPolicy,
}

impl OpenAI {
  /// Build the client if a key is configured; otherwise return None.
  pub fn from_settings(ai: &AiSettings) -> Option<Self> {
    let api_key = ai.api_key.clone()?;
    let client = reqwest::Client::builder()
      .timeout(ai.timeout)
      .build()
      .map_err(|e| warn!(target: "openai", error = %e, "failed to build HTTP client, AI disabled"))
      .ok()?;

    Some(Self {
      client,
      api_key,
      provider: ai.provider.clone(),
      model: ai.model.clone(),
      retry: RetryPolicy::from_settings(ai),
    })
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub fn provider_name(&self) -> &'static str {
    self.provider.name()
  }

  fn completions_url(&self) -> String {
    match &self.provider {
      AiProvider::Azure { endpoint, deployment, api_version } => format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        api_version
      ),
      AiProvider::OpenAi { base_url } => format!("{}/chat/completions", base_url.trim_end_matches('/')),
    }
  }

  fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.provider {
      AiProvider::Azure { .. } => req.header("api-key", &self.api_key),
      AiProvider::OpenAi { .. } => req.header(AUTHORIZATION, format!("Bearer {}", self.api_key)),
    }
  }

  /// One HTTP round trip, no retries.
  async fn chat_once(&self, system: &str, user: &str, params: ChatParams) -> Result<String, AiError> {
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: params.temperature,
      response_format: params.json.then(|| ResponseFormat { r#type: "json_object".into() }),
      max_tokens: params.max_tokens,
    };

    let res = self
      .authorize(self.client.post(self.completions_url()))
      .header(USER_AGENT, "learnpath-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await
      .map_err(transport_error)?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(status_error(status, msg));
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| AiError::Fatal(format!("unreadable completion body: {e}")))?;
    if let Some(usage) = &body.usage {
      info!(target: "openai", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "usage");
    }

    let text = body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default()
      .trim()
      .to_string();
    if text.is_empty() {
      return Err(AiError::Fatal("model returned an empty completion".into()));
    }
    Ok(text)
  }

  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model, provider = self.provider.name()))]
  async fn chat(&self, label: &'static str, system: &str, user: &str, params: ChatParams) -> Result<String, AiError> {
    let start = Instant::now();
    let result = with_retry(&self.retry, label, move || self.chat_once(system, user, params)).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(text) => info!(target: "openai", label, ?elapsed, response_len = text.len(), "model response received"),
      Err(e) => warn!(target: "openai", label, ?elapsed, error = %e, "model call failed"),
    }
    result
  }

  // --- High-level helpers (domain-specialized) ---

  /// Raw model text for a learning path; the caller runs it through `normalize`.
  #[instrument(
    level = "info",
    skip(self, prompts, req),
    fields(level = req.level.as_str(), goal_len = req.goal.len(), certification = ?req.certification.map(|c| c.key))
  )]
  pub async fn generate_learning_path(&self, prompts: &Prompts, req: &PathPrompt<'_>) -> Result<String, AiError> {
    let system = prompts.learning_path_system_for(req.certification);
    let preferences = serde_json::to_string(req.preferences).unwrap_or_else(|_| "{}".into());
    let user = fill_template(
      &prompts.learning_path_user_template,
      &[
        ("goal", req.goal),
        ("level", req.level.as_str()),
        ("time_commitment", req.time_commitment),
        ("preferences", &preferences),
      ],
    );
    let user = enhance_with_preferences(&user, req.preferences);
    self.chat("learning_path", &system, &user, ChatParams::LEARNING_PATH).await
  }

  #[instrument(level = "info", skip(self, prompts, difficulty), fields(difficulty = difficulty.as_str()))]
  pub async fn generate_quiz(
    &self,
    prompts: &Prompts,
    topic: &str,
    difficulty: Difficulty,
    num_questions: u32,
  ) -> Result<String, AiError> {
    let n = num_questions.to_string();
    let user = fill_template(
      &prompts.quiz_user_template,
      &[("num_questions", &n), ("topic", topic), ("difficulty", difficulty.as_str())],
    );
    self.chat("quiz", &prompts.quiz_system, &user, ChatParams::QUIZ).await
  }

  #[instrument(level = "info", skip(self, prompts, kind, difficulty), fields(kind = kind.as_str(), difficulty = difficulty.as_str()))]
  pub async fn generate_exercise(
    &self,
    prompts: &Prompts,
    topic: &str,
    kind: ExerciseType,
    difficulty: Difficulty,
  ) -> Result<String, AiError> {
    let user = fill_template(
      &prompts.exercise_user_template,
      &[("exercise_type", kind.as_str()), ("topic", topic), ("difficulty", difficulty.as_str())],
    );
    self.chat("exercise", &prompts.exercise_system, &user, ChatParams::EXERCISE).await
  }

  #[instrument(level = "info", skip(self, prompts, concept, context), fields(concept_len = concept.len(), has_context = context.is_some()))]
  pub async fn explain_concept(
    &self,
    prompts: &Prompts,
    concept: &str,
    context: Option<&str>,
    certification: &str,
    level: Difficulty,
  ) -> Result<String, AiError> {
    let user = fill_template(
      &prompts.explain_user_template,
      &[
        ("concept", concept),
        ("certification", certification),
        ("level", level.as_str()),
        ("context", context.unwrap_or("none")),
      ],
    );
    self.chat("explain", &prompts.explain_system, &user, ChatParams::EXPLAIN).await
  }

  #[instrument(level = "info", skip(self, prompts, exercise, current_code), fields(exercise_id = %exercise.id, code_len = current_code.len()))]
  pub async fn provide_hint(
    &self,
    prompts: &Prompts,
    exercise: &Exercise,
    current_code: &str,
    hint_level: u8,
  ) -> Result<String, AiError> {
    let level = hint_level.to_string();
    let user = fill_template(
      &prompts.hint_user_template,
      &[
        ("title", &exercise.title),
        ("description", &exercise.description),
        ("current_code", current_code),
        ("hint_level", &level),
      ],
    );
    self.chat("hint", &prompts.hint_system, &user, ChatParams::HINT).await
  }

  /// Model review of a submission. The reply goes through the repair filter before decoding.
  #[instrument(level = "info", skip(self, prompts, exercise, submission, language), fields(exercise_id = %exercise.id, %language, submission_len = submission.len()))]
  pub async fn evaluate_submission(
    &self,
    prompts: &Prompts,
    exercise: &Exercise,
    submission: &str,
    language: &str,
  ) -> Result<Evaluation, AiError> {
    let instructions = exercise.instructions.join("\n");
    let user = fill_template(
      &prompts.evaluation_user_template,
      &[
        ("title", &exercise.title),
        ("description", &exercise.description),
        ("instructions", &instructions),
        ("language", language),
        ("submission", submission),
      ],
    );
    let raw = self.chat("evaluation", &prompts.evaluation_system, &user, ChatParams::EVALUATION).await?;

    let (value, _) = parse_lenient(&raw).map_err(|e| AiError::Fatal(format!("evaluation is not JSON: {e}")))?;
    let evaluation: Evaluation = serde_json::from_value(value)
      .map_err(|e| AiError::Fatal(format!("evaluation has the wrong shape: {e}")))?;
    Ok(evaluation.clamped())
  }
}

fn transport_error(e: reqwest::Error) -> AiError {
  if e.is_timeout() || e.is_connect() || e.is_request() {
    AiError::Transient(e.to_string())
  } else {
    AiError::Fatal(e.to_string())
  }
}

fn status_error(status: StatusCode, msg: String) -> AiError {
  let text = format!("HTTP {}: {}", status.as_u16(), msg);
  if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
    AiError::Transient(text)
  } else {
    AiError::Fatal(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Pull `error.message` out of an OpenAI/Azure error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn instant_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy { max_attempts, initial_backoff: Duration::ZERO, max_backoff: Duration::ZERO }
  }

  fn ai_settings(provider: AiProvider, key: Option<&str>) -> AiSettings {
    AiSettings {
      api_key: key.map(str::to_string),
      provider,
      model: "gpt-test".into(),
      timeout: Duration::from_secs(5),
      retry_attempts: 3,
      retry_min: Duration::from_secs(4),
      retry_max: Duration::from_secs(10),
    }
  }

  #[test]
  fn backoff_doubles_then_caps() {
    let policy = RetryPolicy {
      max_attempts: 5,
      initial_backoff: Duration::from_secs(4),
      max_backoff: Duration::from_secs(10),
    };
    assert_eq!(policy.delay_for(1), Duration::from_secs(4));
    assert_eq!(policy.delay_for(2), Duration::from_secs(8));
    assert_eq!(policy.delay_for(3), Duration::from_secs(10));
    assert_eq!(policy.delay_for(40), Duration::from_secs(10));
  }

  #[tokio::test]
  async fn transient_errors_are_retried_until_success() {
    let calls = AtomicU32::new(0);
    let result = with_retry(&instant_policy(3), "test", || {
      let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
      async move {
        if n < 3 { Err(AiError::Transient("503".into())) } else { Ok(n) }
      }
    })
    .await;
    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn retries_stop_at_the_attempt_limit() {
    let calls = AtomicU32::new(0);
    let result: Result<(), AiError> = with_retry(&instant_policy(3), "test", || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Err(AiError::Transient("timeout".into())) }
    })
    .await;
    assert!(matches!(result, Err(AiError::Transient(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn fatal_errors_are_not_retried() {
    let calls = AtomicU32::new(0);
    let result: Result<(), AiError> = with_retry(&instant_policy(3), "test", || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Err(AiError::Fatal("401".into())) }
    })
    .await;
    assert!(matches!(result, Err(AiError::Fatal(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn http_statuses_are_classified() {
    assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "slow down".into()).is_transient());
    assert!(status_error(StatusCode::REQUEST_TIMEOUT, String::new()).is_transient());
    assert!(status_error(StatusCode::BAD_GATEWAY, String::new()).is_transient());
    assert!(!status_error(StatusCode::UNAUTHORIZED, "bad key".into()).is_transient());
    assert!(!status_error(StatusCode::BAD_REQUEST, String::new()).is_transient());
  }

  #[test]
  fn urls_follow_the_provider() {
    let azure = OpenAI::from_settings(&ai_settings(
      AiProvider::Azure {
        endpoint: "https://contoso.openai.azure.com/".into(),
        deployment: "gpt-4.1".into(),
        api_version: "2024-02-15-preview".into(),
      },
      Some("k"),
    ))
    .unwrap();
    assert_eq!(
      azure.completions_url(),
      "https://contoso.openai.azure.com/openai/deployments/gpt-4.1/chat/completions?api-version=2024-02-15-preview"
    );

    let openai = OpenAI::from_settings(&ai_settings(
      AiProvider::OpenAi { base_url: "https://api.openai.com/v1/".into() },
      Some("k"),
    ))
    .unwrap();
    assert_eq!(openai.completions_url(), "https://api.openai.com/v1/chat/completions");
    assert_eq!(openai.provider_name(), "openai");
  }

  #[test]
  fn no_key_means_no_client() {
    let settings = ai_settings(AiProvider::OpenAi { base_url: "https://api.openai.com/v1".into() }, None);
    assert!(OpenAI::from_settings(&settings).is_none());
  }

  #[test]
  fn error_bodies_are_unwrapped() {
    let body = r#"{"error": {"message": "Invalid API key", "code": "401"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Invalid API key"));
    assert!(extract_openai_error("<html>").is_none());
  }
}
