//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Generation handlers report how the content was obtained in `x-content-resolution`.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::grading::{Evaluation, TestRun};
use crate::logic;
use crate::protocol::*;
use crate::seeds;
use crate::state::AppState;

pub const RESOLUTION_HEADER: &str = "x-content-resolution";

const SERVICE_NAME: &str = "learnpath-backend";

#[instrument(level = "info", skip(state))]
pub async fn http_root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ServiceInfoOut {
    status: "healthy",
    service: SERVICE_NAME,
    version: state.settings.version.clone(),
    environment: state.settings.environment.clone(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    status: "healthy",
    timestamp: Utc::now(),
    version: state.settings.version.clone(),
    environment: state.settings.environment.clone(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let stats = state.repo.stats().await;
  let checks = ReadyChecks { api: true, ai: state.ai_enabled(), store: true };
  let ready = checks.api && checks.ai && checks.store;
  info!(
    target: "learnpath",
    ready,
    ai = checks.ai,
    paths = stats.learning_paths,
    exercises = stats.exercises,
    quizzes = stats.quizzes,
    "readiness probed"
  );
  Json(ReadyOut { ready, checks, timestamp: Utc::now() })
}

// ---- learning paths ----

#[instrument(level = "info", skip(state, body), fields(prompt_len = body.prompt.len()))]
pub async fn http_generate_learning_path(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LearningPathRequest>,
) -> ApiResult<impl IntoResponse> {
  let out = logic::generate_learning_path(&state, body).await?;
  Ok(([(RESOLUTION_HEADER, out.resolution.as_str())], Json(out.item)))
}

#[instrument(level = "info")]
pub async fn http_mock_learning_path() -> impl IntoResponse {
  Json(seeds::mock_learning_path("mock"))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_learning_path(
  State(state): State<Arc<AppState>>,
  Path(path_id): Path<String>,
) -> impl IntoResponse {
  Json(logic::learning_path_or_sample(&state, &path_id).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_node_content(
  State(state): State<Arc<AppState>>,
  Path((path_id, node_id)): Path<(String, String)>,
) -> ApiResult<Json<NodeContentOut>> {
  Ok(Json(logic::node_content(&state, &path_id, &node_id).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_explain(
  State(state): State<Arc<AppState>>,
  Path(path_id): Path<String>,
  Json(body): Json<ExplainRequest>,
) -> ApiResult<Json<ExplainOut>> {
  Ok(Json(logic::explain(&state, &path_id, body).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_update_progress(
  State(state): State<Arc<AppState>>,
  Path(path_id): Path<String>,
  Json(body): Json<ProgressUpdate>,
) -> ApiResult<Json<ProgressOut>> {
  Ok(Json(logic::update_progress(&state, &path_id, body).await?))
}

// ---- exercises ----

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_generate_exercise(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExerciseGenerateRequest>,
) -> ApiResult<impl IntoResponse> {
  let out = logic::generate_exercise(&state, body).await?;
  Ok(([(RESOLUTION_HEADER, out.resolution.as_str())], Json(out.item)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_exercise(
  State(state): State<Arc<AppState>>,
  Path(exercise_id): Path<String>,
) -> impl IntoResponse {
  Json(logic::exercise_or_sample(&state, &exercise_id).await)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_evaluate(
  State(state): State<Arc<AppState>>,
  Path(exercise_id): Path<String>,
  Json(body): Json<SubmissionRequest>,
) -> ApiResult<Json<Evaluation>> {
  Ok(Json(logic::evaluate(&state, &exercise_id, body).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_hint(
  State(state): State<Arc<AppState>>,
  Path(exercise_id): Path<String>,
  Json(body): Json<HintRequest>,
) -> ApiResult<Json<HintOut>> {
  Ok(Json(logic::hint(&state, &exercise_id, body).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_submit_exercise(
  State(state): State<Arc<AppState>>,
  Path(exercise_id): Path<String>,
  Json(body): Json<SubmissionRequest>,
) -> ApiResult<Json<SubmissionOut>> {
  Ok(Json(logic::submit(&state, &exercise_id, body).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_run_tests(
  State(state): State<Arc<AppState>>,
  Path(exercise_id): Path<String>,
  Json(body): Json<TestRunRequest>,
) -> ApiResult<Json<TestRun>> {
  Ok(Json(logic::run_tests(&state, &exercise_id, body).await?))
}

// ---- quizzes ----

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_generate_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizGenerateRequest>,
) -> ApiResult<impl IntoResponse> {
  let out = logic::generate_quiz(&state, body).await?;
  Ok(([(RESOLUTION_HEADER, out.resolution.as_str())], Json(out.item)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(quiz_id): Path<String>,
) -> impl IntoResponse {
  Json(logic::public_quiz(&state, &quiz_id).await)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_submit_quiz(
  State(state): State<Arc<AppState>>,
  Path(quiz_id): Path<String>,
  Json(body): Json<QuizSubmission>,
) -> ApiResult<Json<QuizSubmitOut>> {
  Ok(Json(logic::submit_quiz(&state, &quiz_id, body).await?))
}

pub async fn http_not_found() -> ApiError {
  ApiError::NotFound("route not found".into())
}
