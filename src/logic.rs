//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Generating paths, exercises and quizzes (model call → normalize → store)
//!   - Serving stored content, or the built-in samples for unknown ids
//!   - Progress tracking on stored paths
//!   - Explanations and hints (model only, no fallback)
//!   - Submission evaluation, mocked test runs and quiz grading

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
  ContentVariant, Difficulty, Exercise, GeneratedContent, LearningPath, LearningPathProgress, NodeStatus, Quiz,
};
use crate::error::{AiError, ApiError, ApiResult};
use crate::grading::{self, Evaluation, TestRun};
use crate::normalize::{self, schema, FallbackContext, Outcome, PipelineError, Resolution};
use crate::openai::PathPrompt;
use crate::prompts::detect_template;
use crate::protocol::*;
use crate::seeds;
use crate::state::AppState;
use crate::validate;

const GENERIC_CERTIFICATION: &str = "cloud certification";

/// A generated entity and how the pipeline arrived at it.
#[derive(Debug, Clone)]
pub struct Generated<T> {
  pub item: T,
  pub resolution: Resolution,
}

/// Turn a model result into content. Upstream errors (including a disabled
/// client) go straight to the fallback builders.
fn resolve(raw: Result<String, AiError>, variant: ContentVariant, ctx: &FallbackContext) -> Outcome {
  match raw {
    Ok(raw) => normalize::run(&raw, variant, ctx),
    Err(e) => normalize::fallback(variant, ctx, PipelineError::Upstream(e.to_string())),
  }
}

fn mismatch(expected: ContentVariant, got: &GeneratedContent) -> ApiError {
  ApiError::Internal(format!("pipeline returned {} for a {} request", got.variant().as_str(), expected.as_str()))
}

/// Provenance fields for content the model actually produced.
fn mark_generated(metadata: &mut Map<String, Value>, state: &AppState, resolution: &Resolution) {
  if resolution.is_fallback() {
    return;
  }
  metadata.insert("ai_generated".into(), Value::Bool(true));
  metadata.insert("resolution".into(), json!(resolution.as_str()));
  if let Some(ai) = &state.ai {
    metadata.insert("model".into(), json!(ai.model()));
  }
  metadata.insert("generated_at".into(), json!(Utc::now()));
}

// ---- learning paths ----

#[instrument(level = "info", skip(state, req), fields(prompt_len = req.prompt.len()))]
pub async fn generate_learning_path(state: &AppState, req: LearningPathRequest) -> ApiResult<Generated<LearningPath>> {
  let goal = validate::prompt(&req.prompt)?;
  let level = schema::difficulty(req.user_level.clone(), Difficulty::Beginner);
  let certification = detect_template(goal);
  let ctx = FallbackContext::for_path(goal, level);

  let raw = match &state.ai {
    Some(ai) => {
      let prompt = PathPrompt {
        goal,
        level,
        time_commitment: &req.time_commitment,
        preferences: &req.preferences,
        certification,
      };
      ai.generate_learning_path(&state.prompts, &prompt).await
    }
    None => Err(AiError::Disabled),
  };

  let Outcome { content, resolution } = resolve(raw, ContentVariant::LearningPath, &ctx);
  let mut path = match content {
    GeneratedContent::LearningPath(path) => path,
    other => return Err(mismatch(ContentVariant::LearningPath, &other)),
  };

  mark_generated(&mut path.metadata, state, &resolution);
  path.metadata.insert("user_level".into(), json!(level.as_str()));
  path.metadata.insert("time_commitment".into(), json!(req.time_commitment));
  if path.certification_target.is_none() {
    path.certification_target = certification.map(|c| c.title.to_string());
  }
  if path.progress.is_none() {
    path.progress = Some(LearningPathProgress::starting_at(path.nodes.first()));
  }
  let now = Utc::now();
  path.created_at.get_or_insert(now);
  path.updated_at = Some(now);

  let path = state.repo.save_learning_path(path).await?;
  info!(
    target: "learnpath",
    id = %path.id,
    nodes = path.nodes.len(),
    resolution = resolution.as_str(),
    "learning path generated"
  );
  Ok(Generated { item: path, resolution })
}

/// Stored path, or the sample path carrying the requested id.
#[instrument(level = "debug", skip(state))]
pub async fn learning_path_or_sample(state: &AppState, path_id: &str) -> LearningPath {
  match state.repo.get_learning_path(path_id).await {
    Ok(path) => path,
    Err(e) => {
      debug!(target: "learnpath", %path_id, error = %e, "serving sample learning path");
      seeds::mock_learning_path(path_id)
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn node_content(state: &AppState, path_id: &str, node_id: &str) -> ApiResult<NodeContentOut> {
  let path = learning_path_or_sample(state, path_id).await;
  let node = path
    .node(node_id)
    .ok_or_else(|| ApiError::NotFound(format!("node not found: {node_id}")))?;
  Ok(NodeContentOut::new(&path.id, node))
}

/// Apply a status change to one node and recompute the path's progress record.
pub fn apply_progress(path: &mut LearningPath, update: &ProgressUpdate) -> ApiResult<LearningPathProgress> {
  let node = path
    .nodes
    .iter_mut()
    .find(|n| n.id == update.node_id)
    .ok_or_else(|| ApiError::NotFound(format!("node not found: {}", update.node_id)))?;
  node.status = update.status;

  let first = path.nodes.first();
  let progress = path.progress.get_or_insert_with(|| LearningPathProgress::starting_at(first));

  if update.status == NodeStatus::Completed {
    if !progress.completed_nodes.contains(&update.node_id) {
      progress.completed_nodes.push(update.node_id.clone());
      progress.total_points_earned = progress.total_points_earned.saturating_add(update.points_earned);
    }
  } else {
    // earned points stay banked when a node is reopened
    progress.completed_nodes.retain(|id| id != &update.node_id);
  }

  let mut ordered: Vec<_> = path.nodes.iter().collect();
  ordered.sort_by_key(|n| n.order);
  progress.current_node_id = ordered
    .iter()
    .find(|n| !progress.completed_nodes.contains(&n.id))
    .map(|n| n.id.clone());

  let total = path.nodes.len().max(1) as f64;
  progress.overall_progress = progress.completed_nodes.len() as f64 * 100.0 / total;
  progress.last_activity = Utc::now();
  path.updated_at = Some(Utc::now());

  Ok(progress.clone())
}

#[instrument(level = "info", skip(state, update), fields(node_id = %update.node_id, status = update.status.as_str()))]
pub async fn update_progress(state: &AppState, path_id: &str, update: ProgressUpdate) -> ApiResult<ProgressOut> {
  let (persisted, progress) = match state.repo.get_learning_path(path_id).await {
    Ok(mut path) => {
      let progress = apply_progress(&mut path, &update)?;
      state.repo.update_learning_path(path).await?;
      (true, Some(progress))
    }
    Err(e) => {
      warn!(target: "learnpath", %path_id, error = %e, "progress update for unstored path echoed without persisting");
      (false, None)
    }
  };

  Ok(ProgressOut {
    success: true,
    path_id: path_id.to_string(),
    node_id: update.node_id,
    status: update.status,
    points_earned: update.points_earned,
    persisted,
    progress,
  })
}

#[instrument(level = "info", skip(state, req), fields(concept_len = req.concept.len()))]
pub async fn explain(state: &AppState, path_id: &str, req: ExplainRequest) -> ApiResult<ExplainOut> {
  let concept = req.concept.trim();
  if concept.is_empty() {
    return Err(ApiError::Validation("concept must not be empty".into()));
  }
  let ai = state.ai.as_ref().ok_or(AiError::Disabled)?;

  let (certification, level) = match state.repo.get_learning_path(path_id).await {
    Ok(path) => (
      path.certification_target.unwrap_or_else(|| GENERIC_CERTIFICATION.into()),
      path.difficulty_level,
    ),
    Err(_) => (GENERIC_CERTIFICATION.to_string(), Difficulty::Beginner),
  };

  let explanation = ai
    .explain_concept(&state.prompts, concept, req.context.as_deref(), &certification, level)
    .await?;
  Ok(ExplainOut { path_id: path_id.to_string(), concept: concept.to_string(), explanation })
}

// ---- exercises ----

#[instrument(level = "info", skip(state, req), fields(topic = %req.topic))]
pub async fn generate_exercise(state: &AppState, req: ExerciseGenerateRequest) -> ApiResult<Generated<Exercise>> {
  let topic = validate::topic(&req.topic)?;
  let kind = schema::exercise_type(Some(req.exercise_type.clone().unwrap_or_else(|| "code".into())));
  let difficulty = schema::difficulty(req.difficulty.clone(), Difficulty::Intermediate);
  let ctx = FallbackContext::for_exercise(topic, kind, difficulty);

  let raw = match &state.ai {
    Some(ai) => ai.generate_exercise(&state.prompts, topic, kind, difficulty).await,
    None => Err(AiError::Disabled),
  };

  let Outcome { content, resolution } = resolve(raw, ContentVariant::Exercise, &ctx);
  let mut exercise = match content {
    GeneratedContent::Exercise(exercise) => exercise,
    other => return Err(mismatch(ContentVariant::Exercise, &other)),
  };
  mark_generated(&mut exercise.metadata, state, &resolution);
  exercise.metadata.insert("topic".into(), json!(topic));

  let exercise = state.repo.save_exercise(exercise).await?;
  info!(target: "learnpath", id = %exercise.id, kind = exercise.kind.as_str(), resolution = resolution.as_str(), "exercise generated");
  Ok(Generated { item: exercise, resolution })
}

#[instrument(level = "debug", skip(state))]
pub async fn exercise_or_sample(state: &AppState, exercise_id: &str) -> Exercise {
  match state.repo.get_exercise(exercise_id).await {
    Ok(exercise) => exercise,
    Err(e) => {
      debug!(target: "learnpath", %exercise_id, error = %e, "serving sample exercise");
      seeds::mock_exercise(exercise_id)
    }
  }
}

/// Model review when available; the mocked test run otherwise or on any failure.
#[instrument(level = "info", skip(state, req), fields(language = %req.language, code_len = req.solution.len()))]
pub async fn evaluate(state: &AppState, exercise_id: &str, req: SubmissionRequest) -> ApiResult<Evaluation> {
  let code = validate::code(&req.solution)?;
  let language = validate::language(&req.language)?;
  let exercise = exercise_or_sample(state, exercise_id).await;

  if let Some(ai) = &state.ai {
    match ai.evaluate_submission(&state.prompts, &exercise, code, &language).await {
      Ok(evaluation) => return Ok(evaluation),
      Err(e) => {
        warn!(target: "learnpath", %exercise_id, error = %e, "model evaluation failed; grading locally");
      }
    }
  }
  Ok(grading::evaluate_locally(&exercise, code))
}

#[instrument(level = "info", skip(state, req), fields(code_len = req.current_code.len(), hint_level = req.hint_level))]
pub async fn hint(state: &AppState, exercise_id: &str, req: HintRequest) -> ApiResult<HintOut> {
  let ai = state.ai.as_ref().ok_or(AiError::Disabled)?;
  let level = req.hint_level.clamp(1, 3);
  let exercise = exercise_or_sample(state, exercise_id).await;
  let hint = ai.provide_hint(&state.prompts, &exercise, &req.current_code, level).await?;
  Ok(HintOut { hint, level })
}

#[instrument(level = "info", skip(state, req), fields(code_len = req.solution.len()))]
pub async fn submit(state: &AppState, exercise_id: &str, req: SubmissionRequest) -> ApiResult<SubmissionOut> {
  let code = validate::code(&req.solution)?;
  validate::language(&req.language)?;
  let exercise = exercise_or_sample(state, exercise_id).await;

  let grade = grading::grade_submission(&exercise, code);
  info!(target: "learnpath", %exercise_id, passed = grade.passed, points = grade.points_earned, "submission graded");
  Ok(SubmissionOut {
    exercise_id: exercise.id,
    passed: grade.passed,
    test_results: grade.test_results,
    feedback: grade.feedback,
    points_earned: grade.points_earned,
    time_taken_minutes: req.time_taken_minutes,
    submitted_at: Utc::now(),
  })
}

#[instrument(level = "info", skip(state, req), fields(code_len = req.code.len()))]
pub async fn run_tests(state: &AppState, exercise_id: &str, req: TestRunRequest) -> ApiResult<TestRun> {
  let code = validate::code(&req.code)?;
  if let Some(language) = req.language.as_deref() {
    validate::language(language)?;
  }
  let exercise = exercise_or_sample(state, exercise_id).await;
  Ok(grading::run_tests(&exercise, code))
}

// ---- quizzes ----

#[instrument(level = "info", skip(state, req), fields(topic = %req.topic, num_questions = req.num_questions))]
pub async fn generate_quiz(state: &AppState, req: QuizGenerateRequest) -> ApiResult<Generated<Quiz>> {
  let topic = validate::topic(&req.topic)?;
  let num_questions = validate::num_questions(req.num_questions)?;
  let difficulty = schema::difficulty(req.difficulty.clone(), Difficulty::Intermediate);
  let ctx = FallbackContext::for_quiz(topic, difficulty, num_questions);

  let raw = match &state.ai {
    Some(ai) => ai.generate_quiz(&state.prompts, topic, difficulty, num_questions).await,
    None => Err(AiError::Disabled),
  };

  let Outcome { content, resolution } = resolve(raw, ContentVariant::Quiz, &ctx);
  let mut quiz = match content {
    GeneratedContent::Quiz(quiz) => quiz,
    other => return Err(mismatch(ContentVariant::Quiz, &other)),
  };
  mark_generated(&mut quiz.metadata, state, &resolution);
  quiz.metadata.insert("topic".into(), json!(topic));

  let quiz = state.repo.save_quiz(quiz).await?;
  info!(target: "learnpath", id = %quiz.id, questions = quiz.questions.len(), resolution = resolution.as_str(), "quiz generated");
  Ok(Generated { item: quiz, resolution })
}

#[instrument(level = "debug", skip(state))]
pub async fn quiz_or_sample(state: &AppState, quiz_id: &str) -> Quiz {
  match state.repo.get_quiz(quiz_id).await {
    Ok(quiz) => quiz,
    Err(e) => {
      debug!(target: "learnpath", %quiz_id, error = %e, "serving sample quiz");
      seeds::mock_quiz(quiz_id)
    }
  }
}

/// Attempts are not tracked, so every learner sees the full allowance.
pub async fn public_quiz(state: &AppState, quiz_id: &str) -> PublicQuiz {
  let quiz = quiz_or_sample(state, quiz_id).await;
  PublicQuiz::from_quiz(&quiz, quiz.max_attempts)
}

#[instrument(level = "info", skip(state, submission), fields(answers = submission.answers.len()))]
pub async fn submit_quiz(state: &AppState, quiz_id: &str, submission: QuizSubmission) -> ApiResult<QuizSubmitOut> {
  let quiz = quiz_or_sample(state, quiz_id).await;
  let grade = grading::grade_quiz(&quiz, &submission.answers);
  info!(
    target: "learnpath",
    %quiz_id,
    score = %format!("{:.1}", grade.score),
    passed = grade.passed,
    "quiz graded"
  );
  Ok(QuizSubmitOut {
    quiz_id: quiz.id,
    grade,
    time_taken_minutes: submission.time_taken_minutes,
    submitted_at: Utc::now(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Settings;
  use crate::prompts::Prompts;
  use crate::store::InMemoryContentRepository;
  use std::sync::Arc;

  fn offline_state() -> AppState {
    let settings = Settings::from_lookup(|_| None);
    AppState::new(Arc::new(InMemoryContentRepository::new()), None, Prompts::default(), settings)
  }

  fn path_request(prompt: &str) -> LearningPathRequest {
    serde_json::from_value(json!({"prompt": prompt, "user_level": "intermediate"})).unwrap()
  }

  #[tokio::test]
  async fn offline_generation_serves_and_stores_fallback_path() {
    let state = offline_state();
    let out = generate_learning_path(&state, path_request("Prepare me for the AWS architect exam")).await.unwrap();
    assert!(out.resolution.is_fallback());
    assert_eq!(out.item.nodes.len(), 3);
    assert!(out.item.is_fallback());
    assert_eq!(out.item.progress.as_ref().unwrap().current_node_id.as_deref(), Some(out.item.nodes[0].id.as_str()));

    let stored = state.repo.get_learning_path(&out.item.id).await.unwrap();
    assert_eq!(stored.id, out.item.id);
    let nested = &stored.nodes[0].exercises[0].id;
    assert!(state.repo.get_exercise(nested).await.is_ok());
  }

  #[tokio::test]
  async fn short_prompt_is_rejected() {
    let err = generate_learning_path(&offline_state(), path_request("tiny")).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
  }

  #[tokio::test]
  async fn completing_nodes_advances_progress() {
    let state = offline_state();
    let path = generate_learning_path(&state, path_request("Learn Kubernetes administration")).await.unwrap().item;
    let first = path.nodes[0].id.clone();
    let second = path.nodes[1].id.clone();

    let update = ProgressUpdate { node_id: first.clone(), status: NodeStatus::Completed, points_earned: 40 };
    let out = update_progress(&state, &path.id, update).await.unwrap();
    assert!(out.persisted);
    let progress = out.progress.unwrap();
    assert_eq!(progress.completed_nodes, vec![first.clone()]);
    assert_eq!(progress.current_node_id.as_deref(), Some(second.as_str()));
    assert_eq!(progress.total_points_earned, 40);
    assert!((progress.overall_progress - 100.0 / 3.0).abs() < 1e-9);

    // repeating the completion does not double count
    let again = ProgressUpdate { node_id: first, status: NodeStatus::Completed, points_earned: 40 };
    let progress = update_progress(&state, &path.id, again).await.unwrap().progress.unwrap();
    assert_eq!(progress.total_points_earned, 40);

    let stored = state.repo.get_learning_path(&path.id).await.unwrap();
    assert_eq!(stored.nodes[0].status, NodeStatus::Completed);
  }

  #[test]
  fn reopening_a_node_drops_it_from_completed() {
    let mut path = seeds::mock_learning_path("path_1");
    let first = path.nodes[0].id.clone();
    let done = ProgressUpdate { node_id: first.clone(), status: NodeStatus::Completed, points_earned: 40 };
    apply_progress(&mut path, &done).unwrap();

    let reopen = ProgressUpdate { node_id: first.clone(), status: NodeStatus::InProgress, points_earned: 0 };
    let progress = apply_progress(&mut path, &reopen).unwrap();
    assert!(progress.completed_nodes.is_empty());
    assert_eq!(progress.overall_progress, 0.0);
    assert_eq!(progress.current_node_id.as_deref(), Some(first.as_str()));
    assert_eq!(progress.total_points_earned, 40);
    assert_eq!(path.nodes[0].status, NodeStatus::InProgress);

    // completing it again counts once more
    let progress = apply_progress(&mut path, &done).unwrap();
    assert_eq!(progress.completed_nodes, vec![first]);
  }

  #[test]
  fn earned_points_saturate() {
    let mut path = seeds::mock_learning_path("path_1");
    for node in path.nodes.clone() {
      let update = ProgressUpdate { node_id: node.id, status: NodeStatus::Completed, points_earned: u32::MAX - 1 };
      apply_progress(&mut path, &update).unwrap();
    }
    let progress = path.progress.unwrap();
    assert_eq!(progress.total_points_earned, u32::MAX);
    assert_eq!(progress.overall_progress, 100.0);
    assert!(progress.current_node_id.is_none());
  }

  #[tokio::test]
  async fn progress_on_unknown_node_is_not_found() {
    let state = offline_state();
    let path = generate_learning_path(&state, path_request("Learn Kubernetes administration")).await.unwrap().item;
    let update = ProgressUpdate { node_id: "node_missing".into(), status: NodeStatus::InProgress, points_earned: 0 };
    let err = update_progress(&state, &path.id, update).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn progress_on_unstored_path_is_echoed() {
    let update = ProgressUpdate { node_id: "node_001".into(), status: NodeStatus::Completed, points_earned: 5 };
    let out = update_progress(&offline_state(), "path_unknown", update).await.unwrap();
    assert!(!out.persisted);
    assert!(out.progress.is_none());
    assert_eq!(out.points_earned, 5);
  }

  #[tokio::test]
  async fn explain_and_hint_need_a_model() {
    let state = offline_state();
    let req = ExplainRequest { concept: "Availability zones".into(), context: None };
    assert!(matches!(explain(&state, "path_x", req).await, Err(ApiError::AiUnavailable(_))));
    let req = HintRequest { current_code: "def f(): pass".into(), hint_level: 2 };
    assert!(matches!(hint(&state, "ex_x", req).await, Err(ApiError::AiUnavailable(_))));
  }

  #[tokio::test]
  async fn offline_evaluation_grades_locally() {
    let req = SubmissionRequest { solution: "print('hi')".into(), language: "python".into(), time_taken_minutes: 3 };
    let eval = evaluate(&offline_state(), "ex_sample", req).await.unwrap();
    assert_eq!(eval.source, grading::EvaluationSource::MockTests);
    assert!(!eval.passed);
  }

  #[tokio::test]
  async fn generated_quiz_is_gradable_by_id() {
    let state = offline_state();
    let req: QuizGenerateRequest =
      serde_json::from_value(json!({"topic": "IAM", "num_questions": 2})).unwrap();
    let quiz = generate_quiz(&state, req).await.unwrap().item;
    assert_eq!(quiz.questions.len(), 2);

    let answers: Map<String, Value> = quiz.questions.iter().map(|q| (q.id.clone(), json!(0))).collect();
    let out = submit_quiz(&state, &quiz.id, QuizSubmission { answers, time_taken_minutes: 4 }).await.unwrap();
    assert_eq!(out.grade.correct_answers, 2);
    assert!(out.grade.passed);
  }
}
