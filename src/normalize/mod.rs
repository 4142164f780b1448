//! AI response normalization pipeline.
//!
//! ```text
//! raw text ─parse─┬─ ok ───────────────────────┐
//!                 └─ fail ─repair─┬─ ok ────────┼─► schema ─┬─ ok ──► ids ──► Outcome
//!                                 └─ fail ─┐    │           └─ fail ─┐
//!                                          └────┴──► fallback ◄──────┘
//! ```
//!
//! - `repair`   : text → text, best effort
//! - `schema`   : loose `Value` → typed `GeneratedContent`
//! - `ids`      : fills missing ids, rewrites node order/status
//! - `fallback` : canned content, never fails
//!
//! `run` never returns an error; the `Resolution` on the outcome says which
//! branch produced the content.

pub mod fallback;
pub mod ids;
pub mod repair;
pub mod schema;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{ContentVariant, Difficulty, ExerciseType, GeneratedContent};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
  #[error("model output is not valid JSON, even after repair: {0}")]
  Parse(String),
  #[error("model output lacks the minimum structure: {0}")]
  NormalizationFailed(String),
  #[error("model call failed: {0}")]
  Upstream(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
  Parsed,
  Repaired,
  FallenBack { reason: PipelineError },
}

impl Resolution {
  pub fn as_str(&self) -> &'static str {
    match self {
      Resolution::Parsed => "parsed",
      Resolution::Repaired => "repaired",
      Resolution::FallenBack { .. } => "fallback",
    }
  }

  pub fn is_fallback(&self) -> bool {
    matches!(self, Resolution::FallenBack { .. })
  }
}

#[derive(Debug, Clone)]
pub struct Outcome {
  pub content: GeneratedContent,
  pub resolution: Resolution,
}

/// What the fallback builders need to know about the original request.
#[derive(Debug, Clone)]
pub struct FallbackContext {
  /// Free-text goal for paths, topic for exercises and quizzes.
  pub prompt: String,
  pub level: Difficulty,
  pub exercise_type: ExerciseType,
  pub num_questions: u32,
}

impl FallbackContext {
  pub fn for_path(prompt: &str, level: Difficulty) -> Self {
    Self { prompt: prompt.to_string(), level, exercise_type: ExerciseType::HandsOn, num_questions: 1 }
  }

  pub fn for_exercise(topic: &str, exercise_type: ExerciseType, difficulty: Difficulty) -> Self {
    Self { prompt: topic.to_string(), level: difficulty, exercise_type, num_questions: 1 }
  }

  pub fn for_quiz(topic: &str, difficulty: Difficulty, num_questions: u32) -> Self {
    Self { prompt: topic.to_string(), level: difficulty, exercise_type: ExerciseType::HandsOn, num_questions }
  }
}

pub fn run(raw: &str, variant: ContentVariant, ctx: &FallbackContext) -> Outcome {
  let (value, repaired) = match repair::parse_lenient(raw) {
    Ok(parsed) => parsed,
    Err(e) => return fallback(variant, ctx, PipelineError::Parse(e.to_string())),
  };

  let mut content = match schema::normalize(value, variant) {
    Ok(content) => content,
    Err(e) => return fallback(variant, ctx, e),
  };
  ids::inject(&mut content);

  let resolution = if repaired { Resolution::Repaired } else { Resolution::Parsed };
  debug!(
    target: "normalize",
    variant = variant.as_str(),
    resolution = resolution.as_str(),
    id = %content.id(),
    "model output normalized"
  );
  Outcome { content, resolution }
}

pub fn fallback(variant: ContentVariant, ctx: &FallbackContext, reason: PipelineError) -> Outcome {
  warn!(target: "normalize", variant = variant.as_str(), reason = %reason, "serving fallback content");

  let mut content = match variant {
    ContentVariant::LearningPath => {
      GeneratedContent::LearningPath(fallback::learning_path(&ctx.prompt, ctx.level))
    }
    ContentVariant::Exercise => {
      GeneratedContent::Exercise(fallback::exercise(&ctx.prompt, ctx.exercise_type, ctx.level))
    }
    ContentVariant::Quiz => {
      GeneratedContent::Quiz(fallback::quiz(&ctx.prompt, ctx.level, ctx.num_questions))
    }
  };
  ids::inject(&mut content);

  Outcome { content, resolution: Resolution::FallenBack { reason } }
}
