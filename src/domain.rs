//! Domain models: learning paths, nodes, exercises, quizzes and their enums.
//!
//! These are the *output* schema of the normalization pipeline. Everything
//! the model returns is coerced into these shapes before it leaves the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which top-level shape a generation request expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentVariant {
  LearningPath,
  Exercise,
  Quiz,
}

impl ContentVariant {
  pub fn as_str(&self) -> &'static str {
    match self {
      ContentVariant::LearningPath => "learning_path",
      ContentVariant::Exercise => "exercise",
      ContentVariant::Quiz => "quiz",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseType {
  #[default]
  HandsOn,
  Project,
  Code,
  Capstone,
}

impl ExerciseType {
  pub const ALL: [ExerciseType; 4] =
    [ExerciseType::HandsOn, ExerciseType::Project, ExerciseType::Code, ExerciseType::Capstone];

  pub fn as_str(&self) -> &'static str {
    match self {
      ExerciseType::HandsOn => "hands-on",
      ExerciseType::Project => "project",
      ExerciseType::Code => "code",
      ExerciseType::Capstone => "capstone",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
  #[default]
  Module,
  Project,
  Assessment,
  Milestone,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  #[default]
  NotStarted,
  InProgress,
  Completed,
  Locked,
}

impl NodeStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeStatus::NotStarted => "not_started",
      NodeStatus::InProgress => "in_progress",
      NodeStatus::Completed => "completed",
      NodeStatus::Locked => "locked",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  #[default]
  MultipleChoice,
  MultipleSelect,
  TrueFalse,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
  Video,
  Article,
  Documentation,
  Pdf,
  #[default]
  External,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  pub title: String,
  #[serde(rename = "type")]
  pub kind: ResourceType,
  pub url: String,
  pub duration_minutes: u32,
  #[serde(default = "default_true")]
  pub is_required: bool,
}

fn default_true() -> bool { true }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
  pub input: String,
  pub expected_output: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub title: String,
  pub description: String,
  #[serde(rename = "type")]
  pub kind: ExerciseType,
  pub difficulty: Difficulty,
  pub estimated_time_minutes: u32,
  pub points: u32,
  pub instructions: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sandbox_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub starter_code: Option<String>,
  #[serde(default)]
  pub test_cases: Vec<TestCase>,
  #[serde(default)]
  pub hints: Vec<String>,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub metadata: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
  pub id: String,
  pub question: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub options: Vec<String>,
  /// Index into `options` for single-answer questions.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub correct_answer: Option<usize>,
  /// Indices into `options` for multiple-select questions.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub correct_answers: Option<Vec<usize>>,
  pub explanation: String,
  pub points: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
  pub id: String,
  pub title: String,
  pub description: String,
  pub questions: Vec<QuizQuestion>,
  pub passing_score: u32,
  pub time_limit_minutes: u32,
  pub max_attempts: u32,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub metadata: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
  pub id: String,
  pub title: String,
  pub description: String,
  pub order: u32,
  pub duration_hours: u32,
  #[serde(rename = "type")]
  pub kind: NodeType,
  pub status: NodeStatus,
  #[serde(default)]
  pub prerequisites: Vec<String>,
  #[serde(default)]
  pub topics: Vec<String>,
  #[serde(default)]
  pub resources: Vec<Resource>,
  #[serde(default)]
  pub exercises: Vec<Exercise>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quiz: Option<Quiz>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completion_criteria: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningPathProgress {
  #[serde(default)]
  pub completed_nodes: Vec<String>,
  #[serde(default)]
  pub current_node_id: Option<String>,
  #[serde(default)]
  pub overall_progress: f64,
  #[serde(default)]
  pub total_points_earned: u32,
  #[serde(default)]
  pub badges_earned: Vec<String>,
  pub last_activity: DateTime<Utc>,
  #[serde(default)]
  pub time_spent_hours: f64,
}

impl LearningPathProgress {
  /// Fresh progress record pointing at the first node.
  pub fn starting_at(first_node: Option<&PathNode>) -> Self {
    Self {
      completed_nodes: vec![],
      current_node_id: first_node.map(|n| n.id.clone()),
      overall_progress: 0.0,
      total_points_earned: 0,
      badges_earned: vec![],
      last_activity: Utc::now(),
      time_spent_hours: 0.0,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
  pub id: String,
  pub title: String,
  pub description: String,
  pub total_duration_hours: u32,
  pub difficulty_level: Difficulty,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub certification_target: Option<String>,
  pub nodes: Vec<PathNode>,
  #[serde(default)]
  pub metadata: Map<String, Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub progress: Option<LearningPathProgress>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

impl LearningPath {
  pub fn node(&self, node_id: &str) -> Option<&PathNode> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  pub fn is_fallback(&self) -> bool {
    self.metadata.get("fallback_response").and_then(Value::as_bool).unwrap_or(false)
  }
}

/// One generated entity tree. Untagged on the wire: each variant serializes
/// as its own object.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedContent {
  LearningPath(LearningPath),
  Exercise(Exercise),
  Quiz(Quiz),
}

impl GeneratedContent {
  pub fn variant(&self) -> ContentVariant {
    match self {
      GeneratedContent::LearningPath(_) => ContentVariant::LearningPath,
      GeneratedContent::Exercise(_) => ContentVariant::Exercise,
      GeneratedContent::Quiz(_) => ContentVariant::Quiz,
    }
  }

  pub fn id(&self) -> &str {
    match self {
      GeneratedContent::LearningPath(p) => &p.id,
      GeneratedContent::Exercise(e) => &e.id,
      GeneratedContent::Quiz(q) => &q.id,
    }
  }
}
