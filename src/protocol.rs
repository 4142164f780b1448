//! Public request/response structs for the HTTP API (serde ready).
//! Enum-valued inputs arrive as loose strings and are mapped through the
//! same alias tables the normalizer uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Exercise, LearningPathProgress, NodeStatus, PathNode, QuestionType, Quiz, Resource};
use crate::grading::{QuizGrade, TestResult};
use crate::prompts::LearningPreferences;

fn default_time_commitment() -> String {
    "2 hours per day".into()
}

fn default_language() -> String {
    "python".into()
}

fn default_hint_level() -> u8 {
    1
}

fn default_num_questions() -> i64 {
    5
}

//
// Learning paths
//

#[derive(Debug, Deserialize)]
pub struct LearningPathRequest {
    pub prompt: String,
    #[serde(default)]
    pub user_level: Option<String>,
    #[serde(default = "default_time_commitment")]
    pub time_commitment: String,
    #[serde(default)]
    pub preferences: LearningPreferences,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub concept: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExplainOut {
    pub path_id: String,
    pub concept: String,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub node_id: String,
    pub status: NodeStatus,
    #[serde(default)]
    pub points_earned: u32,
}

#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub success: bool,
    pub path_id: String,
    pub node_id: String,
    pub status: NodeStatus,
    pub points_earned: u32,
    /// False when the path is not stored and the update was only echoed.
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<LearningPathProgress>,
}

#[derive(Debug, Serialize)]
pub struct NodeContentOut {
    pub path_id: String,
    pub node_id: String,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub resources: Vec<Resource>,
    pub exercises: Vec<Exercise>,
    pub quiz: Option<PublicQuiz>,
}

impl NodeContentOut {
    pub fn new(path_id: &str, node: &PathNode) -> Self {
        Self {
            path_id: path_id.to_string(),
            node_id: node.id.clone(),
            title: node.title.clone(),
            description: node.description.clone(),
            topics: node.topics.clone(),
            resources: node.resources.clone(),
            exercises: node.exercises.clone(),
            quiz: node.quiz.as_ref().map(|q| PublicQuiz::from_quiz(q, q.max_attempts)),
        }
    }
}

//
// Exercises
//

#[derive(Debug, Deserialize)]
pub struct ExerciseGenerateRequest {
    pub topic: String,
    #[serde(default)]
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    #[serde(alias = "code")]
    pub solution: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub time_taken_minutes: u32,
}

#[derive(Debug, Serialize)]
pub struct SubmissionOut {
    pub exercise_id: String,
    pub passed: bool,
    pub test_results: Vec<TestResult>,
    pub feedback: String,
    pub points_earned: u32,
    pub time_taken_minutes: u32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct HintRequest {
    pub current_code: String,
    #[serde(default = "default_hint_level")]
    pub hint_level: u8,
}

#[derive(Debug, Serialize)]
pub struct HintOut {
    pub hint: String,
    pub level: u8,
}

#[derive(Debug, Deserialize)]
pub struct TestRunRequest {
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
}

//
// Quizzes
//

#[derive(Debug, Deserialize)]
pub struct QuizGenerateRequest {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Signed so out-of-range values reach validation instead of failing extraction.
    #[serde(default = "default_num_questions")]
    pub num_questions: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub answers: Map<String, Value>,
    #[serde(default)]
    pub time_taken_minutes: u32,
}

#[derive(Debug, Serialize)]
pub struct QuizSubmitOut {
    pub quiz_id: String,
    #[serde(flatten)]
    pub grade: QuizGrade,
    pub time_taken_minutes: u32,
    pub submitted_at: DateTime<Utc>,
}

/// A question as the learner sees it: no answer key, no explanation.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: Vec<String>,
    pub points: u32,
}

#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
    pub passing_score: u32,
    pub time_limit_minutes: u32,
    pub max_attempts: u32,
    pub attempts_remaining: u32,
}

impl PublicQuiz {
    pub fn from_quiz(quiz: &Quiz, attempts_remaining: u32) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    question: q.question.clone(),
                    kind: q.kind,
                    options: q.options.clone(),
                    points: q.points,
                })
                .collect(),
            passing_score: quiz.passing_score,
            time_limit_minutes: quiz.time_limit_minutes,
            max_attempts: quiz.max_attempts,
            attempts_remaining,
        }
    }
}

//
// Service info and health
//

#[derive(Debug, Serialize)]
pub struct ServiceInfoOut {
    pub status: &'static str,
    pub service: &'static str,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct ReadyChecks {
    pub api: bool,
    pub ai: bool,
    pub store: bool,
}

#[derive(Debug, Serialize)]
pub struct ReadyOut {
    pub ready: bool,
    pub checks: ReadyChecks,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds;
    use serde_json::json;

    #[test]
    fn public_quiz_hides_answer_keys() {
        let quiz = seeds::mock_quiz("quiz_1");
        let out = serde_json::to_value(PublicQuiz::from_quiz(&quiz, 3)).unwrap();
        let first = &out["questions"][0];
        assert_eq!(first["type"], "multiple_choice");
        assert!(first.get("correct_answer").is_none());
        assert!(first.get("explanation").is_none());
        assert_eq!(out["attempts_remaining"], 3);
    }

    #[test]
    fn request_defaults_apply() {
        let req: LearningPathRequest =
            serde_json::from_value(json!({"prompt": "Azure AI engineer in 3 months"})).unwrap();
        assert_eq!(req.time_commitment, "2 hours per day");
        assert!(req.user_level.is_none());

        let sub: SubmissionRequest = serde_json::from_value(json!({"code": "print(1)"})).unwrap();
        assert_eq!(sub.solution, "print(1)");
        assert_eq!(sub.language, "python");

        let quiz: QuizGenerateRequest = serde_json::from_value(json!({"topic": "IAM"})).unwrap();
        assert_eq!(quiz.num_questions, 5);
    }
}
