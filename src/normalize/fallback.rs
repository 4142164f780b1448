//! Canned, schema-valid content for when model output cannot be salvaged.
//!
//! Every builder here is infallible and flags its output with
//! `metadata.fallback_response = true`. Ids are assigned up front so the
//! injector leaves them alone.

use serde_json::{json, Map, Value};

use crate::domain::{
  Difficulty, Exercise, ExerciseType, LearningPath, NodeStatus, NodeType, PathNode, QuestionType,
  Quiz, QuizQuestion, Resource, ResourceType, TestCase,
};
use crate::prompts::detect_certification;

use super::ids::{new_id, EXERCISE_PREFIX, NODE_PREFIX, PATH_PREFIX, QUESTION_PREFIX, QUIZ_PREFIX};

const MAX_FALLBACK_QUESTIONS: u32 = 5;

fn fallback_metadata(extra: &[(&str, Value)]) -> Map<String, Value> {
  let mut metadata = Map::new();
  metadata.insert("fallback_response".into(), Value::Bool(true));
  metadata.insert("ai_generated".into(), Value::Bool(false));
  for (k, v) in extra {
    metadata.insert((*k).to_string(), v.clone());
  }
  metadata
}

/// Three nodes: Introduction → Intermediate → Project.
pub fn learning_path(prompt: &str, level: Difficulty) -> LearningPath {
  let subject = detect_certification(prompt).unwrap_or("Cloud Certification");

  let intro_id = new_id(NODE_PREFIX);
  let intermediate_id = new_id(NODE_PREFIX);
  let project_id = new_id(NODE_PREFIX);

  let intro = PathNode {
    id: intro_id.clone(),
    title: format!("Introduction to {subject}"),
    description: format!("Core concepts and vocabulary you need before going deeper into {subject}"),
    order: 1,
    duration_hours: 10,
    kind: NodeType::Module,
    status: NodeStatus::NotStarted,
    prerequisites: vec![],
    topics: vec![
      "Service models and deployment models".into(),
      "Core services overview".into(),
      "Security and compliance basics".into(),
    ],
    resources: vec![Resource {
      title: format!("{subject} fundamentals"),
      kind: ResourceType::Documentation,
      url: "https://learn.microsoft.com/training".into(),
      duration_minutes: 60,
      is_required: true,
    }],
    exercises: vec![exercise(subject, ExerciseType::HandsOn, level)],
    quiz: None,
    completion_criteria: None,
  };

  let intermediate = PathNode {
    id: intermediate_id.clone(),
    title: format!("Intermediate {subject}"),
    description: "Work with the essential services in realistic scenarios".into(),
    order: 2,
    duration_hours: 20,
    kind: NodeType::Module,
    status: NodeStatus::NotStarted,
    prerequisites: vec![intro_id],
    topics: vec![
      "Compute and storage".into(),
      "Networking".into(),
      "Monitoring and cost management".into(),
    ],
    resources: vec![],
    exercises: vec![],
    quiz: Some(quiz(subject, level, 1)),
    completion_criteria: None,
  };

  let project = PathNode {
    id: project_id,
    title: format!("{subject} Project"),
    description: "Apply what you learned in an end-to-end project".into(),
    order: 3,
    duration_hours: 15,
    kind: NodeType::Project,
    status: NodeStatus::NotStarted,
    prerequisites: vec![intermediate_id],
    topics: vec![],
    resources: vec![],
    exercises: vec![],
    quiz: None,
    completion_criteria: None,
  };

  let nodes = vec![intro, intermediate, project];
  LearningPath {
    id: new_id(PATH_PREFIX),
    title: format!("{subject} Learning Path"),
    description: format!("A starter path towards {subject}, built while the generator was unavailable"),
    total_duration_hours: nodes.iter().map(|n| n.duration_hours).sum(),
    difficulty_level: level,
    certification_target: Some(subject.to_string()),
    nodes,
    metadata: fallback_metadata(&[
      ("user_level", json!(level.as_str())),
      ("original_prompt", json!(prompt)),
    ]),
    progress: None,
    created_at: None,
    updated_at: None,
  }
}

pub fn exercise(topic: &str, kind: ExerciseType, difficulty: Difficulty) -> Exercise {
  Exercise {
    id: new_id(EXERCISE_PREFIX),
    title: format!("{topic} {} exercise", kind.as_str()),
    description: format!("Practice {topic} with this {} exercise", kind.as_str()),
    kind,
    difficulty,
    estimated_time_minutes: 60,
    points: 100,
    instructions: vec![
      "Set up your environment".into(),
      format!("Implement the {topic} solution"),
      "Test your implementation".into(),
      "Optimize and refine".into(),
      "Document your solution".into(),
    ],
    sandbox_url: None,
    starter_code: Some("// Your code here".into()),
    test_cases: vec![
      TestCase { input: "test1".into(), expected_output: "result1".into() },
      TestCase { input: "test2".into(), expected_output: "result2".into() },
    ],
    hints: vec![
      format!("Consider {topic} best practices"),
      "Think about edge cases".into(),
      "Review the documentation".into(),
    ],
    metadata: fallback_metadata(&[]),
  }
}

/// At most five placeholder questions, never fewer than one.
pub fn quiz(topic: &str, difficulty: Difficulty, num_questions: u32) -> Quiz {
  let count = num_questions.clamp(1, MAX_FALLBACK_QUESTIONS);
  let questions = (1..=count)
    .map(|i| QuizQuestion {
      id: new_id(QUESTION_PREFIX),
      question: format!("Sample question {i} about {topic}?"),
      kind: QuestionType::MultipleChoice,
      options: ["A", "B", "C", "D"]
        .iter()
        .map(|l| format!("Option {l} for question {i}"))
        .collect(),
      correct_answer: Some(0),
      correct_answers: None,
      explanation: format!("Explanation for question {i}"),
      points: 10,
    })
    .collect();

  Quiz {
    id: new_id(QUIZ_PREFIX),
    title: format!("{topic} Assessment"),
    description: format!("Test your knowledge of {topic}"),
    questions,
    passing_score: 70,
    time_limit_minutes: count * 3,
    max_attempts: 3,
    metadata: fallback_metadata(&[("difficulty", json!(difficulty.as_str()))]),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fallback_path_has_three_linked_nodes() {
    let path = learning_path("I want the Azure AI engineer cert", Difficulty::Intermediate);
    assert!(path.is_fallback());
    assert_eq!(path.nodes.len(), 3);
    assert_eq!(path.nodes[0].exercises.len(), 1);
    assert_eq!(path.nodes[1].quiz.as_ref().map(|q| q.questions.len()), Some(1));
    assert_eq!(path.nodes[1].prerequisites, vec![path.nodes[0].id.clone()]);
    assert_eq!(path.nodes[2].kind, NodeType::Project);
    assert_eq!(path.certification_target.as_deref(), Some("Azure AI Engineer"));
    assert_eq!(path.metadata["user_level"], "intermediate");
    assert_eq!(path.total_duration_hours, 45);
  }

  #[test]
  fn unknown_subject_still_produces_a_path() {
    let path = learning_path("teach me pottery", Difficulty::Beginner);
    assert_eq!(path.title, "Cloud Certification Learning Path");
    let orders: Vec<u32> = path.nodes.iter().map(|n| n.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
  }

  #[test]
  fn quiz_question_count_is_clamped() {
    assert_eq!(quiz("Rust", Difficulty::Beginner, 0).questions.len(), 1);
    assert_eq!(quiz("Rust", Difficulty::Beginner, 3).questions.len(), 3);
    let big = quiz("Rust", Difficulty::Advanced, 40);
    assert_eq!(big.questions.len(), 5);
    assert_eq!(big.time_limit_minutes, 15);
    assert_eq!(big.metadata["fallback_response"], true);
  }

  #[test]
  fn exercise_fallback_is_flagged() {
    let e = exercise("Kubernetes", ExerciseType::Code, Difficulty::Advanced);
    assert_eq!(e.kind, ExerciseType::Code);
    assert_eq!(e.metadata["fallback_response"], true);
    assert!(e.id.starts_with(EXERCISE_PREFIX));
    assert_eq!(e.test_cases.len(), 2);
  }
}
