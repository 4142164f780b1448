//! Built-in sample content.
//!
//! Served by `/learning-path/mock` and by the GET endpoints when an id is not
//! in the store, so the frontend always has something to render. Everything
//! here carries `metadata.is_mock = true`.

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::domain::{
  Difficulty, Exercise, ExerciseType, LearningPath, LearningPathProgress, NodeStatus, NodeType,
  PathNode, QuestionType, Quiz, QuizQuestion, Resource, ResourceType, TestCase,
};

fn mock_metadata() -> Map<String, Value> {
  let mut metadata = Map::new();
  metadata.insert("ai_generated".into(), Value::Bool(false));
  metadata.insert("is_mock".into(), Value::Bool(true));
  metadata
}

fn node(id: &str, order: u32, title: &str, description: &str, hours: u32, topics: &[&str]) -> PathNode {
  PathNode {
    id: id.into(),
    title: title.into(),
    description: description.into(),
    order,
    duration_hours: hours,
    kind: NodeType::Module,
    status: NodeStatus::NotStarted,
    prerequisites: vec![],
    topics: topics.iter().map(|t| t.to_string()).collect(),
    resources: vec![],
    exercises: vec![],
    quiz: None,
    completion_criteria: None,
  }
}

pub fn mock_learning_path(path_id: &str) -> LearningPath {
  let mut fundamentals = node(
    "node_001",
    1,
    "Cloud Computing Fundamentals",
    "Understand core cloud computing concepts and Azure basics",
    20,
    &["Cloud Computing Models", "Azure Architecture", "Core Azure Services"],
  );
  fundamentals.resources.push(Resource {
    title: "Azure Fundamentals learning path".into(),
    kind: ResourceType::Documentation,
    url: "https://learn.microsoft.com/training/azure/".into(),
    duration_minutes: 90,
    is_required: true,
  });
  fundamentals.exercises.push(Exercise {
    id: "ex_001".into(),
    title: "Deploy Your First VM".into(),
    description: "Create and configure a virtual machine in Azure".into(),
    kind: ExerciseType::HandsOn,
    difficulty: Difficulty::Beginner,
    estimated_time_minutes: 45,
    points: 100,
    instructions: vec![
      "Sign in to the Azure portal".into(),
      "Create a resource group".into(),
      "Create a virtual machine with the default size".into(),
      "Connect to the VM and verify it is running".into(),
    ],
    sandbox_url: Some("https://portal.azure.com".into()),
    starter_code: None,
    test_cases: vec![],
    hints: vec!["Use the portal wizard".into(), "Check the networking tab before creating".into()],
    metadata: Map::new(),
  });
  let mut fundamentals_quiz = mock_quiz("quiz_001");
  fundamentals_quiz.metadata = Map::new();
  fundamentals.quiz = Some(fundamentals_quiz);
  fundamentals.completion_criteria = Some(json!({"min_quiz_score": 70, "required_exercises": ["ex_001"]}));

  let mut ai_services = node(
    "node_002",
    2,
    "Azure AI Services",
    "Explore Azure Cognitive Services and AI capabilities",
    30,
    &["Computer Vision", "Natural Language Processing", "Speech Services"],
  );
  ai_services.prerequisites.push("node_001".into());

  let mut machine_learning = node(
    "node_003",
    3,
    "Machine Learning on Azure",
    "Build and deploy ML models using Azure Machine Learning",
    40,
    &["Azure ML Studio", "Model Training", "MLOps"],
  );
  machine_learning.prerequisites.push("node_002".into());

  let nodes = vec![fundamentals, ai_services, machine_learning];
  let now = Utc::now();
  LearningPath {
    id: path_id.into(),
    title: "Azure AI Engineer Learning Path".into(),
    description: "Master Azure AI services and machine learning to become a certified Azure AI Engineer".into(),
    total_duration_hours: 120,
    difficulty_level: Difficulty::Intermediate,
    certification_target: Some("Azure AI Engineer".into()),
    progress: Some(LearningPathProgress::starting_at(nodes.first())),
    nodes,
    metadata: mock_metadata(),
    created_at: Some(now),
    updated_at: Some(now),
  }
}

pub fn mock_exercise(exercise_id: &str) -> Exercise {
  Exercise {
    id: exercise_id.into(),
    title: "Deploy a Virtual Machine".into(),
    description: "Learn to deploy and configure a VM in the cloud".into(),
    kind: ExerciseType::HandsOn,
    difficulty: Difficulty::Beginner,
    estimated_time_minutes: 45,
    points: 100,
    instructions: vec![
      "Access the cloud portal".into(),
      "Navigate to Virtual Machines".into(),
      "Create a new VM with specified configurations".into(),
      "Configure networking settings".into(),
      "Deploy and verify the VM is running".into(),
    ],
    sandbox_url: Some("https://portal.azure.com/sandbox".into()),
    starter_code: Some("# Your code here\ndef deploy_vm():\n    pass".into()),
    test_cases: (1..=3)
      .map(|i| TestCase { input: format!("test{i}"), expected_output: format!("result{i}") })
      .collect(),
    hints: vec![
      "Start with the basic setup".into(),
      "Consider edge cases".into(),
      "Review the documentation for best practices".into(),
    ],
    metadata: mock_metadata(),
  }
}

pub fn mock_quiz(quiz_id: &str) -> Quiz {
  Quiz {
    id: quiz_id.into(),
    title: "Cloud Computing Fundamentals".into(),
    description: "Test your knowledge of cloud computing basics".into(),
    questions: vec![
      QuizQuestion {
        id: "q1".into(),
        question: "What is the primary benefit of cloud computing?".into(),
        kind: QuestionType::MultipleChoice,
        options: vec![
          "Reduced capital expenditure".into(),
          "Unlimited storage".into(),
          "No maintenance required".into(),
          "Free services".into(),
        ],
        correct_answer: Some(0),
        correct_answers: None,
        explanation: "Cloud computing primarily reduces capital expenditure.".into(),
        points: 10,
      },
      QuizQuestion {
        id: "q2".into(),
        question: "Which of the following are cloud service models?".into(),
        kind: QuestionType::MultipleSelect,
        options: vec!["IaaS".into(), "PaaS".into(), "SaaS".into(), "XaaS".into()],
        correct_answer: None,
        correct_answers: Some(vec![0, 1, 2]),
        explanation: "IaaS, PaaS, and SaaS are the main cloud service models.".into(),
        points: 15,
      },
      QuizQuestion {
        id: "q3".into(),
        question: "Cloud computing always requires internet connection.".into(),
        kind: QuestionType::TrueFalse,
        options: vec!["True".into(), "False".into()],
        correct_answer: Some(0),
        correct_answers: None,
        explanation: "Public cloud services require internet connectivity.".into(),
        points: 5,
      },
    ],
    passing_score: 70,
    time_limit_minutes: 30,
    max_attempts: 3,
    metadata: mock_metadata(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mock_path_uses_requested_id_and_points_at_first_node() {
    let path = mock_learning_path("path_abc");
    assert_eq!(path.id, "path_abc");
    assert_eq!(path.nodes.len(), 3);
    assert_eq!(path.metadata["is_mock"], true);
    let progress = path.progress.as_ref().unwrap();
    assert_eq!(progress.current_node_id.as_deref(), Some("node_001"));
    assert!(!path.is_fallback());
  }

  #[test]
  fn mock_quiz_keys_match_question_types() {
    let quiz = mock_quiz("quiz_x");
    for q in &quiz.questions {
      match q.kind {
        QuestionType::MultipleSelect => assert!(q.correct_answers.is_some() && q.correct_answer.is_none()),
        _ => assert!(q.correct_answer.is_some() && q.correct_answers.is_none()),
      }
    }
  }
}
