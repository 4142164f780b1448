//! Identifier injector.
//!
//! Walks a normalized tree and makes sure every entity carries a usable id:
//! missing, blank or duplicate-within-siblings ids are replaced with fresh
//! `<prefix><12 hex>` values. Existing ids are kept as-is. Nodes also get
//! their `order` rewritten to match list position and their status reset.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::{Exercise, GeneratedContent, LearningPath, NodeStatus, PathNode, Quiz};

pub const PATH_PREFIX: &str = "path_";
pub const NODE_PREFIX: &str = "node_";
pub const EXERCISE_PREFIX: &str = "ex_";
pub const QUIZ_PREFIX: &str = "quiz_";
pub const QUESTION_PREFIX: &str = "q_";

/// `prefix` followed by 12 lowercase hex chars.
pub fn new_id(prefix: &str) -> String {
  let hex = Uuid::new_v4().simple().to_string();
  format!("{prefix}{}", &hex[..12])
}

pub fn inject(content: &mut GeneratedContent) {
  match content {
    GeneratedContent::LearningPath(path) => inject_path(path),
    GeneratedContent::Exercise(exercise) => ensure(&mut exercise.id, EXERCISE_PREFIX, &mut HashSet::new()),
    GeneratedContent::Quiz(quiz) => inject_quiz(quiz, &mut HashSet::new()),
  }
}

fn inject_path(path: &mut LearningPath) {
  ensure(&mut path.id, PATH_PREFIX, &mut HashSet::new());

  let mut node_ids = HashSet::new();
  let mut exercise_ids = HashSet::new();
  let mut quiz_ids = HashSet::new();
  for (i, node) in path.nodes.iter_mut().enumerate() {
    inject_node(node, i, &mut node_ids);
    inject_exercises(&mut node.exercises, &mut exercise_ids);
    if let Some(quiz) = node.quiz.as_mut() {
      inject_quiz(quiz, &mut quiz_ids);
    }
  }
}

fn inject_node(node: &mut PathNode, index: usize, seen: &mut HashSet<String>) {
  ensure(&mut node.id, NODE_PREFIX, seen);
  node.order = index as u32 + 1;
  node.status = NodeStatus::NotStarted;
}

// Exercise and quiz ids are also lookup keys in the store, so they stay
// unique across the whole path rather than per node.
fn inject_exercises(exercises: &mut [Exercise], seen: &mut HashSet<String>) {
  for exercise in exercises {
    ensure(&mut exercise.id, EXERCISE_PREFIX, seen);
  }
}

fn inject_quiz(quiz: &mut Quiz, seen: &mut HashSet<String>) {
  ensure(&mut quiz.id, QUIZ_PREFIX, seen);
  let mut question_ids = HashSet::new();
  for question in &mut quiz.questions {
    ensure(&mut question.id, QUESTION_PREFIX, &mut question_ids);
  }
}

fn ensure(id: &mut String, prefix: &str, seen: &mut HashSet<String>) {
  if id.trim().is_empty() || seen.contains(id.as_str()) {
    *id = new_id(prefix);
  }
  seen.insert(id.clone());
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ContentVariant;
  use crate::normalize::schema::normalize;
  use serde_json::json;

  fn injected_path(v: serde_json::Value) -> LearningPath {
    let mut content = normalize(v, ContentVariant::LearningPath).unwrap();
    inject(&mut content);
    match content {
      GeneratedContent::LearningPath(p) => p,
      _ => unreachable!(),
    }
  }

  #[test]
  fn new_ids_carry_prefix_and_twelve_hex_chars() {
    let id = new_id(NODE_PREFIX);
    assert!(id.starts_with("node_"));
    let tail = &id["node_".len()..];
    assert_eq!(tail.len(), 12);
    assert!(tail.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_ne!(new_id(NODE_PREFIX), new_id(NODE_PREFIX));
  }

  #[test]
  fn order_follows_position_and_status_resets() {
    let p = injected_path(json!({"nodes": [
      {"title": "A", "order": 7, "status": "completed"},
      {"title": "B", "order": 3},
      {"title": "C"}
    ]}));
    let orders: Vec<u32> = p.nodes.iter().map(|n| n.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert!(p.nodes.iter().all(|n| n.status == NodeStatus::NotStarted));
  }

  #[test]
  fn every_entity_gets_an_id_and_existing_ids_survive() {
    let p = injected_path(json!({
      "id": "path_keepme",
      "nodes": [
        {"id": "node_fixed", "title": "A", "exercises": [{"title": "E1"}, {"id": "", "title": "E2"}],
         "quiz": {"questions": [{"question": "Q1"}, {"question": "Q2"}]}},
        {"title": "B"}
      ]
    }));
    assert_eq!(p.id, "path_keepme");
    assert_eq!(p.nodes[0].id, "node_fixed");
    assert!(p.nodes[1].id.starts_with(NODE_PREFIX));
    for e in &p.nodes[0].exercises {
      assert!(e.id.starts_with(EXERCISE_PREFIX));
    }
    let quiz = p.nodes[0].quiz.as_ref().unwrap();
    assert!(quiz.id.starts_with(QUIZ_PREFIX));
    assert!(quiz.questions.iter().all(|q| q.id.starts_with(QUESTION_PREFIX)));
    assert_ne!(quiz.questions[0].id, quiz.questions[1].id);
  }

  #[test]
  fn duplicate_sibling_ids_are_reissued() {
    let p = injected_path(json!({"nodes": [
      {"id": "dup", "title": "A"},
      {"id": "dup", "title": "B"},
      {"id": "  ", "title": "C"}
    ]}));
    assert_eq!(p.nodes[0].id, "dup");
    assert_ne!(p.nodes[1].id, "dup");
    assert!(p.nodes[2].id.starts_with(NODE_PREFIX));
    let unique: HashSet<&str> = p.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(unique.len(), 3);
  }

  #[test]
  fn injection_is_stable_on_already_identified_trees() {
    let p = injected_path(json!({"nodes": [{"title": "A", "exercises": [{"title": "E"}]}]}));
    let mut again = GeneratedContent::LearningPath(p.clone());
    inject(&mut again);
    assert_eq!(again, GeneratedContent::LearningPath(p));
  }
}
