//! Schema normalizer: loose model JSON → typed content.
//!
//! Walks whatever object graph the model returned and rebuilds it as the
//! typed tree from `crate::domain`. Enum-typed fields go through static alias
//! tables; required fields are synthesized; anything the schema does not name
//! (`problem_statement`, `requirements`, `solution_approach`,
//! `evaluation_criteria`, ...) is simply never copied over.
//!
//! Fails only when the minimum structure is missing: a path without any node
//! collection, an exercise that is not an object, a quiz without questions.

use serde_json::{Map, Value};

use crate::domain::{
  ContentVariant, Difficulty, Exercise, ExerciseType, GeneratedContent, LearningPath,
  LearningPathProgress, NodeStatus, NodeType, PathNode, QuestionType, Quiz, QuizQuestion,
  Resource, ResourceType, TestCase,
};

use super::PipelineError;

pub const DEFAULT_QUIZ_TITLE: &str = "Knowledge check";

pub const PLACEHOLDER_INSTRUCTIONS: [&str; 3] = [
  "Read the exercise description and identify the goal",
  "Implement a solution step by step",
  "Test your work and verify the expected outcome",
];

const NODE_KEYS: [&str; 3] = ["nodes", "modules", "milestones"];

// Out-of-set exercise types; anything else not in the allowed set becomes hands-on.
const EXERCISE_TYPE_ALIASES: &[(&str, ExerciseType)] = &[
  ("lab", ExerciseType::HandsOn),
  ("coding", ExerciseType::Code),
];

const DIFFICULTY_ALIASES: &[(&str, Difficulty)] = &[
  ("easy", Difficulty::Beginner),
  ("basic", Difficulty::Beginner),
  ("novice", Difficulty::Beginner),
  ("introductory", Difficulty::Beginner),
  ("medium", Difficulty::Intermediate),
  ("moderate", Difficulty::Intermediate),
  ("hard", Difficulty::Advanced),
  ("difficult", Difficulty::Advanced),
  ("expert", Difficulty::Advanced),
];

const NODE_TYPE_ALIASES: &[(&str, NodeType)] = &[
  ("lesson", NodeType::Module),
  ("unit", NodeType::Module),
  ("chapter", NodeType::Module),
  ("section", NodeType::Module),
  ("lab", NodeType::Project),
  ("hands-on", NodeType::Project),
  ("capstone", NodeType::Project),
  ("quiz", NodeType::Assessment),
  ("exam", NodeType::Assessment),
  ("test", NodeType::Assessment),
  ("certification", NodeType::Assessment),
  ("checkpoint", NodeType::Milestone),
  ("goal", NodeType::Milestone),
];

const QUESTION_TYPE_ALIASES: &[(&str, QuestionType)] = &[
  ("mcq", QuestionType::MultipleChoice),
  ("single-choice", QuestionType::MultipleChoice),
  ("single", QuestionType::MultipleChoice),
  ("choice", QuestionType::MultipleChoice),
  ("multi-select", QuestionType::MultipleSelect),
  ("multiple-answer", QuestionType::MultipleSelect),
  ("multiple-response", QuestionType::MultipleSelect),
  ("checkbox", QuestionType::MultipleSelect),
  ("true/false", QuestionType::TrueFalse),
  ("true-or-false", QuestionType::TrueFalse),
  ("boolean", QuestionType::TrueFalse),
  ("tf", QuestionType::TrueFalse),
];

const RESOURCE_TYPE_ALIASES: &[(&str, ResourceType)] = &[
  ("docs", ResourceType::Documentation),
  ("doc", ResourceType::Documentation),
  ("reference", ResourceType::Documentation),
  ("blog", ResourceType::Article),
  ("tutorial", ResourceType::Article),
  ("guide", ResourceType::Article),
  ("course", ResourceType::Video),
  ("lecture", ResourceType::Video),
  ("book", ResourceType::Pdf),
  ("ebook", ResourceType::Pdf),
  ("paper", ResourceType::Pdf),
];

/// Rebuild `value` as the typed content named by `variant`.
pub fn normalize(value: Value, variant: ContentVariant) -> Result<GeneratedContent, PipelineError> {
  match variant {
    ContentVariant::LearningPath => learning_path(value).map(GeneratedContent::LearningPath),
    ContentVariant::Exercise => standalone_exercise(value).map(GeneratedContent::Exercise),
    ContentVariant::Quiz => standalone_quiz(value).map(GeneratedContent::Quiz),
  }
}

// ---- learning path ----

fn learning_path(value: Value) -> Result<LearningPath, PipelineError> {
  let root = unwrap_envelope(value, &["learning_path", "learningPath", "path"], &NODE_KEYS);
  let obj = root
    .as_object()
    .ok_or_else(|| failed("learning path is not a JSON object"))?;

  let raw_nodes = node_collection(obj).ok_or_else(|| failed("no node collection found"))?;
  let nodes: Vec<PathNode> = raw_nodes
    .into_iter()
    .enumerate()
    .filter_map(|(i, (key, v))| path_node(v, i, key))
    .collect();
  if nodes.is_empty() {
    return Err(failed("node collection holds no usable nodes"));
  }

  let title = text(obj, &["title", "name"]).unwrap_or_else(|| "Personalized Learning Path".into());
  let description = text(obj, &["description", "summary", "overview"])
    .unwrap_or_else(|| format!("{title} - a structured, step-by-step learning path"));
  let total_duration_hours = number(obj, &["total_duration_hours", "duration_hours", "total_hours"])
    .unwrap_or_else(|| nodes.iter().map(|n| n.duration_hours).fold(0, u32::saturating_add));

  Ok(LearningPath {
    id: text(obj, &["id"]).unwrap_or_default(),
    title,
    description,
    total_duration_hours,
    difficulty_level: difficulty(label(obj, &["difficulty_level", "difficulty", "level"]), Difficulty::Beginner),
    certification_target: text(obj, &["certification_target", "certification"]),
    nodes,
    metadata: object(obj.get("metadata")),
    progress: obj
      .get("progress")
      .and_then(|p| serde_json::from_value::<LearningPathProgress>(p.clone()).ok()),
    created_at: obj.get("created_at").and_then(|t| serde_json::from_value(t.clone()).ok()),
    updated_at: obj.get("updated_at").and_then(|t| serde_json::from_value(t.clone()).ok()),
  })
}

/// Nodes may arrive as a list or as a mapping; mapping keys double as ids.
fn node_collection(obj: &Map<String, Value>) -> Option<Vec<(Option<&str>, &Value)>> {
  for key in NODE_KEYS {
    match obj.get(key) {
      Some(Value::Array(items)) => return Some(items.iter().map(|v| (None, v)).collect()),
      Some(Value::Object(map)) => {
        return Some(map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect())
      }
      _ => {}
    }
  }
  None
}

fn path_node(value: &Value, index: usize, key: Option<&str>) -> Option<PathNode> {
  let position = index as u32 + 1;
  let obj = match value {
    Value::Object(obj) => obj,
    Value::String(s) if !s.trim().is_empty() => return Some(titled_node(s.trim(), position)),
    _ => return None,
  };

  let title = text(obj, &["title", "name"]).unwrap_or_else(|| format!("Module {position}"));
  let mut exercises: Vec<Exercise> = match obj.get("exercises") {
    Some(Value::Array(items)) => items.iter().filter_map(exercise).collect(),
    _ => vec![],
  };
  if let Some(single) = obj.get("exercise").and_then(exercise) {
    exercises.push(single);
  }
  let quiz = match obj.get("quiz") {
    Some(Value::Object(q)) => Some(quiz(q)),
    Some(Value::Array(items)) => items.iter().find_map(Value::as_object).map(quiz),
    _ => None,
  };

  Some(PathNode {
    id: text(obj, &["id", "node_id"]).or_else(|| key.map(str::to_string)).unwrap_or_default(),
    description: text(obj, &["description", "summary", "overview"]).unwrap_or_else(|| title.clone()),
    title,
    order: position,
    duration_hours: number(obj, &["duration_hours", "estimated_hours", "hours"]).unwrap_or(0),
    kind: node_type(label(obj, &["type", "kind"])),
    status: NodeStatus::NotStarted,
    prerequisites: list(obj.get("prerequisites").or_else(|| obj.get("dependencies"))),
    topics: list(obj.get("topics").or_else(|| obj.get("concepts"))),
    resources: match obj.get("resources") {
      Some(Value::Array(items)) => items.iter().filter_map(resource).collect(),
      _ => vec![],
    },
    exercises,
    quiz,
    completion_criteria: obj.get("completion_criteria").filter(|v| !v.is_null()).cloned(),
  })
}

fn titled_node(title: &str, position: u32) -> PathNode {
  PathNode {
    id: String::new(),
    title: title.to_string(),
    description: title.to_string(),
    order: position,
    duration_hours: 0,
    kind: NodeType::Module,
    status: NodeStatus::NotStarted,
    prerequisites: vec![],
    topics: vec![],
    resources: vec![],
    exercises: vec![],
    quiz: None,
    completion_criteria: None,
  }
}

fn resource(value: &Value) -> Option<Resource> {
  let obj = value.as_object()?;
  let url = text(obj, &["url", "link", "href"]).unwrap_or_default();
  let title = text(obj, &["title", "name"])
    .or_else(|| (!url.is_empty()).then(|| url.clone()))
    .unwrap_or_else(|| "Resource".into());
  Some(Resource {
    title,
    kind: lookup(label(obj, &["type", "kind"]), RESOURCE_TYPE_ALIASES, |s| match s {
      "video" => Some(ResourceType::Video),
      "article" => Some(ResourceType::Article),
      "documentation" => Some(ResourceType::Documentation),
      "pdf" => Some(ResourceType::Pdf),
      "external" => Some(ResourceType::External),
      _ => None,
    })
    .unwrap_or(ResourceType::External),
    url,
    duration_minutes: number(obj, &["duration_minutes", "duration"]).unwrap_or(0),
    is_required: obj.get("is_required").and_then(Value::as_bool).unwrap_or(true),
  })
}

// ---- exercise ----

fn standalone_exercise(value: Value) -> Result<Exercise, PipelineError> {
  let root = unwrap_envelope(value, &["exercise"], &["title", "instructions", "problem_statement", "description"]);
  if !root.is_object() {
    return Err(failed("exercise is not a JSON object"));
  }
  exercise(&root).ok_or_else(|| failed("exercise has no usable content"))
}

fn exercise(value: &Value) -> Option<Exercise> {
  let obj = match value {
    Value::Object(obj) => obj,
    Value::String(s) if !s.trim().is_empty() => {
      let mut only_title = Map::new();
      only_title.insert("title".into(), Value::String(s.trim().to_string()));
      return exercise(&Value::Object(only_title));
    }
    _ => return None,
  };

  let title = text(obj, &["title", "name"]).unwrap_or_else(|| "Practice exercise".into());
  let description = text(obj, &["description", "summary", "objective"])
    .or_else(|| text(obj, &["problem_statement"]))
    .unwrap_or_else(|| format!("Practice exercise: {title}"));

  Some(Exercise {
    id: text(obj, &["id", "exercise_id"]).unwrap_or_default(),
    title,
    description,
    kind: exercise_type(label(obj, &["type", "exercise_type"])),
    difficulty: difficulty(label(obj, &["difficulty", "level"]), Difficulty::Intermediate),
    estimated_time_minutes: number(obj, &["estimated_time_minutes", "estimated_minutes", "duration_minutes", "estimated_time"])
      .unwrap_or(30),
    points: number(obj, &["points", "score"]).unwrap_or(100),
    instructions: instructions(obj),
    sandbox_url: text(obj, &["sandbox_url"]),
    starter_code: text(obj, &["starter_code", "template"]),
    test_cases: match obj.get("test_cases") {
      Some(Value::Array(items)) => items.iter().filter_map(test_case).collect(),
      _ => vec![],
    },
    hints: list(obj.get("hints").or_else(|| obj.get("tips"))),
    metadata: object(obj.get("metadata")),
  })
}

/// Given instructions win; otherwise problem statement, requirements and
/// solution approach are folded into steps, in that order.
fn instructions(obj: &Map<String, Value>) -> Vec<String> {
  let given = list(obj.get("instructions").or_else(|| obj.get("steps")));
  if !given.is_empty() {
    return given;
  }

  let mut steps = Vec::new();
  if let Some(statement) = text(obj, &["problem_statement"]) {
    steps.push(statement);
  }
  steps.extend(list(obj.get("requirements")));
  if let Some(approach) = text(obj, &["solution_approach"]) {
    steps.push(approach);
  }

  if steps.is_empty() {
    PLACEHOLDER_INSTRUCTIONS.iter().map(|s| s.to_string()).collect()
  } else {
    steps
  }
}

fn test_case(value: &Value) -> Option<TestCase> {
  let obj = value.as_object()?;
  let expected = obj
    .get("expected_output")
    .or_else(|| obj.get("expected"))
    .or_else(|| obj.get("output"));
  Some(TestCase {
    input: loose_string(obj.get("input")),
    expected_output: loose_string(expected),
  })
}

// ---- quiz ----

fn standalone_quiz(value: Value) -> Result<Quiz, PipelineError> {
  let root = unwrap_envelope(value, &["quiz", "assessment"], &["questions"]);
  let obj = root.as_object().ok_or_else(|| failed("quiz is not a JSON object"))?;
  if !matches!(obj.get("questions"), Some(Value::Array(_))) {
    return Err(failed("quiz has no questions list"));
  }
  let quiz = quiz(obj);
  if quiz.questions.is_empty() {
    return Err(failed("quiz holds no usable questions"));
  }
  Ok(quiz)
}

fn quiz(obj: &Map<String, Value>) -> Quiz {
  let title = text(obj, &["title", "name"]).unwrap_or_else(|| DEFAULT_QUIZ_TITLE.into());
  let description = text(obj, &["description"])
    .unwrap_or_else(|| format!("{title} - Test your understanding"));
  let questions: Vec<QuizQuestion> = match obj.get("questions") {
    Some(Value::Array(items)) => items.iter().filter_map(question).collect(),
    _ => vec![],
  };
  let default_limit = if questions.is_empty() { 30 } else { questions.len() as u32 * 3 };

  Quiz {
    id: text(obj, &["id", "quiz_id"]).unwrap_or_default(),
    title,
    description,
    passing_score: number(obj, &["passing_score", "pass_score"]).unwrap_or(70).min(100),
    time_limit_minutes: number(obj, &["time_limit_minutes", "time_limit"]).unwrap_or(default_limit),
    max_attempts: number(obj, &["max_attempts"]).filter(|n| *n > 0).unwrap_or(3),
    metadata: object(obj.get("metadata")),
    questions,
  }
}

fn question(value: &Value) -> Option<QuizQuestion> {
  let obj = value.as_object()?;
  let prompt = text(obj, &["question", "text", "prompt", "title"])?;
  let kind = question_type(label(obj, &["type", "question_type"]));

  let mut options = list(obj.get("options").or_else(|| obj.get("choices")));
  if kind == QuestionType::TrueFalse && options.is_empty() {
    options = vec!["True".into(), "False".into()];
  }

  let primary = obj
    .get("correct_answer")
    .or_else(|| obj.get("answer"))
    .map(|a| answer_indices(a, &options))
    .unwrap_or_default();
  let listed = obj
    .get("correct_answers")
    .map(|a| answer_indices(a, &options))
    .unwrap_or_default();

  let (correct_answer, correct_answers) = match kind {
    QuestionType::MultipleSelect => {
      let mut keys = if listed.is_empty() { primary } else { listed };
      keys.sort_unstable();
      keys.dedup();
      (None, (!keys.is_empty()).then_some(keys))
    }
    _ => (primary.first().or(listed.first()).copied(), None),
  };

  Some(QuizQuestion {
    id: text(obj, &["id", "question_id"]).unwrap_or_default(),
    question: prompt,
    kind,
    options,
    correct_answer,
    correct_answers,
    explanation: text(obj, &["explanation", "rationale"]).unwrap_or_default(),
    points: number(obj, &["points", "score"]).unwrap_or(10),
  })
}

fn answer_indices(value: &Value, options: &[String]) -> Vec<usize> {
  match value {
    Value::Array(items) => items.iter().filter_map(|v| answer_index(v, options)).collect(),
    other => answer_index(other, options).into_iter().collect(),
  }
}

/// Resolve an answer key (index, letter, option text or boolean) to an option index.
fn answer_index(value: &Value, options: &[String]) -> Option<usize> {
  let in_range = |i: usize| options.is_empty() || i < options.len();
  match value {
    Value::Number(n) => n.as_u64().map(|i| i as usize).filter(|i| in_range(*i)),
    Value::Bool(b) => Some(bool_index(*b, options)),
    Value::String(s) => {
      let s = s.trim();
      if let Some(i) = options.iter().position(|o| o.trim().eq_ignore_ascii_case(s)) {
        return Some(i);
      }
      let mut chars = s.chars();
      if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
          let i = (c.to_ascii_uppercase() as u8 - b'A') as usize;
          return in_range(i).then_some(i);
        }
      }
      if let Ok(i) = s.parse::<usize>() {
        return in_range(i).then_some(i);
      }
      match s.to_ascii_lowercase().as_str() {
        "true" => Some(bool_index(true, options)),
        "false" => Some(bool_index(false, options)),
        _ => None,
      }
    }
    _ => None,
  }
}

fn bool_index(b: bool, options: &[String]) -> usize {
  let word = if b { "true" } else { "false" };
  options
    .iter()
    .position(|o| o.trim().eq_ignore_ascii_case(word))
    .unwrap_or(if b { 0 } else { 1 })
}

// ---- enum coercion ----

pub fn exercise_type(raw: Option<String>) -> ExerciseType {
  lookup(raw, EXERCISE_TYPE_ALIASES, |s| {
    ExerciseType::ALL.iter().copied().find(|t| t.as_str() == s)
  })
  .unwrap_or(ExerciseType::HandsOn)
}

pub fn difficulty(raw: Option<String>, default: Difficulty) -> Difficulty {
  lookup(raw, DIFFICULTY_ALIASES, |s| match s {
    "beginner" => Some(Difficulty::Beginner),
    "intermediate" => Some(Difficulty::Intermediate),
    "advanced" => Some(Difficulty::Advanced),
    _ => None,
  })
  .unwrap_or(default)
}

fn node_type(raw: Option<String>) -> NodeType {
  lookup(raw, NODE_TYPE_ALIASES, |s| match s {
    "module" => Some(NodeType::Module),
    "project" => Some(NodeType::Project),
    "assessment" => Some(NodeType::Assessment),
    "milestone" => Some(NodeType::Milestone),
    _ => None,
  })
  .unwrap_or(NodeType::Module)
}

fn question_type(raw: Option<String>) -> QuestionType {
  lookup(raw, QUESTION_TYPE_ALIASES, |s| match s {
    "multiple-choice" => Some(QuestionType::MultipleChoice),
    "multiple-select" => Some(QuestionType::MultipleSelect),
    "true-false" => Some(QuestionType::TrueFalse),
    _ => None,
  })
  .unwrap_or(QuestionType::MultipleChoice)
}

/// Allowed values first, then the alias table.
fn lookup<T: Copy>(
  raw: Option<String>,
  aliases: &[(&str, T)],
  allowed: impl Fn(&str) -> Option<T>,
) -> Option<T> {
  let raw = raw?;
  allowed(&raw).or_else(|| aliases.iter().find(|(k, _)| *k == raw).map(|(_, v)| *v))
}

/// Lowercased, trimmed, `_`/space folded to `-`.
pub fn canonical_label(s: &str) -> String {
  s.trim()
    .to_lowercase()
    .chars()
    .map(|c| if c == '_' || c == ' ' { '-' } else { c })
    .collect()
}

// ---- loose field access ----

fn failed(reason: &str) -> PipelineError {
  PipelineError::NormalizationFailed(reason.to_string())
}

/// Descend into `{"<envelope>": {...}}` unless the root already looks like the payload.
fn unwrap_envelope(value: Value, envelopes: &[&str], markers: &[&str]) -> Value {
  let inner = match &value {
    Value::Object(map) if !markers.iter().any(|m| map.contains_key(*m)) => envelopes
      .iter()
      .find_map(|k| map.get(*k).filter(|v| v.is_object()).cloned()),
    _ => None,
  };
  inner.unwrap_or(value)
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  keys.iter().find_map(|k| obj.get(*k).and_then(scalar_text))
}

fn label(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  text(obj, keys).map(|s| canonical_label(&s))
}

fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn loose_string(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

fn number(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
  keys.iter().find_map(|k| obj.get(*k).and_then(as_u32))
}

fn as_u32(value: &Value) -> Option<u32> {
  match value {
    Value::Number(n) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
      .map(|n| n.min(u32::MAX as u64) as u32),
    // "45 minutes", "2h" -> leading digits
    Value::String(s) => {
      let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
      digits.parse().ok()
    }
    _ => None,
  }
}

fn list(value: Option<&Value>) -> Vec<String> {
  match value {
    Some(Value::Array(items)) => items.iter().filter_map(list_item).collect(),
    Some(v) => scalar_text(v).into_iter().collect(),
    None => vec![],
  }
}

fn list_item(value: &Value) -> Option<String> {
  match value {
    Value::Object(obj) => text(obj, &["title", "name", "text", "description", "step"]),
    other => scalar_text(other),
  }
}

fn object(value: Option<&Value>) -> Map<String, Value> {
  match value {
    Some(Value::Object(map)) => map.clone(),
    _ => Map::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn path(v: Value) -> LearningPath {
    match normalize(v, ContentVariant::LearningPath).unwrap() {
      GeneratedContent::LearningPath(p) => p,
      other => panic!("unexpected variant {:?}", other.variant()),
    }
  }

  fn single_exercise(v: Value) -> Exercise {
    match normalize(v, ContentVariant::Exercise).unwrap() {
      GeneratedContent::Exercise(e) => e,
      other => panic!("unexpected variant {:?}", other.variant()),
    }
  }

  fn single_quiz(v: Value) -> Quiz {
    match normalize(v, ContentVariant::Quiz).unwrap() {
      GeneratedContent::Quiz(q) => q,
      other => panic!("unexpected variant {:?}", other.variant()),
    }
  }

  #[test]
  fn lab_becomes_hands_on_and_coding_becomes_code() {
    let p = path(json!({
      "title": "Azure",
      "nodes": [{
        "title": "Basics",
        "exercises": [
          {"title": "Spin up a VM", "type": "lab"},
          {"title": "Write a function", "type": "coding"},
          {"title": "Ship it", "type": "Capstone"},
          {"title": "Mystery", "type": "interpretive-dance"},
          {"title": "No type"}
        ]
      }]
    }));
    let kinds: Vec<ExerciseType> = p.nodes[0].exercises.iter().map(|e| e.kind).collect();
    assert_eq!(
      kinds,
      vec![ExerciseType::HandsOn, ExerciseType::Code, ExerciseType::Capstone, ExerciseType::HandsOn, ExerciseType::HandsOn]
    );
  }

  #[test]
  fn every_exercise_type_lands_in_the_allowed_set() {
    for raw in ["lab", "coding", "code", "PROJECT", "hands_on", "", "42", "essay"] {
      let e = single_exercise(json!({"title": "t", "type": raw}));
      assert!(ExerciseType::ALL.contains(&e.kind), "{raw} -> {:?}", e.kind);
    }
    let e = single_exercise(json!({"title": "t", "type": 7}));
    assert_eq!(e.kind, ExerciseType::HandsOn);
  }

  #[test]
  fn instructions_are_synthesized_from_problem_and_requirements() {
    let e = single_exercise(json!({
      "title": "Deploy",
      "problem_statement": "Do X",
      "requirements": ["A", "B"],
      "evaluation_criteria": ["works"]
    }));
    assert_eq!(e.instructions, vec!["Do X", "A", "B"]);

    let serialized = serde_json::to_value(&e).unwrap();
    for stray in ["problem_statement", "requirements", "solution_approach", "evaluation_criteria"] {
      assert!(serialized.get(stray).is_none(), "{stray} leaked into output");
    }
  }

  #[test]
  fn solution_approach_is_appended_last() {
    let e = single_exercise(json!({
      "exercise": {
        "title": "Cache",
        "requirements": "Use an LRU",
        "solution_approach": "Start with a HashMap"
      }
    }));
    assert_eq!(e.instructions, vec!["Use an LRU", "Start with a HashMap"]);
  }

  #[test]
  fn placeholder_instructions_when_nothing_to_synthesize_from() {
    let e = single_exercise(json!({"title": "Empty", "instructions": []}));
    assert_eq!(e.instructions, PLACEHOLDER_INSTRUCTIONS.map(String::from).to_vec());
  }

  #[test]
  fn given_instructions_are_kept() {
    let e = single_exercise(json!({
      "title": "Keep",
      "instructions": ["one", {"step": "two"}],
      "problem_statement": "ignored"
    }));
    assert_eq!(e.instructions, vec!["one", "two"]);
  }

  #[test]
  fn quiz_description_is_synthesized_from_title() {
    let q = single_quiz(json!({
      "title": "Midterm",
      "questions": [{"question": "2+2?", "options": ["3", "4"], "correct_answer": 1}]
    }));
    assert_eq!(q.description, "Midterm - Test your understanding");

    let q = single_quiz(json!({"questions": [{"question": "Why?"}]}));
    assert_eq!(q.title, DEFAULT_QUIZ_TITLE);
    assert_eq!(q.description, "Knowledge check - Test your understanding");
  }

  #[test]
  fn node_quiz_gets_description_too() {
    let p = path(json!({"nodes": [{"title": "A", "quiz": {"title": "Checkpoint", "num_questions": 5}}]}));
    let quiz = p.nodes[0].quiz.as_ref().unwrap();
    assert_eq!(quiz.description, "Checkpoint - Test your understanding");
    assert!(quiz.questions.is_empty());
    assert_eq!(quiz.passing_score, 70);
  }

  #[test]
  fn question_types_and_answer_keys_are_coerced() {
    let q = single_quiz(json!({
      "title": "Mixed",
      "questions": [
        {"question": "Pick one", "type": "MCQ", "options": ["a", "b", "c"], "correct_answer": "B"},
        {"question": "Pick many", "type": "multi_select", "options": ["x", "y", "z"], "correct_answers": ["z", 0, 0]},
        {"question": "Sky is blue", "type": "True/False", "correct_answer": true},
        {"question": "Grass is red", "type": "boolean", "correct_answer": "false"},
        {"question": "Text answer", "options": ["Alpha", "Beta"], "answer": "beta"},
        {"options": ["no", "prompt"]}
      ]
    }));
    assert_eq!(q.questions.len(), 5);
    assert_eq!(q.questions[0].kind, QuestionType::MultipleChoice);
    assert_eq!(q.questions[0].correct_answer, Some(1));
    assert_eq!(q.questions[1].kind, QuestionType::MultipleSelect);
    assert_eq!(q.questions[1].correct_answers, Some(vec![0, 2]));
    assert_eq!(q.questions[1].correct_answer, None);
    assert_eq!(q.questions[2].kind, QuestionType::TrueFalse);
    assert_eq!(q.questions[2].options, vec!["True", "False"]);
    assert_eq!(q.questions[2].correct_answer, Some(0));
    assert_eq!(q.questions[3].correct_answer, Some(1));
    assert_eq!(q.questions[4].correct_answer, Some(1));
    assert_eq!(q.time_limit_minutes, 15);
  }

  #[test]
  fn path_without_nodes_fails() {
    let err = normalize(json!({"title": "Nothing"}), ContentVariant::LearningPath).unwrap_err();
    assert!(matches!(err, PipelineError::NormalizationFailed(_)));
    let err = normalize(json!({"nodes": [1, null]}), ContentVariant::LearningPath).unwrap_err();
    assert!(matches!(err, PipelineError::NormalizationFailed(_)));
    let err = normalize(json!([1, 2]), ContentVariant::LearningPath).unwrap_err();
    assert!(matches!(err, PipelineError::NormalizationFailed(_)));
  }

  #[test]
  fn quiz_without_questions_fails() {
    let err = normalize(json!({"title": "Q"}), ContentVariant::Quiz).unwrap_err();
    assert!(matches!(err, PipelineError::NormalizationFailed(_)));
    let err = normalize(json!("text"), ContentVariant::Exercise).unwrap_err();
    assert!(matches!(err, PipelineError::NormalizationFailed(_)));
  }

  #[test]
  fn nodes_given_as_mapping_keep_order_and_use_keys_as_ids() {
    let p = path(json!({
      "learning_path": {
        "title": "Mapped",
        "modules": {
          "intro": {"title": "Intro", "duration_hours": "5 hours"},
          "deep": {"title": "Deep dive", "duration_hours": 7.6, "type": "lab"}
        }
      }
    }));
    assert_eq!(p.nodes.len(), 2);
    assert_eq!(p.nodes[0].id, "intro");
    assert_eq!(p.nodes[1].id, "deep");
    assert_eq!(p.nodes[0].duration_hours, 5);
    assert_eq!(p.nodes[1].duration_hours, 8);
    assert_eq!(p.nodes[1].kind, NodeType::Project);
    assert_eq!(p.total_duration_hours, 13);
  }

  #[test]
  fn path_level_fields_are_coerced() {
    let p = path(json!({
      "title": "Cloud",
      "difficulty_level": "Medium",
      "nodes": ["Just a title"],
      "metadata": {"source": "model"},
      "resources": "ignored at this level"
    }));
    assert_eq!(p.difficulty_level, Difficulty::Intermediate);
    assert_eq!(p.nodes[0].title, "Just a title");
    assert_eq!(p.metadata["source"], "model");
    assert_eq!(p.description, "Cloud - a structured, step-by-step learning path");
  }

  #[test]
  fn summed_duration_saturates() {
    let p = path(json!({"nodes": [
      {"title": "A", "duration_hours": 4_000_000_000u64},
      {"title": "B", "duration_hours": 4_000_000_000u64}
    ]}));
    assert_eq!(p.nodes[0].duration_hours, 4_000_000_000);
    assert_eq!(p.total_duration_hours, u32::MAX);
  }

  #[test]
  fn resources_are_coerced() {
    let p = path(json!({"nodes": [{"title": "A", "resources": [
      {"title": "Docs", "type": "docs", "url": "https://learn.example"},
      {"url": "https://video.example", "type": "Course", "duration": "60"},
      {"title": "Odd", "type": "podcast", "is_required": false}
    ]}]}));
    let r = &p.nodes[0].resources;
    assert_eq!(r[0].kind, ResourceType::Documentation);
    assert_eq!(r[1].kind, ResourceType::Video);
    assert_eq!(r[1].title, "https://video.example");
    assert_eq!(r[1].duration_minutes, 60);
    assert_eq!(r[2].kind, ResourceType::External);
    assert!(!r[2].is_required);
  }
}
