//! Prompt catalog for the LLM client.
//!
//! `Prompts` has built-in defaults and can be overridden (field by field)
//! from a TOML file:
//!
//! ```toml
//! [prompts]
//! hint_system = "You are a terse mentor."
//! ```
//!
//! Templates use `{placeholder}` substitution via `util::fill_template`.
//! Certification templates and learning preferences specialize the
//! learning-path prompts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PromptConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Learning path
  pub learning_path_system: String,
  pub learning_path_user_template: String,
  // Quiz / exercise generation
  pub quiz_system: String,
  pub quiz_user_template: String,
  pub exercise_system: String,
  pub exercise_user_template: String,
  // Tutoring
  pub explain_system: String,
  pub explain_user_template: String,
  pub hint_system: String,
  pub hint_user_template: String,
  pub evaluation_system: String,
  pub evaluation_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      learning_path_system: r#"You are an expert educational AI that creates personalized learning paths for cloud certifications.
Your learning paths should be structured and progressive, include hands-on exercises, clear milestones,
time estimates, resource recommendations, assessments and quizzes.

Return ONLY a JSON object with:
- title, description, total_duration_hours, difficulty_level, metadata
- nodes: array of modules, each with id, title, description, order, duration_hours,
  type (module/project/assessment/milestone), prerequisites, topics,
  resources (title, type, url, duration_minutes), exercises and an optional quiz."#.into(),
      learning_path_user_template: "Create a comprehensive learning path for the following goal:\nGoal: {goal}\nUser level: {level}\nTime commitment: {time_commitment}\nPreferences: {preferences}\n\nGenerate a structured learning path with clear modules, hands-on exercises for each module, quizzes to validate knowledge, resource recommendations, time estimates, prerequisites and dependencies.".into(),
      quiz_system: "You are an expert educator creating assessment questions. Reply with JSON only.".into(),
      quiz_user_template: r#"Generate {num_questions} quiz questions about {topic} at {difficulty} difficulty level.
Mix multiple_choice, true_false and multiple_select questions.

Return JSON:
{"title": "...", "description": "...", "passing_score": 70, "time_limit_minutes": 30,
 "questions": [{"id": "q1", "question": "...", "type": "multiple_choice|multiple_select|true_false",
   "options": ["..."], "correct_answer": 0, "correct_answers": [0, 1], "explanation": "...", "points": 10}]}"#.into(),
      exercise_system: "You are an expert instructor creating practical exercises. Reply with JSON only.".into(),
      exercise_user_template: r#"Create a {exercise_type} exercise for {topic} at {difficulty} difficulty level.
Include clear objectives, step-by-step instructions, starter code if applicable, test cases, hints and an estimated completion time.

Return JSON:
{"title": "...", "description": "...", "type": "{exercise_type}", "difficulty": "{difficulty}",
 "instructions": ["Step 1", "Step 2"], "starter_code": "...",
 "test_cases": [{"input": "...", "expected_output": "..."}],
 "hints": ["..."], "estimated_time_minutes": 45, "points": 100}"#.into(),
      explain_system: "You are a patient cloud certification instructor. Explain clearly, with concrete examples, in plain prose or Markdown.".into(),
      explain_user_template: "Explain the concept of {concept} in the context of {certification}.\nLearner level: {level}\nAdditional context: {context}\n\nProvide a clear definition, real-world examples, common use cases, best practices and common pitfalls to avoid.".into(),
      hint_system: "You are a coding mentor. Give exactly one hint and never reveal the full solution.".into(),
      hint_user_template: "Exercise: {title}\n{description}\n\nLearner's current code:\n{current_code}\n\nGive a level {hint_level} hint (1 = gentle nudge, 2 = point at the approach, 3 = near-solution guidance). Keep it under 80 words.".into(),
      evaluation_system: "You are a strict but encouraging code reviewer. Reply with JSON only.".into(),
      evaluation_user_template: "Exercise: {title}\n{description}\nInstructions:\n{instructions}\n\nLanguage: {language}\nSubmission:\n{submission}\n\nReturn JSON {\"passed\": boolean, \"score\": number (0-100), \"feedback\": string, \"suggestions\": [string]}. 'passed' = true if score >= 70.".into(),
    }
  }
}

impl Prompts {
  /// System prompt for a learning path, specialized when a certification is known.
  pub fn learning_path_system_for(&self, certification: Option<&CertificationTemplate>) -> String {
    match certification {
      Some(cert) => format!(
        "{}\n\nFor the {} certification, focus on: {}.\nEstimated total duration: {} hours.",
        self.learning_path_system,
        cert.title,
        cert.focus_areas.join(", "),
        cert.duration_hours
      ),
      None => self.learning_path_system.clone(),
    }
  }
}

/// Load prompts from a TOML file. Any IO or parse error is logged and the defaults are used.
pub fn load_prompts(path: Option<&str>) -> Prompts {
  let Some(path) = path else { return Prompts::default() };
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<PromptConfig>(&s) {
      Ok(cfg) => {
        info!(target: "learnpath", %path, "loaded prompt config (TOML)");
        cfg.prompts
      }
      Err(e) => {
        error!(target: "learnpath", %path, error = %e, "failed to parse prompt config, using defaults");
        Prompts::default()
      }
    },
    Err(e) => {
      error!(target: "learnpath", %path, error = %e, "failed to read prompt config, using defaults");
      Prompts::default()
    }
  }
}

// ---- certifications ----

#[derive(Debug, PartialEq, Eq)]
pub struct CertificationTemplate {
  pub key: &'static str,
  pub title: &'static str,
  pub focus_areas: &'static [&'static str],
  pub duration_hours: u32,
}

pub const CERTIFICATIONS: &[CertificationTemplate] = &[
  CertificationTemplate {
    key: "azure-ai-engineer",
    title: "Azure AI Engineer Associate",
    focus_areas: &["Azure Cognitive Services", "Machine Learning", "Natural Language Processing", "Computer Vision", "Conversational AI"],
    duration_hours: 120,
  },
  CertificationTemplate {
    key: "azure-solutions-architect",
    title: "Azure Solutions Architect Expert",
    focus_areas: &["Infrastructure", "Security", "Networking", "Storage", "Compute", "Monitoring"],
    duration_hours: 150,
  },
  CertificationTemplate {
    key: "aws-solutions-architect",
    title: "AWS Solutions Architect Associate",
    focus_areas: &["EC2", "S3", "VPC", "IAM", "RDS", "Lambda"],
    duration_hours: 130,
  },
  CertificationTemplate {
    key: "aws-developer",
    title: "AWS Certified Developer Associate",
    focus_areas: &["Lambda", "API Gateway", "DynamoDB", "SQS/SNS", "CloudFormation", "CI/CD"],
    duration_hours: 100,
  },
  CertificationTemplate {
    key: "gcp-cloud-engineer",
    title: "Google Cloud Professional Cloud Engineer",
    focus_areas: &["Compute Engine", "App Engine", "Kubernetes Engine", "Cloud Storage", "BigQuery", "Cloud Functions"],
    duration_hours: 140,
  },
];

// (needle in lowercased prompt, display name, template key)
const DETECTION: &[(&str, &str, Option<&str>)] = &[
  ("azure ai", "Azure AI Engineer", Some("azure-ai-engineer")),
  ("azure architect", "Azure Solutions Architect", Some("azure-solutions-architect")),
  ("azure solutions architect", "Azure Solutions Architect", Some("azure-solutions-architect")),
  ("aws architect", "AWS Solutions Architect", Some("aws-solutions-architect")),
  ("aws solutions architect", "AWS Solutions Architect", Some("aws-solutions-architect")),
  ("aws developer", "AWS Developer", Some("aws-developer")),
  ("gcp", "Google Cloud Professional", Some("gcp-cloud-engineer")),
  ("google cloud", "Google Cloud Professional", Some("gcp-cloud-engineer")),
  ("kubernetes", "Kubernetes Administrator", None),
  ("devops", "DevOps Engineer", None),
];

/// Template by key (`azure-ai-engineer`) or by a loosely spelled name (`Azure AI Engineer`).
pub fn certification_template(name: &str) -> Option<&'static CertificationTemplate> {
  let key = name.trim().to_lowercase().replace(' ', "-");
  CERTIFICATIONS
    .iter()
    .find(|c| c.key == key || c.title.eq_ignore_ascii_case(name.trim()))
}

/// Certification named in free text, if any.
pub fn detect_certification(prompt: &str) -> Option<&'static str> {
  let lower = prompt.to_lowercase();
  DETECTION
    .iter()
    .find(|(needle, _, _)| lower.contains(*needle))
    .map(|(_, name, _)| *name)
}

/// Template matching a certification named in free text, if one exists.
pub fn detect_template(prompt: &str) -> Option<&'static CertificationTemplate> {
  let lower = prompt.to_lowercase();
  DETECTION
    .iter()
    .find(|(needle, _, _)| lower.contains(*needle))
    .and_then(|(_, _, key)| key.and_then(certification_template))
}

// ---- preferences ----

const LEARNING_STYLE_HINTS: &[(&str, &str)] = &[
  ("visual", "Include diagrams, charts, and visual representations where applicable."),
  ("hands-on", "Focus on practical exercises and real-world applications."),
  ("theoretical", "Provide in-depth explanations and conceptual understanding."),
  ("project-based", "Structure learning around building complete projects."),
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPreferences {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub learning_style: Option<String>,
  #[serde(default)]
  pub include_labs: bool,
  #[serde(default)]
  pub include_quizzes: bool,
  #[serde(default)]
  pub include_projects: bool,
  /// Anything else the client sent; forwarded to the model verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Append preference guidance to a user prompt.
pub fn enhance_with_preferences(base: &str, prefs: &LearningPreferences) -> String {
  let mut enhanced = base.to_string();

  if let Some(style) = prefs.learning_style.as_deref() {
    let style = style.trim().to_lowercase();
    if let Some((_, hint)) = LEARNING_STYLE_HINTS.iter().find(|(k, _)| *k == style) {
      enhanced.push_str("\n\n");
      enhanced.push_str(hint);
    }
  }
  if prefs.include_labs {
    enhanced.push_str("\n\nInclude hands-on lab exercises with cloud sandbox environments.");
  }
  if prefs.include_quizzes {
    enhanced.push_str("\n\nInclude comprehensive quizzes after each module.");
  }
  if prefs.include_projects {
    enhanced.push_str("\n\nInclude real-world projects to demonstrate skills.");
  }
  enhanced
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_certifications_case_insensitively() {
    assert_eq!(detect_certification("Prepare me for AZURE AI-900 and Azure AI engineer"), Some("Azure AI Engineer"));
    assert_eq!(detect_certification("kubernetes in 3 months"), Some("Kubernetes Administrator"));
    assert_eq!(detect_certification("learn to bake bread"), None);
  }

  #[test]
  fn detected_certification_maps_to_template() {
    assert_eq!(detect_template("gcp associate").map(|t| t.key), Some("gcp-cloud-engineer"));
    assert!(detect_template("devops basics").is_none());
  }

  #[test]
  fn template_lookup_accepts_keys_and_titles() {
    assert_eq!(certification_template("AWS Developer").map(|t| t.duration_hours), Some(100));
    assert_eq!(
      certification_template("Azure Solutions Architect Expert").map(|t| t.key),
      Some("azure-solutions-architect")
    );
    assert!(certification_template("nope").is_none());
  }

  #[test]
  fn system_prompt_mentions_focus_areas() {
    let prompts = Prompts::default();
    let cert = certification_template("aws-solutions-architect");
    let system = prompts.learning_path_system_for(cert);
    assert!(system.contains("EC2, S3, VPC"));
    assert!(system.contains("130 hours"));
    assert_eq!(prompts.learning_path_system_for(None), prompts.learning_path_system);
  }

  #[test]
  fn preferences_append_guidance() {
    let prefs = LearningPreferences {
      learning_style: Some("Hands-On".into()),
      include_labs: true,
      include_quizzes: false,
      include_projects: true,
      extra: Map::new(),
    };
    let out = enhance_with_preferences("Base", &prefs);
    assert!(out.starts_with("Base"));
    assert!(out.contains("practical exercises"));
    assert!(out.contains("lab exercises"));
    assert!(!out.contains("quizzes after each module"));
    assert!(out.contains("real-world projects"));
  }

  #[test]
  fn partial_toml_overrides_keep_other_defaults() {
    let cfg: PromptConfig = toml::from_str("[prompts]\nhint_system = \"Be terse.\"\n").unwrap();
    assert_eq!(cfg.prompts.hint_system, "Be terse.");
    assert_eq!(cfg.prompts.quiz_system, Prompts::default().quiz_system);
  }

  #[test]
  fn missing_prompt_file_uses_defaults() {
    let prompts = load_prompts(Some("/definitely/not/here.toml"));
    assert_eq!(prompts.explain_system, Prompts::default().explain_system);
  }
}
