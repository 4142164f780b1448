//! Request field checks run after JSON extraction. Failures map to 422.

use crate::error::{ApiError, ApiResult};

pub const PROMPT_MIN_CHARS: usize = 10;
pub const PROMPT_MAX_CHARS: usize = 500;
pub const MAX_QUESTIONS: i64 = 50;
pub const SUPPORTED_LANGUAGES: [&str; 7] = ["python", "javascript", "typescript", "java", "csharp", "go", "rust"];

/// Returns the trimmed prompt.
pub fn prompt(raw: &str) -> ApiResult<&str> {
  let trimmed = raw.trim();
  let len = trimmed.chars().count();
  if len < PROMPT_MIN_CHARS {
    return Err(ApiError::Validation(format!("prompt must be at least {PROMPT_MIN_CHARS} characters")));
  }
  if len > PROMPT_MAX_CHARS {
    return Err(ApiError::Validation(format!("prompt must be at most {PROMPT_MAX_CHARS} characters")));
  }
  Ok(trimmed)
}

pub fn topic(raw: &str) -> ApiResult<&str> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(ApiError::Validation("topic must not be empty".into()));
  }
  Ok(trimmed)
}

pub fn num_questions(n: i64) -> ApiResult<u32> {
  if !(1..=MAX_QUESTIONS).contains(&n) {
    return Err(ApiError::Validation(format!("num_questions must be between 1 and {MAX_QUESTIONS}")));
  }
  Ok(n as u32)
}

pub fn code(raw: &str) -> ApiResult<&str> {
  if raw.trim().is_empty() {
    return Err(ApiError::Validation("code must not be empty".into()));
  }
  Ok(raw)
}

/// Returns the lowercased language name.
pub fn language(raw: &str) -> ApiResult<String> {
  let lang = raw.trim().to_lowercase();
  if SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
    Ok(lang)
  } else {
    Err(ApiError::Validation(format!(
      "unsupported language '{}'; expected one of {}",
      raw.trim(),
      SUPPORTED_LANGUAGES.join(", ")
    )))
  }
}
