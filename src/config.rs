//! Service settings, read from environment variables.
//!
//! `Settings::from_env()` is what the binary uses; `Settings::from_lookup`
//! takes any key → value closure so tests can feed a fixed map.
//!
//! AI provider selection:
//! - `AZURE_OPENAI_API_KEY` set → Azure OpenAI (`AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_DEPLOYMENT`, ...)
//! - else `OPENAI_API_KEY` set → OpenAI-compatible (`OPENAI_BASE_URL`, `OPENAI_MODEL`)
//! - else no key: the client stays disabled and generation serves fallback content
//!
//! The literal key `dummy-key-for-testing` counts as "not set".

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const PLACEHOLDER_API_KEY: &str = "dummy-key-for-testing";

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Clone, Debug, PartialEq)]
pub enum AiProvider {
  Azure { endpoint: String, deployment: String, api_version: String },
  OpenAi { base_url: String },
}

impl AiProvider {
  pub fn name(&self) -> &'static str {
    match self {
      AiProvider::Azure { .. } => "azure",
      AiProvider::OpenAi { .. } => "openai",
    }
  }
}

#[derive(Clone, Debug)]
pub struct AiSettings {
  /// `None` when no usable key is configured.
  pub api_key: Option<String>,
  pub provider: AiProvider,
  pub model: String,
  pub timeout: Duration,
  pub retry_attempts: u32,
  pub retry_min: Duration,
  pub retry_max: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CorsOrigins {
  Any,
  List(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct Settings {
  pub host: String,
  pub port: u16,
  pub environment: String,
  pub version: String,
  pub cors_origins: CorsOrigins,
  pub ai: AiSettings,
  pub prompt_config_path: Option<String>,
}

impl Settings {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
    let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    Self {
      host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
      port: parsed(&get, "PORT", 8000),
      environment: get("ENVIRONMENT").unwrap_or_else(|| "development".into()),
      version: env!("CARGO_PKG_VERSION").to_string(),
      cors_origins: parse_cors(&get("BACKEND_CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())),
      ai: ai_settings(&get),
      prompt_config_path: get("PROMPT_CONFIG_PATH"),
    }
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }

  pub fn is_production(&self) -> bool {
    self.environment.eq_ignore_ascii_case("production")
  }
}

fn ai_settings(get: &impl Fn(&str) -> Option<String>) -> AiSettings {
  let usable = |key: &str| get(key).filter(|k| k != PLACEHOLDER_API_KEY);

  let (api_key, provider, model) = if let Some(key) = usable("AZURE_OPENAI_API_KEY") {
    let deployment = get("AZURE_OPENAI_DEPLOYMENT").unwrap_or_else(|| "gpt-4.1".into());
    let provider = AiProvider::Azure {
      endpoint: get("AZURE_OPENAI_ENDPOINT").unwrap_or_else(|| "https://dummy.openai.azure.com/".into()),
      deployment: deployment.clone(),
      api_version: get("AZURE_OPENAI_API_VERSION").unwrap_or_else(|| "2024-02-15-preview".into()),
    };
    (Some(key), provider, deployment)
  } else if let Some(key) = usable("OPENAI_API_KEY") {
    let provider = AiProvider::OpenAi {
      base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
    };
    (Some(key), provider, get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()))
  } else {
    let provider = AiProvider::OpenAi { base_url: "https://api.openai.com/v1".into() };
    (None, provider, get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()))
  };

  AiSettings {
    api_key,
    provider,
    model,
    timeout: Duration::from_secs(parsed(get, "AI_TIMEOUT_SECS", 60)),
    retry_attempts: parsed(get, "AI_RETRY_ATTEMPTS", 3),
    retry_min: Duration::from_secs(parsed(get, "AI_RETRY_MIN_SECS", 4)),
    retry_max: Duration::from_secs(parsed(get, "AI_RETRY_MAX_SECS", 10)),
  }
}

fn parsed<T: FromStr + Copy>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
  match get(key) {
    None => default,
    Some(raw) => raw.parse().unwrap_or_else(|_| {
      warn!(target: "learnpath", key, value = %raw, "ignoring unparsable setting, using default");
      default
    }),
  }
}

fn parse_cors(raw: &str) -> CorsOrigins {
  let origins: Vec<String> = raw
    .split(',')
    .map(|s| s.trim().trim_end_matches('/').to_string())
    .filter(|s| !s.is_empty())
    .collect();
  if origins.iter().any(|o| o == "*") {
    CorsOrigins::Any
  } else {
    CorsOrigins::List(origins)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn settings(pairs: &[(&str, &str)]) -> Settings {
    let map: HashMap<String, String> =
      pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Settings::from_lookup(|k| map.get(k).cloned())
  }

  #[test]
  fn defaults_without_environment() {
    let s = settings(&[]);
    assert_eq!(s.bind_addr(), "0.0.0.0:8000");
    assert_eq!(s.environment, "development");
    assert!(s.ai.api_key.is_none());
    assert_eq!(s.ai.retry_attempts, 3);
    assert_eq!(s.ai.retry_min, Duration::from_secs(4));
    assert_eq!(s.ai.retry_max, Duration::from_secs(10));
    assert_eq!(
      s.cors_origins,
      CorsOrigins::List(vec!["http://localhost:3000".into(), "http://localhost:5173".into()])
    );
  }

  #[test]
  fn placeholder_key_counts_as_missing() {
    let s = settings(&[("AZURE_OPENAI_API_KEY", "dummy-key-for-testing")]);
    assert!(s.ai.api_key.is_none());
  }

  #[test]
  fn azure_wins_over_openai() {
    let s = settings(&[
      ("AZURE_OPENAI_API_KEY", "az"),
      ("AZURE_OPENAI_ENDPOINT", "https://contoso.openai.azure.com"),
      ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o"),
      ("OPENAI_API_KEY", "sk"),
    ]);
    assert_eq!(s.ai.api_key.as_deref(), Some("az"));
    assert_eq!(s.ai.model, "gpt-4o");
    assert_eq!(s.ai.provider.name(), "azure");
  }

  #[test]
  fn openai_compatible_provider() {
    let s = settings(&[("OPENAI_API_KEY", "sk"), ("OPENAI_MODEL", "gpt-4o"), ("PORT", "9001")]);
    assert_eq!(s.ai.provider, AiProvider::OpenAi { base_url: "https://api.openai.com/v1".into() });
    assert_eq!(s.ai.model, "gpt-4o");
    assert_eq!(s.port, 9001);
  }

  #[test]
  fn bad_numbers_fall_back_to_defaults() {
    let s = settings(&[("PORT", "eighty"), ("AI_RETRY_ATTEMPTS", "-1")]);
    assert_eq!(s.port, 8000);
    assert_eq!(s.ai.retry_attempts, 3);
  }

  #[test]
  fn wildcard_cors() {
    assert_eq!(settings(&[("BACKEND_CORS_ORIGINS", "https://a.dev, *")]).cors_origins, CorsOrigins::Any);
    assert_eq!(
      settings(&[("BACKEND_CORS_ORIGINS", "https://a.dev/, ,https://b.dev")]).cors_origins,
      CorsOrigins::List(vec!["https://a.dev".into(), "https://b.dev".into()])
    );
  }
}
