//! Learning Path Backend
//!
//! - Axum HTTP API under /api/v1
//! - Optional Azure OpenAI / OpenAI integration (fallback content without it)
//!
//! Important env variables:
//!   HOST / PORT             : bind address (default 0.0.0.0:8000)
//!   ENVIRONMENT             : reported by health endpoints (default "development")
//!   BACKEND_CORS_ORIGINS    : comma list, or "*" for any
//!   AZURE_OPENAI_API_KEY    : enables Azure OpenAI (with _ENDPOINT, _DEPLOYMENT, _API_VERSION)
//!   OPENAI_API_KEY          : enables an OpenAI-compatible API (with OPENAI_BASE_URL, OPENAI_MODEL)
//!   PROMPT_CONFIG_PATH      : TOML file overriding the built-in prompts
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use learnpath_backend::{build_router, telemetry, AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_env();
  let addr = settings.bind_addr();
  info!(
    target: "learnpath",
    version = %settings.version,
    environment = %settings.environment,
    provider = settings.ai.provider.name(),
    "starting"
  );

  let state = Arc::new(AppState::from_settings(settings));
  let app = build_router(state);

  let listener = TcpListener::bind(&addr).await?;
  info!(target: "learnpath", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "learnpath", "server stopped");
  Ok(())
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!(target: "learnpath", "shutdown signal received"),
    Err(e) => {
      warn!(target: "learnpath", error = %e, "failed to listen for shutdown signal; running until killed");
      std::future::pending::<()>().await
    }
  }
}
