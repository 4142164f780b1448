//! Learning path backend: an HTTP service that asks an LLM for learning paths,
//! exercises and quizzes, and turns whatever comes back into well-formed
//! content (repair → schema normalize → id injection → fallback).

pub mod config;
pub mod domain;
pub mod error;
pub mod grading;
pub mod logic;
pub mod normalize;
pub mod openai;
pub mod prompts;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
pub mod validate;

pub use config::Settings;
pub use routes::build_router;
pub use state::AppState;
