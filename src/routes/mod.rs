//! Router assembly: HTTP endpoints, CORS, request ids, timing and HTTP tracing.

use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::config::CorsOrigins;
use crate::state::AppState;

pub mod http;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Build the application router with:
/// - service info at `/`
/// - JSON API under `/api/v1/...`
/// - CORS from `BACKEND_CORS_ORIGINS`
/// - `x-request-id` set (when absent) and echoed on every response
/// - `x-process-time` in seconds
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    let api = Router::new()
        .route("/health", get(http::http_health))
        .route("/health/ready", get(http::http_ready))
        // Learning paths
        .route("/learning-path/generate", post(http::http_generate_learning_path))
        .route("/learning-path/mock", get(http::http_mock_learning_path))
        .route("/learning-path/:path_id", get(http::http_get_learning_path))
        .route("/learning-path/:path_id/content/:node_id", get(http::http_node_content))
        .route("/learning-path/:path_id/explain", post(http::http_explain))
        .route("/learning-path/:path_id/progress", patch(http::http_update_progress))
        // Exercises
        .route("/exercise/generate", post(http::http_generate_exercise))
        .route("/exercise/:exercise_id", get(http::http_get_exercise))
        .route("/exercise/:exercise_id/evaluate", post(http::http_evaluate))
        .route("/exercise/:exercise_id/hint", post(http::http_hint))
        .route("/exercise/:exercise_id/submit", post(http::http_submit_exercise))
        .route("/exercise/:exercise_id/test", post(http::http_run_tests))
        // Quizzes
        .route("/quiz/generate", post(http::http_generate_quiz))
        .route("/quiz/:quiz_id", get(http::http_get_quiz))
        .route("/quiz/:quiz_id/submit", post(http::http_submit_quiz));

    Router::new()
        .route("/", get(http::http_root))
        .nest("/api/v1", api)
        .fallback(http::http_not_found)
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(middleware::from_fn(process_time))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(list) => {
            let parsed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!(target: "learnpath", %origin, error = %e, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(parsed)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn process_time(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut res = next.run(req).await;
    if let Ok(v) = HeaderValue::from_str(&format!("{:.4}", started.elapsed().as_secs_f64())) {
        res.headers_mut().insert(PROCESS_TIME_HEADER, v);
    }
    res
}
