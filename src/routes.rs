// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    docs::{ApiDoc, DOCS_JSON_PATH, DOCS_PATH},
    handlers::{auth, feedback, tests as test_handlers},
    state::AppState,
    utils::jwt::auth_middleware,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

/// Assembles the main application router.
///
/// * `/auth`: register and login are public, the rest needs a bearer token.
/// * `/tests` and `/ai`: all routes need a bearer token.
/// * `/api-docs`: Swagger UI over the OpenAPI document at `/api-docs.json`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Protected auth routes
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/current-user", get(auth::current_user))
                .route("/test-history", post(auth::add_test_history))
                .layer(require_auth.clone()),
        );

    // Static segments ("results", "performance") win over `{id}`.
    let test_routes = Router::new()
        .route("/", get(test_handlers::list_tests))
        .route("/performance", get(test_handlers::performance))
        .route(
            "/results",
            get(test_handlers::list_results).post(test_handlers::submit_results),
        )
        .route("/{id}", get(test_handlers::get_test))
        .route("/{id}/results", get(test_handlers::list_results_for_test))
        .layer(require_auth.clone());

    let ai_routes = Router::new()
        .route("/feedback", post(feedback::generate_feedback))
        .layer(require_auth);

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/tests", test_routes)
        .nest("/ai", ai_routes)
        .merge(SwaggerUi::new(DOCS_PATH).url(DOCS_JSON_PATH, ApiDoc::openapi()))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_origins)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{body::Body, http::Request};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    fn app(origins: Vec<String>) -> Router {
        let pool = SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .unwrap();
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiration: 60,
            rust_log: "error".to_string(),
            port: 0,
            catalog_path: None,
            cors_origins: origins,
        };
        create_router(AppState { pool, config })
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let response = app(Vec::new())
            .oneshot(Request::get("/tests/results").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn openapi_document_is_public() {
        let response = app(Vec::new())
            .oneshot(Request::get("/api-docs.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/tests/performance"]["get"].is_object());
        assert!(doc["components"]["schemas"]["PerformanceReport"].is_object());
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let response = app(vec!["http://localhost:19006".to_string()])
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/auth/login")
                    .header(header::ORIGIN, "http://localhost:19006")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:19006"
        );
    }
}
