// src/docs.rs

//! OpenAPI document for the REST surface, served as JSON at
//! `/api-docs.json` with Swagger UI at `/api-docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    analytics::{PerformanceReport, WeakArea},
    error::{ErrorResponse, FieldError},
    feedback::Feedback,
    handlers::{auth, feedback, tests as test_handlers},
    models::{
        SuccessResponse,
        attempt::{HistoryEntryRequest, SubmitResultRequest, SubmitResultResponse, TestAttempt},
        test::{Question, Test},
        user::{LoginRequest, RegisterRequest, UserResponse},
    },
};

pub const DOCS_PATH: &str = "/api-docs";
pub const DOCS_JSON_PATH: &str = "/api-docs.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ENT Quiz API",
        description = "Authentication, subject tests, results and study feedback"
    ),
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::current_user,
        auth::add_test_history,
        test_handlers::list_tests,
        test_handlers::get_test,
        test_handlers::submit_results,
        test_handlers::list_results,
        test_handlers::list_results_for_test,
        test_handlers::performance,
        feedback::generate_feedback,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        UserResponse,
        TestAttempt,
        HistoryEntryRequest,
        SubmitResultRequest,
        SubmitResultResponse,
        Test,
        Question,
        PerformanceReport,
        WeakArea,
        Feedback,
        SuccessResponse,
        ErrorResponse,
        FieldError,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "tests", description = "Tests, results and performance"),
        (name = "ai", description = "Study feedback")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the protected paths refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
