use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Arena Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::quiz::list_questions,
        crate::routes::quiz::submit,
        crate::routes::admin::dashboard,
        crate::routes::admin::list_users,
        crate::routes::admin::list_questions,
        crate::routes::admin::create_question,
        crate::routes::admin::update_question,
        crate::routes::admin::delete_question,
        crate::routes::upload::upload_image,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::RegisterRequest,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::ParticipantProfile,
            crate::dto::auth::LoginResponse,
            crate::dto::auth::ActionResponse,
            crate::dto::admin::QuestionInput,
            crate::dto::admin::QuestionRecord,
            crate::dto::admin::ParticipantSummary,
            crate::dto::admin::DashboardResponse,
            crate::dto::admin::UploadResponse,
            crate::dto::quiz::PublicQuestion,
            crate::dto::quiz::QuizSubmission,
            crate::dto::quiz::QuizScore,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::PushQuestionRequest,
            crate::dto::ws::QuestionContent,
            crate::dto::ws::BatchQuestion,
            crate::state::stage::Cohort,
            crate::state::stage::Stage,
            crate::state::stage::Role,
            crate::state::stage::CohortTarget,
            crate::state::stage::StageTarget,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Account registration and login"),
        (name = "quiz", description = "Standalone quiz listing and grading"),
        (name = "admin", description = "Game Master dashboard and question bank"),
        (name = "upload", description = "Question image uploads"),
        (name = "session", description = "WebSocket operations for live game sessions"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token security scheme referenced by protected routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
