use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        admin::{DashboardResponse, ParticipantSummary, QuestionInput, QuestionRecord},
        auth::ActionResponse,
    },
    error::AppError,
    services::{admin_service, auth_service},
    state::SharedState,
};

/// Routes for the Game Master dashboard and question bank, admin-only.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/questions", get(list_questions))
        .route("/api/admin/questions", post(create_question))
        .route("/api/admin/questions/{id}", put(update_question))
        .route("/api/admin/questions/{id}", delete(delete_question))
        .layer(middleware::from_fn(auth_service::admin_middleware))
        .layer(middleware::from_fn_with_state(
            state,
            auth_service::auth_middleware,
        ))
}

/// Dashboard view over every participant account.
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin token")
    )
)]
pub async fn dashboard(
    State(state): State<SharedState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let response = admin_service::dashboard(&state).await?;
    Ok(Json(response))
}

/// List every participant account.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All participants", body = [ParticipantSummary]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin token")
    )
)]
pub async fn list_users(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ParticipantSummary>>, AppError> {
    let users = admin_service::list_users(&state).await?;
    Ok(Json(users))
}

/// List every bank question, correct answers included.
#[utoipa::path(
    get,
    path = "/api/admin/questions",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All questions", body = [QuestionRecord])
    )
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionRecord>>, AppError> {
    let questions = admin_service::list_questions(&state).await?;
    Ok(Json(questions))
}

/// Author a new bank question.
#[utoipa::path(
    post,
    path = "/api/admin/questions",
    tag = "admin",
    security(("bearer" = [])),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question created", body = QuestionRecord)
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionRecord>, AppError> {
    let record = admin_service::create_question(&state, payload).await?;
    Ok(Json(record))
}

/// Replace an existing bank question.
#[utoipa::path(
    put,
    path = "/api/admin/questions/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Question to replace")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question updated", body = QuestionRecord),
        (status = 404, description = "Unknown question")
    )
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionRecord>, AppError> {
    let record = admin_service::update_question(&state, id, payload).await?;
    Ok(Json(record))
}

/// Delete a bank question.
#[utoipa::path(
    delete,
    path = "/api/admin/questions/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Question to delete")),
    responses(
        (status = 200, description = "Question deleted", body = ActionResponse),
        (status = 404, description = "Unknown question")
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    admin_service::delete_question(&state, id).await?;
    Ok(Json(ActionResponse {
        message: "question deleted".to_string(),
    }))
}
