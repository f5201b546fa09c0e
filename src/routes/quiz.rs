use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};

use crate::{
    dto::quiz::{PublicQuestion, QuizScore, QuizSubmission},
    error::AppError,
    services::{auth_service, auth_service::Claims, quiz_service},
    state::SharedState,
};

/// Routes for the standalone quiz, open to any authenticated account.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/api/quiz/questions", get(list_questions))
        .route("/api/quiz/submit", post(submit))
        .layer(middleware::from_fn_with_state(
            state,
            auth_service::auth_middleware,
        ))
}

/// List every quiz question with the correct answers stripped.
#[utoipa::path(
    get,
    path = "/api/quiz/questions",
    tag = "quiz",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Questions without answers", body = [PublicQuestion]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PublicQuestion>>, AppError> {
    let questions = quiz_service::list_questions(&state).await?;
    Ok(Json(questions))
}

/// Grade a completed quiz submission for the authenticated participant.
#[utoipa::path(
    post,
    path = "/api/quiz/submit",
    tag = "quiz",
    security(("bearer" = [])),
    request_body = QuizSubmission,
    responses(
        (status = 200, description = "Graded submission", body = QuizScore),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn submit(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<QuizSubmission>,
) -> Result<Json<QuizScore>, AppError> {
    let score = quiz_service::submit(&state, claims.sub, payload).await?;
    Ok(Json(score))
}
