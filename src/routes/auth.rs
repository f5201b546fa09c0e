use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, ParticipantProfile, RegisterRequest},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Routes for account registration and login.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Create a participant account at the registration stage.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = ParticipantProfile),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterRequest>>,
) -> Result<Json<ParticipantProfile>, AppError> {
    let profile = auth_service::register(&state, payload).await?;
    Ok(Json(profile))
}

/// Authenticate an account and issue a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = auth_service::login(&state, payload).await?;
    Ok(Json(response))
}
