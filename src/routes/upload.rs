use axum::{Json, Router, extract::Multipart, extract::State, middleware, routing::post};

use crate::{
    dto::admin::UploadResponse,
    error::AppError,
    services::{auth_service, upload_service},
    state::SharedState,
};

/// Route for uploading question images, admin-only.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/api/upload", post(upload_image))
        .layer(middleware::from_fn(auth_service::admin_middleware))
        .layer(middleware::from_fn_with_state(
            state,
            auth_service::auth_middleware,
        ))
}

/// Store an uploaded question image and return its public URL.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    security(("bearer" = [])),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing or empty image field")
    )
)]
pub async fn upload_image(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let response = upload_service::store_image(&state, multipart).await?;
    Ok(Json(response))
}
