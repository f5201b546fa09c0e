//! Question image uploads: multipart intake and public URL construction.

use axum::extract::Multipart;
use tokio::fs;
use tracing::info;

use crate::{
    dto::admin::UploadResponse,
    error::AppError,
    state::{SharedState, live::unix_millis_now},
};

/// Multipart field name carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

/// Store an uploaded image and return its public URL.
///
/// Files land in the configured upload directory under a timestamped name, so
/// repeated uploads of the same file never overwrite each other. Only the
/// `image` field of the multipart body is consumed.
pub async fn store_image(
    state: &SharedState,
    mut multipart: Multipart,
) -> Result<UploadResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("malformed multipart body: {err}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read upload: {err}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".to_string()));
        }

        let file_name = format!("{}-{}", unix_millis_now(), sanitize(&original_name));
        let upload_dir = state.config().upload_dir();
        fs::create_dir_all(upload_dir)
            .await
            .map_err(|err| AppError::Internal(format!("failed to create upload dir: {err}")))?;
        let path = upload_dir.join(&file_name);
        fs::write(&path, &bytes)
            .await
            .map_err(|err| AppError::Internal(format!("failed to store upload: {err}")))?;

        info!(file = %file_name, size = bytes.len(), "stored uploaded image");
        return Ok(UploadResponse {
            url: format!("{}/uploads/{}", state.config().public_base_url(), file_name),
        });
    }

    Err(AppError::BadRequest(format!(
        "multipart body is missing an `{IMAGE_FIELD}` field"
    )))
}

/// Reduce a client-supplied file name to a safe flat name.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '-' | '_') {
                character
            } else {
                '-'
            }
        })
        .collect();
    // Reject names that would escape the upload directory once flattened.
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_flattens_path_separators() {
        assert_eq!(sanitize("../etc/passwd"), "-etc-passwd");
        assert_eq!(sanitize("photo (1).png"), "photo--1-.png");
        assert_eq!(sanitize("..."), "upload");
        assert_eq!(sanitize("plain.png"), "plain.png");
    }
}
