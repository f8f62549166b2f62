use axum::{
    Router,
    extract::{Json, Multipart, State, multipart::Field},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::AppState;
use crate::blob::{BlobStore, Upload, UploadError};
use crate::error::AppError;

pub async fn read_upload(field: Field<'_>) -> Result<Upload, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?;

    if bytes.is_empty() {
        return Err(UploadError::MissingFile.into());
    }

    Ok(Upload {
        bytes: bytes.to_vec(),
        file_name,
        content_type,
    })
}

pub async fn upload_image(blobs: &dyn BlobStore, upload: Option<Upload>) -> Result<String, AppError> {
    let upload = upload.ok_or(UploadError::MissingFile)?;
    Ok(blobs.put(upload).await?)
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() == Some("file") {
            file = Some(read_upload(field).await?);
        }
    }

    let url = upload_image(state.blobs.as_ref(), file).await?;
    Ok(Json(json!({ "success": true, "url": url })).into_response())
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/uploads", post(upload))
}
