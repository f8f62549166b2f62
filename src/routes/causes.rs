use axum::{
    Router,
    extract::{Json, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::causes;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct CatalogQuery {
    category: Option<String>,
}

async fn list(Query(query): Query<CatalogQuery>) -> Response {
    let listed = causes::in_category(query.category.as_deref());
    Json(json!({
        "success": true,
        "categories": causes::CATEGORIES,
        "causes": listed,
    }))
    .into_response()
}

async fn show(Path(id): Path<String>) -> Result<Response, AppError> {
    let cause = causes::find(&id).ok_or(AppError::NotFound("Cause not found"))?;
    Ok(Json(json!({
        "success": true,
        "cause": cause,
        "progress": cause.progress_percent(),
    }))
    .into_response())
}

pub fn cause_routes() -> Router<AppState> {
    Router::new()
        .route("/causes", get(list))
        .route("/causes/:id", get(show))
}
