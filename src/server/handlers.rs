use super::types::{ErrorResponse, IngredientsResponse};
use crate::{
    detection::DetectError,
    ingredients::{ExtractionError, IngredientExtractor},
    recipes::{self, Recipe},
};
use axum::{
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};
use uuid::Uuid;

/// Multipart field carrying the photo.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub extractor: IngredientExtractor,
}

pub async fn list_recipes() -> Json<&'static [Recipe]> {
    Json(recipes::all())
}

pub async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    match extract_ingredients(&state, multipart).await {
        Ok(ingredients) => {
            info!(
                "Request {}: detected {} ingredients",
                request_id,
                ingredients.len()
            );
            Json(IngredientsResponse { ingredients }).into_response()
        }
        Err(e) => {
            error!("Request {}: {} failure: {}", request_id, e.kind(), e);
            e.into_response()
        }
    }
}

async fn extract_ingredients(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<String>, ExtractionError> {
    let bytes = read_upload(multipart).await?;
    let extractor = state.extractor.clone();

    tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| DetectError::inference(format!("inference task failed: {}", e)))?
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Bytes, ExtractionError> {
    let mut multipart = multipart.map_err(|e| ExtractionError::upload(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractionError::upload(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|e| ExtractionError::upload(e.body_text()));
        }
    }

    Err(ExtractionError::upload(format!(
        "missing '{}' field",
        UPLOAD_FIELD
    )))
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        // Clients tell failures apart by the `error` key, not the status.
        (
            StatusCode::OK,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
