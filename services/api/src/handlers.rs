//! Axum Handlers for the REST API
//!
//! HTTP endpoints for browsing and deleting saved assessments. The `utoipa`
//! doc comments generate the OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::{
    db::AssessmentStore,
    models::{AssessmentRecord, ErrorResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

fn require_user_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))
}

/// List all saved assessments for a user, newest first.
#[utoipa::path(
    get,
    path = "/assessments",
    responses(
        (status = 200, description = "List of assessments", body = [AssessmentRecord]),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn list_assessments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AssessmentRecord>>, ApiError> {
    let user_id = require_user_id(&headers)?;
    let records = state.db.fetch_all(user_id).await?;
    Ok(Json(records))
}

/// Get a specific saved assessment by its ID.
#[utoipa::path(
    get,
    path = "/assessments/{id}",
    responses(
        (status = 200, description = "Assessment details", body = AssessmentRecord),
        (status = 404, description = "Assessment not found"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Assessment ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&headers)?;

    let record = state
        .db
        .fetch(id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Assessment with id '{}' not found", id)))?;

    Ok((StatusCode::OK, Json(record)))
}

/// Delete a saved assessment.
#[utoipa::path(
    delete,
    path = "/assessments/{id}",
    responses(
        (status = 204, description = "Assessment deleted"),
        (status = 404, description = "Assessment not found"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Assessment ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn delete_assessment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&headers)?;

    // Ensure the assessment exists and belongs to the caller.
    let _ = state
        .db
        .fetch(id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Assessment with id '{}' not found", id)))?;

    state.db.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
