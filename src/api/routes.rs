//! REST endpoints over the journey service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::error::JourneyError;
use crate::journey::JourneyService;
use crate::shortlist::Category;
use crate::students::Onboarding;

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<JourneyService>,
}

/// Maps journey errors onto status codes with a `{error, message}` body.
pub struct ApiError(JourneyError);

impl From<JourneyError> for ApiError {
    fn from(e: JourneyError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            JourneyError::NotFound { .. } => StatusCode::NOT_FOUND,
            JourneyError::AlreadyLocked { .. } | JourneyError::InvalidState(_) => {
                StatusCode::CONFLICT
            }
            JourneyError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            JourneyError::Database(e) => {
                error!(error = %e, "Request failed on database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct ShortlistRequest {
    #[serde(default)]
    category: Option<Category>,
}

#[derive(Debug, Deserialize)]
struct TaskQuery {
    university_id: Option<Uuid>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /api/students
async fn register(
    State(state): State<ApiState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let student = state.service.register_student(&req.name, &req.email).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/{id}
async fn status(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.journey_status(id).await?))
}

/// POST /api/students/{id}/onboarding
async fn submit_onboarding(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(onboarding): Json<Onboarding>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.submit_onboarding(id, onboarding).await?))
}

/// GET /api/students/{id}/shortlist
async fn list_shortlist(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.list_shortlist(id).await?))
}

/// POST /api/students/{id}/shortlist/{university_id}
///
/// The body is optional; an absent category keeps the existing one.
async fn add_shortlist(
    State(state): State<ApiState>,
    Path((id, university_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let category = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ShortlistRequest>(&body)
            .map_err(|e| JourneyError::ValidationFailed {
                reason: format!("invalid shortlist body: {e}"),
            })?
            .category
    };
    Ok(Json(
        state
            .service
            .shortlist(id, university_id, category)
            .await?,
    ))
}

/// DELETE /api/students/{id}/shortlist/{university_id}
async fn remove_shortlist(
    State(state): State<ApiState>,
    Path((id, university_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let removed = state.service.remove_shortlist(id, university_id).await?;
    Ok(Json(serde_json::json!({"removed": removed})))
}

/// POST /api/students/{id}/shortlist/{university_id}/lock
async fn lock(
    State(state): State<ApiState>,
    Path((id, university_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.lock_university(id, university_id).await?))
}

/// POST /api/students/{id}/shortlist/{university_id}/unlock
async fn unlock(
    State(state): State<ApiState>,
    Path((id, university_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.unlock_university(id, university_id).await?))
}

/// GET /api/students/{id}/tasks
async fn list_tasks(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.list_tasks(id, query.university_id).await?))
}

/// POST /api/students/{id}/counsel
async fn counsel(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.request_advice(id).await?))
}

/// GET /api/universities
async fn list_universities(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.list_universities().await?))
}

/// Build the REST routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/students", post(register))
        .route("/api/students/{id}", get(status))
        .route("/api/students/{id}/onboarding", post(submit_onboarding))
        .route("/api/students/{id}/shortlist", get(list_shortlist))
        .route(
            "/api/students/{id}/shortlist/{university_id}",
            post(add_shortlist).delete(remove_shortlist),
        )
        .route("/api/students/{id}/shortlist/{university_id}/lock", post(lock))
        .route(
            "/api/students/{id}/shortlist/{university_id}/unlock",
            post(unlock),
        )
        .route("/api/students/{id}/tasks", get(list_tasks))
        .route("/api/students/{id}/counsel", post(counsel))
        .route("/api/universities", get(list_universities))
        .with_state(state)
}
