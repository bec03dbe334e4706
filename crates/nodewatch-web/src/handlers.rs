//! HTTP request handlers.
//!
//! Collection and store access block, so every handler that touches them
//! moves the work onto `spawn_blocking`.

use std::collections::BTreeMap;
use std::fmt::Display;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use nodewatch_core::registry::RegistryError;
use nodewatch_core::storage::{Observation, RetentionError, StoreError};

use crate::openapi::ApiDoc;
use crate::state::AppState;

// ============================================================
// Errors
// ============================================================

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorDetail {
    status: u16,
    detail: String,
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorBody {
    errors: Vec<ErrorDetail>,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn unknown_category(category: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("Unknown category: {category}"),
        )
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }

    fn internal(message: impl Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            errors: vec![ErrorDetail {
                status: self.status.as_u16(),
                detail: self.detail,
            }],
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownCategory(name) => Self::unknown_category(&name),
            RegistryError::Collect(e) => {
                error!(error = %e, "collection failed");
                Self::internal(e)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "store operation failed");
        Self::internal(e)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<RetentionError> for ApiError {
    fn from(e: RetentionError) -> Self {
        match e {
            RetentionError::InvalidDatetime(e) => {
                warn!(error = %e, "rejected truncate request");
                Self::new(StatusCode::BAD_REQUEST, "Invalid datetime")
            }
            other => {
                error!(error = %other, "truncate failed");
                Self::internal(other)
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!(error = %e, "blocking task failed");
        Self::internal("internal error")
    }
}

fn require_category(state: &AppState, category: &str) -> Result<(), ApiError> {
    if state.registry.contains(category) {
        Ok(())
    } else {
        Err(ApiError::unknown_category(category))
    }
}

// ============================================================
// Index / health / docs
// ============================================================

#[utoipa::path(
    get,
    path = "/",
    responses(
        (
            status = 200,
            description = "Category name to collection URL",
            body = BTreeMap<String, String>
        )
    )
)]
pub(crate) async fn handle_index(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(
        state
            .registry
            .categories()
            .into_iter()
            .map(|c| (c.to_string(), format!("/{c}/")))
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

pub(crate) async fn handle_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ============================================================
// Observations
// ============================================================

#[utoipa::path(
    post,
    path = "/{category}/",
    params(("category" = String, Path, description = "Metric category")),
    responses(
        (status = 201, description = "Metric collected and stored", body = Observation),
        (status = 404, description = "Unknown category", body = ErrorBody),
        (status = 500, description = "Collection failed, nothing stored", body = ErrorBody)
    )
)]
pub(crate) async fn handle_create(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<Observation>), ApiError> {
    let Path(category) = path?;
    let observation = tokio::task::spawn_blocking(move || -> Result<Observation, ApiError> {
        let metric = state.registry.collect(&category, &state.collector)?;
        let data = metric.to_json().map_err(StoreError::from)?;
        let observation = state.lock_store().append(&category, Utc::now(), data)?;
        debug!(id = observation.id, category = %category, "observation stored");
        Ok(observation)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(observation)))
}

#[utoipa::path(
    get,
    path = "/{category}/",
    params(("category" = String, Path, description = "Metric category")),
    responses(
        (status = 200, description = "Observations, newest first", body = Vec<Observation>),
        (status = 404, description = "Unknown category", body = ErrorBody)
    )
)]
pub(crate) async fn handle_list(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let Path(category) = path?;
    require_category(&state, &category)?;
    let observations =
        tokio::task::spawn_blocking(move || state.lock_store().list(&category)).await??;
    Ok(Json(observations))
}

#[utoipa::path(
    get,
    path = "/{category}/{id}/",
    params(
        ("category" = String, Path, description = "Metric category"),
        ("id" = u64, Path, description = "Observation id")
    ),
    responses(
        (status = 200, description = "One observation", body = Observation),
        (status = 400, description = "Id is not a non-negative integer", body = ErrorBody),
        (status = 404, description = "Unknown category or id", body = ErrorBody)
    )
)]
pub(crate) async fn handle_retrieve(
    State(state): State<AppState>,
    path: Result<Path<(String, u64)>, PathRejection>,
) -> Result<Json<Observation>, ApiError> {
    let Path((category, id)) = path?;
    require_category(&state, &category)?;
    let found = tokio::task::spawn_blocking(move || state.lock_store().get(id)).await??;
    match found {
        Some(obs) if obs.category == category => Ok(Json(obs)),
        _ => Err(ApiError::not_found()),
    }
}

#[utoipa::path(
    delete,
    path = "/{category}/{id}/",
    params(
        ("category" = String, Path, description = "Metric category"),
        ("id" = u64, Path, description = "Observation id")
    ),
    responses(
        (status = 204, description = "Observation deleted"),
        (status = 400, description = "Id is not a non-negative integer", body = ErrorBody),
        (status = 404, description = "Unknown category or id", body = ErrorBody)
    )
)]
pub(crate) async fn handle_delete(
    State(state): State<AppState>,
    path: Result<Path<(String, u64)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((category, id)) = path?;
    require_category(&state, &category)?;
    let deleted = tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
        let mut store = state.lock_store();
        match store.get(id)? {
            Some(obs) if obs.category == category => store.delete(id),
            _ => Ok(false),
        }
    })
    .await??;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

// ============================================================
// Truncate
// ============================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct TruncateQuery {
    /// Cutoff: RFC 3339, `YYYY-MM-DD[ HH:MM:SS]`, unix seconds or relative (`-7d`).
    /// Defaults to the retention window.
    datetime: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct TruncateResponse {
    current_observation_count: usize,
}

#[utoipa::path(
    get,
    path = "/truncate",
    params(TruncateQuery),
    responses(
        (
            status = 200,
            description = "Observations older than the cutoff deleted",
            body = TruncateResponse
        ),
        (status = 400, description = "Invalid datetime", body = ErrorBody)
    )
)]
pub(crate) async fn handle_truncate(
    State(state): State<AppState>,
    query: Result<Query<TruncateQuery>, QueryRejection>,
) -> Result<Json<TruncateResponse>, ApiError> {
    let Query(query) = query?;
    let cutoff = state
        .retention
        .resolve_cutoff(query.datetime.as_deref(), Utc::now())?;

    let report = tokio::task::spawn_blocking(move || {
        let mut store = state.lock_store();
        state.retention.truncate(&mut **store, Some(cutoff))
    })
    .await??;

    Ok(Json(TruncateResponse {
        current_observation_count: report.remaining,
    }))
}
