//! Script CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use shared_types::{NewScript, ScriptId, ScriptPatch, DEFAULT_LIST_LIMIT, DEFAULT_LIST_OFFSET};

use super::detail;
use crate::api::ApiState;
use crate::app_state::ScriptTableError;

#[derive(Debug, Deserialize)]
pub struct ListScriptsQuery {
    #[serde(default = "default_offset")]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_offset() -> u32 {
    DEFAULT_LIST_OFFSET
}

fn default_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

impl IntoResponse for ScriptTableError {
    fn into_response(self) -> Response {
        match self {
            ScriptTableError::NotFound(_) => detail(StatusCode::NOT_FOUND, self.to_string()),
            ScriptTableError::Invalid(e) => {
                detail(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
        }
    }
}

/// `GET /scripts/?offset=&limit=`
pub async fn list_scripts(
    State(state): State<ApiState>,
    Query(query): Query<ListScriptsQuery>,
) -> impl IntoResponse {
    let scripts = state.list_scripts(query.offset, query.limit).await;
    tracing::debug!(
        offset = query.offset,
        limit = query.limit,
        returned = scripts.len(),
        "Listed scripts"
    );
    Json(scripts)
}

/// `GET /scripts/{id}`
pub async fn get_script(
    Path(script_id): Path<i64>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ScriptTableError> {
    let script = state.get_script(ScriptId(script_id)).await?;
    Ok(Json(script))
}

/// `POST /scripts/`
pub async fn create_script(
    State(state): State<ApiState>,
    Json(req): Json<NewScript>,
) -> Result<impl IntoResponse, ScriptTableError> {
    let script = state.create_script(req).await.inspect_err(|e| {
        tracing::info!(error = %e, "Rejected script creation");
    })?;
    tracing::info!(id = %script.id, "Script created");
    Ok(Json(script))
}

/// `PATCH /scripts/{id}` - fields absent from the body are left unchanged.
pub async fn update_script(
    Path(script_id): Path<i64>,
    State(state): State<ApiState>,
    Json(patch): Json<ScriptPatch>,
) -> Result<impl IntoResponse, ScriptTableError> {
    let script = state.update_script(ScriptId(script_id), &patch).await?;
    tracing::info!(id = %script.id, "Script updated");
    Ok(Json(script))
}

/// `DELETE /scripts/{id}`
pub async fn delete_script(
    Path(script_id): Path<i64>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ScriptTableError> {
    state.delete_script(ScriptId(script_id)).await?;
    tracing::info!(id = script_id, "Script deleted");
    Ok(Json(json!({ "ok": true })))
}
