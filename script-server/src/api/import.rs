//! `POST /import-url`

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared_types::ImportRequest;

use super::detail;
use crate::api::ApiState;
use crate::import::{validate_url, ImportFailure};

impl IntoResponse for ImportFailure {
    fn into_response(self) -> Response {
        let status = match self {
            ImportFailure::InvalidUrl => StatusCode::UNPROCESSABLE_ENTITY,
            ImportFailure::Disabled => StatusCode::NOT_IMPLEMENTED,
            ImportFailure::Fetch(_) | ImportFailure::Upstream(_) | ImportFailure::NothingFound => {
                StatusCode::BAD_GATEWAY
            }
        };
        detail(status, self.to_string())
    }
}

pub async fn import_url(
    State(state): State<ApiState>,
    Json(req): Json<ImportRequest>,
) -> Result<impl IntoResponse, ImportFailure> {
    let url = validate_url(&req.url)?;
    let fields = state.importer().import(url).await.inspect_err(|e| {
        tracing::warn!(url = %url, error = %e, "URL import failed");
    })?;
    if !fields.has_content() {
        return Err(ImportFailure::NothingFound);
    }
    tracing::info!(url = %url, "URL imported");
    Ok(Json(fields))
}
