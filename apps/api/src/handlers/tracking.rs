use axum::Json;
use axum::extract::{Path, State};

use crate::dto::IncidentResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Public lookup: an anonymous reporter checks on their incident with
/// nothing but the tracking code.
pub async fn resolve_tracking_code_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<IncidentResponse>> {
    let incident = state
        .incident_service
        .resolve_tracking_code(code.as_str())
        .await?;

    Ok(Json(IncidentResponse::from(incident)))
}
