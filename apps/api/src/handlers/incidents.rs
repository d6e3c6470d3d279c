use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use safehaven_core::UserIdentity;
use safehaven_domain::{IncidentId, StatusId};

use crate::dto::{IncidentResponse, ListParams, ReportIncidentRequest, UpdateStatusRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_incident_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ReportIncidentRequest>,
) -> ApiResult<(StatusCode, Json<IncidentResponse>)> {
    let incident = state
        .incident_service
        .create_incident(&user, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(IncidentResponse::from(incident))))
}

pub async fn create_anonymous_incident_handler(
    State(state): State<AppState>,
    Json(payload): Json<ReportIncidentRequest>,
) -> ApiResult<(StatusCode, Json<IncidentResponse>)> {
    let incident = state
        .incident_service
        .create_anonymous_incident(payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(IncidentResponse::from(incident))))
}

pub async fn list_incidents_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<IncidentResponse>>> {
    let incidents = state
        .incident_service
        .list_incidents(&user, params.into())
        .await?
        .into_iter()
        .map(IncidentResponse::from)
        .collect();

    Ok(Json(incidents))
}

pub async fn get_incident_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(incident_id): Path<uuid::Uuid>,
) -> ApiResult<Json<IncidentResponse>> {
    let incident = state
        .incident_service
        .get_incident(&user, IncidentId::from_uuid(incident_id))
        .await?;

    Ok(Json(IncidentResponse::from(incident)))
}

pub async fn update_incident_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(incident_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<IncidentResponse>> {
    let incident = state
        .incident_service
        .update_status(
            &user,
            IncidentId::from_uuid(incident_id),
            StatusId::from_uuid(payload.status_id),
        )
        .await?;

    Ok(Json(IncidentResponse::from(incident)))
}

pub async fn delete_incident_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(incident_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .incident_service
        .delete_incident(&user, IncidentId::from_uuid(incident_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
