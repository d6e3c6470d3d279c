use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use safehaven_core::{UserId, UserIdentity};
use safehaven_domain::{CaseId, IncidentId, StatusId};

use crate::dto::{
    AddCaseUpdateRequest, AssignCaseRequest, CaseResponse, CaseUpdateResponse, ListParams,
    ResolutionNotesRequest, UpdateStatusRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn promote_case_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(incident_id): Path<uuid::Uuid>,
) -> ApiResult<(StatusCode, Json<CaseResponse>)> {
    let case = state
        .case_service
        .promote(&user, IncidentId::from_uuid(incident_id))
        .await?;

    Ok((StatusCode::CREATED, Json(CaseResponse::from(case))))
}

pub async fn list_cases_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<CaseResponse>>> {
    let cases = state
        .case_service
        .list_cases(&user, params.into())
        .await?
        .into_iter()
        .map(CaseResponse::from)
        .collect();

    Ok(Json(cases))
}

pub async fn get_case_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
) -> ApiResult<Json<CaseResponse>> {
    let case = state
        .case_service
        .get_case(&user, CaseId::from_uuid(case_id))
        .await?;

    Ok(Json(CaseResponse::from(case)))
}

pub async fn assign_case_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
    Json(payload): Json<AssignCaseRequest>,
) -> ApiResult<Json<CaseResponse>> {
    let case = state
        .case_service
        .assign(
            &user,
            CaseId::from_uuid(case_id),
            UserId::from_uuid(payload.assignee),
        )
        .await?;

    Ok(Json(CaseResponse::from(case)))
}

pub async fn update_case_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<CaseResponse>> {
    let case = state
        .case_service
        .update_status(
            &user,
            CaseId::from_uuid(case_id),
            StatusId::from_uuid(payload.status_id),
        )
        .await?;

    Ok(Json(CaseResponse::from(case)))
}

pub async fn set_resolution_notes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
    Json(payload): Json<ResolutionNotesRequest>,
) -> ApiResult<Json<CaseResponse>> {
    let case = state
        .case_service
        .set_resolution_notes(&user, CaseId::from_uuid(case_id), payload.notes)
        .await?;

    Ok(Json(CaseResponse::from(case)))
}

pub async fn add_case_update_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
    Json(payload): Json<AddCaseUpdateRequest>,
) -> ApiResult<(StatusCode, Json<CaseUpdateResponse>)> {
    let update = state
        .case_service
        .add_update(&user, CaseId::from_uuid(case_id), payload.note)
        .await?;

    Ok((StatusCode::CREATED, Json(CaseUpdateResponse::from(update))))
}

pub async fn list_case_updates_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
) -> ApiResult<Json<Vec<CaseUpdateResponse>>> {
    let updates = state
        .case_service
        .list_updates(&user, CaseId::from_uuid(case_id))
        .await?
        .into_iter()
        .map(CaseUpdateResponse::from)
        .collect();

    Ok(Json(updates))
}

pub async fn delete_case_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(case_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .case_service
        .delete_case(&user, CaseId::from_uuid(case_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
