use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use safehaven_core::{UserId, UserIdentity};
use safehaven_domain::{Permission, RoleName};

use crate::dto::{
    BulkRoleAssignmentRequest, BulkRoleAssignmentResponse, PermissionSetResponse,
    RoleAssignmentRequest, RoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    Extension(_user): Extension<UserIdentity>,
) -> Json<Vec<RoleResponse>> {
    let roles = RoleName::all()
        .iter()
        .copied()
        .map(RoleResponse::from)
        .collect();

    Json(roles)
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<PermissionSetResponse>> {
    let permissions = state
        .authorization_service
        .permissions(user.user_id())
        .await?
        .into_iter()
        .map(|permission| permission.as_str().to_owned())
        .collect();

    Ok(Json(PermissionSetResponse { permissions }))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    let role = RoleName::from_transport(payload.role_name.as_str())?;
    state
        .authorization_service
        .assign_role(&user, UserId::from_uuid(payload.user_id), role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_assign_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<BulkRoleAssignmentRequest>,
) -> ApiResult<Json<BulkRoleAssignmentResponse>> {
    let roles = payload
        .role_names
        .iter()
        .map(|name| RoleName::from_transport(name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let attached = state
        .authorization_service
        .assign_roles(&user, UserId::from_uuid(payload.user_id), &roles)
        .await?;

    Ok(Json(BulkRoleAssignmentResponse { attached }))
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    let role = RoleName::from_transport(payload.role_name.as_str())?;
    state
        .authorization_service
        .remove_role(&user, UserId::from_uuid(payload.user_id), role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_admin_service
        .delete_user(&user, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// Keep the permission vocabulary discoverable for gateway UIs.
pub async fn list_permissions_handler(
    Extension(_user): Extension<UserIdentity>,
) -> Json<PermissionSetResponse> {
    Json(PermissionSetResponse {
        permissions: Permission::all()
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect(),
    })
}
