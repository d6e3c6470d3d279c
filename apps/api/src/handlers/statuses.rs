use axum::Json;
use axum::extract::{Extension, Query, State};

use safehaven_core::{AppError, UserIdentity};
use safehaven_domain::StatusDomain;

use crate::dto::{StatusListParams, StatusResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_statuses_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<UserIdentity>,
    Query(params): Query<StatusListParams>,
) -> ApiResult<Json<Vec<StatusResponse>>> {
    let domains: &[StatusDomain] = match params.domain.as_deref() {
        None => &[StatusDomain::Incident, StatusDomain::Case],
        Some("incident") => &[StatusDomain::Incident],
        Some("case") => &[StatusDomain::Case],
        Some(other) => {
            return Err(AppError::Validation(format!(
                "unknown status domain '{other}'; expected 'incident' or 'case'"
            ))
            .into());
        }
    };

    let mut statuses = Vec::new();
    for domain in domains {
        statuses.extend(
            state
                .status_catalog_service
                .members_of(*domain)
                .await?
                .into_iter()
                .map(StatusResponse::from),
        );
    }

    Ok(Json(statuses))
}
