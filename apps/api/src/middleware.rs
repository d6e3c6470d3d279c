use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use safehaven_core::{AppError, UserId, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

const USER_ID_HEADER: &str = "x-user-id";
const USER_NAME_HEADER: &str = "x-user-name";

/// Builds the caller's identity from the gateway-authenticated headers and
/// threads it through request extensions. Identities the gateway vouches
/// for are provisioned on first sight so role grants and incident
/// references can anchor on the user row.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let headers = request.headers();

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| uuid::Uuid::parse_str(value).ok())
        .map(UserId::from_uuid)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let display_name = headers
        .get(USER_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let identity = UserIdentity::new(user_id, display_name);

    sqlx::query(
        r#"
        INSERT INTO users (id, display_name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(identity.user_id().as_uuid())
    .bind(identity.display_name())
    .execute(&state.pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to provision user: {error}")))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
