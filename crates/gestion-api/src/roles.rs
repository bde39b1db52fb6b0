use axum::{Extension, Json, extract::State, response::IntoResponse};

use gestion_types::api::{Claims, MessageResponse, RolesResponse};

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::tenancy::Scope;

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All roles ordered by id", body = RolesResponse),
        (status = 401, description = "Missing, invalid or stale token", body = MessageResponse),
    )
)]
pub async fn list_roles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    Scope::load(&state, &claims).await?;

    let rows = state.query(|db| db.list_roles()).await?;
    Ok(Json(RolesResponse {
        roles: rows.into_iter().map(Into::into).collect(),
    }))
}
