use axum::{Extension, Json, extract::State, response::IntoResponse};

use gestion_types::api::{Claims, DashboardResponse, MessageResponse};

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::tenancy::Scope;

/// Reports the caller's current role, not the one baked into the token.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller summary", body = DashboardResponse),
        (status = 401, description = "Missing, invalid or stale token", body = MessageResponse),
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let user_id = scope.user_id;
    let main_company = state.query(move |db| db.main_company_for_user(user_id)).await?;

    Ok(Json(DashboardResponse {
        msg: "Welcome to the dashboard!".into(),
        user_id,
        role_id: scope.role.id(),
        main_company: main_company.map(Into::into),
    }))
}
