use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use gestion_db::is_unique_violation;
use gestion_types::api::{
    AssignCampanaUserRequest, CampanaMembersResponse, CampanasResponse, Claims,
    CreateCampanaRequest, CreateCampanaResponse, MessageResponse,
};
use gestion_types::models::Campana;

use crate::auth::{AppState, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::tenancy::Scope;

async fn load_campana(state: &AppState, id: i64) -> ApiResult<Campana> {
    state
        .query(move |db| db.get_campana(id))
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::not_found("Campaign not found"))
}

/// All campaigns for super admins, otherwise those of the caller's companies.
#[utoipa::path(
    get,
    path = "/api/campanas",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible campaigns", body = CampanasResponse),
    )
)]
pub async fn list_campanas(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let user_id = scope.user_id;

    let rows = if scope.is_super_admin() {
        state.query(|db| db.list_campanas()).await?
    } else {
        state.query(move |db| db.list_campanas_for_user(user_id)).await?
    };

    let campanas: Vec<Campana> = rows.into_iter().map(Into::into).collect();
    Ok(Json(CampanasResponse {
        total: campanas.len(),
        campanas,
    }))
}

#[utoipa::path(
    get,
    path = "/api/campanas/{id}",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign", body = Campana),
        (status = 403, description = "Campaign outside the caller's companies", body = MessageResponse),
        (status = 404, description = "Campaign not found", body = MessageResponse),
    )
)]
pub async fn get_campana(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let campana = load_campana(&state, id).await?;
    scope.require_view(campana.company_id)?;
    Ok(Json(campana))
}

/// Any member may open a campaign in one of their companies.
#[utoipa::path(
    post,
    path = "/api/campanas",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    request_body = CreateCampanaRequest,
    responses(
        (status = 201, description = "Campaign created", body = CreateCampanaResponse),
        (status = 400, description = "Missing name, or company_id for a super admin", body = MessageResponse),
        (status = 403, description = "Company outside the caller's scope", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn create_campana(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateCampanaRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;

    let nombre = required(&req.nombre).ok_or_else(|| ApiError::bad_request("Name is required"))?;
    let descripcion = required(&req.descripcion);
    let company_id = scope.resolve_company(req.company_id)?;

    if state.query(move |db| db.get_company(company_id)).await?.is_none() {
        return Err(ApiError::not_found("Company not found"));
    }

    let id = state
        .query(move |db| db.create_campana(company_id, &nombre, descripcion.as_deref()))
        .await?;

    info!("User {} created campaign {} in company {}", scope.user_id, id, company_id);

    Ok((
        StatusCode::CREATED,
        Json(CreateCampanaResponse {
            msg: "Campaign created".into(),
            id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/campanas/assign-user",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    request_body = AssignCampanaUserRequest,
    responses(
        (status = 200, description = "User assigned", body = MessageResponse),
        (status = 400, description = "Missing ids or already assigned", body = MessageResponse),
        (status = 403, description = "Caller cannot manage the company or user is not a member", body = MessageResponse),
        (status = 404, description = "Campaign or user not found", body = MessageResponse),
    )
)]
pub async fn assign_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<AssignCampanaUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;

    let (Some(campana_id), Some(user_id)) = (req.campana_id, req.user_id) else {
        return Err(ApiError::bad_request("campana_id and user_id are required"));
    };

    let campana = load_campana(&state, campana_id).await?;
    scope.require_manager_of(campana.company_id)?;

    let company_id = campana.company_id;
    let (user, is_member) = state
        .query(move |db| Ok((db.get_user(user_id)?, db.is_member(user_id, company_id)?)))
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if !is_member {
        return Err(ApiError::forbidden("User does not belong to this campaign's company"));
    }

    state
        .query(move |db| db.assign_user_to_campana(campana_id, user_id))
        .await
        .map_err(|err| match err {
            ApiError::Internal(e) if is_unique_violation(&e) => {
                ApiError::bad_request("User is already assigned")
            }
            other => other,
        })?;

    info!("User {} assigned user {} to campaign {}", scope.user_id, user_id, campana_id);
    Ok(Json(MessageResponse::new("User assigned to campaign successfully")))
}

/// Company members not yet on the campaign.
#[utoipa::path(
    get,
    path = "/api/campanas/{id}/assignable-users",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Assignable members", body = CampanaMembersResponse),
        (status = 403, description = "Campaign outside the caller's companies", body = MessageResponse),
        (status = 404, description = "Campaign not found", body = MessageResponse),
    )
)]
pub async fn assignable_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let campana = load_campana(&state, id).await?;
    scope.require_view(campana.company_id)?;

    let rows = state.query(move |db| db.assignable_users(id)).await?;
    Ok(Json(CampanaMembersResponse {
        campana_id: id,
        total: rows.len(),
        users: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/campanas/{id}/users",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Assigned users", body = CampanaMembersResponse),
        (status = 403, description = "Campaign outside the caller's companies", body = MessageResponse),
        (status = 404, description = "Campaign not found", body = MessageResponse),
    )
)]
pub async fn campana_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let campana = load_campana(&state, id).await?;
    scope.require_view(campana.company_id)?;

    let rows = state.query(move |db| db.campana_members(id)).await?;
    Ok(Json(CampanaMembersResponse {
        campana_id: id,
        total: rows.len(),
        users: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/campanas/{id}/users/{user_id}",
    tag = "Campanas",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Campaign id"),
        ("user_id" = i64, Path, description = "Assigned user id"),
    ),
    responses(
        (status = 200, description = "User removed", body = MessageResponse),
        (status = 403, description = "Caller does not manage the company", body = MessageResponse),
        (status = 404, description = "Campaign not found or user not assigned", body = MessageResponse),
    )
)]
pub async fn remove_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath((id, user_id)): ApiPath<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let campana = load_campana(&state, id).await?;
    scope.require_manager_of(campana.company_id)?;

    if !state.query(move |db| db.remove_user_from_campana(id, user_id)).await? {
        return Err(ApiError::not_found("User is not assigned to this campaign"));
    }

    info!("User {} removed user {} from campaign {}", scope.user_id, user_id, id);
    Ok(Json(MessageResponse::new("User removed from campaign successfully")))
}
