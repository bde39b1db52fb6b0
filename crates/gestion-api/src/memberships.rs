use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::info;

use gestion_db::is_unique_violation;
use gestion_types::api::{
    ActionResponse, Claims, CompanyMembersQuery, CompanyMembersResponse, MembershipRequest,
    MessageResponse,
};
use gestion_types::models::{Company, MainCompany};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::tenancy::Scope;

/// Shared checks for assign/remove: ids present, both rows exist, caller manages the company.
async fn authorize(state: &AppState, scope: &Scope, req: &MembershipRequest) -> ApiResult<(i64, i64)> {
    let (Some(user_id), Some(company_id)) = (req.user_id, req.company_id) else {
        return Err(ApiError::bad_request("user_id and company_id are required"));
    };

    let (user, company) = state
        .query(move |db| Ok((db.get_user(user_id)?, db.get_company(company_id)?)))
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if company.is_none() {
        return Err(ApiError::not_found("Company not found"));
    }

    scope.require_manager_of(company_id)?;
    Ok((user_id, company_id))
}

#[utoipa::path(
    post,
    path = "/api/user-company/assign-company",
    tag = "UserCompany",
    security(("bearer_auth" = [])),
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Membership created", body = ActionResponse),
        (status = 400, description = "Missing ids or already assigned", body = MessageResponse),
        (status = 403, description = "Caller does not manage the company", body = MessageResponse),
        (status = 404, description = "User or company not found", body = MessageResponse),
    )
)]
pub async fn assign_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<MembershipRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let (user_id, company_id) = authorize(&state, &scope, &req).await?;

    state
        .query(move |db| db.assign_user_to_company(user_id, company_id))
        .await
        .map_err(|err| match err {
            ApiError::Internal(e) if is_unique_violation(&e) => {
                ApiError::bad_request("User is already assigned to this company")
            }
            other => other,
        })?;

    info!("User {} assigned user {} to company {}", scope.user_id, user_id, company_id);
    Ok(Json(ActionResponse::assigned(
        "User assigned to company successfully",
        &scope.email,
    )))
}

#[utoipa::path(
    post,
    path = "/api/user-company/remove-company",
    tag = "UserCompany",
    security(("bearer_auth" = [])),
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Membership removed", body = ActionResponse),
        (status = 403, description = "Caller does not manage the company", body = MessageResponse),
        (status = 404, description = "User, company or membership not found", body = MessageResponse),
    )
)]
pub async fn remove_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<MembershipRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let (user_id, company_id) = authorize(&state, &scope, &req).await?;

    if !state.query(move |db| db.remove_user_from_company(user_id, company_id)).await? {
        return Err(ApiError::not_found("User is not assigned to this company"));
    }

    info!("User {} removed user {} from company {}", scope.user_id, user_id, company_id);
    Ok(Json(ActionResponse::removed(
        "User removed from company successfully",
        &scope.email,
    )))
}

#[utoipa::path(
    get,
    path = "/api/user-company/by-company",
    tag = "UserCompany",
    security(("bearer_auth" = [])),
    params(CompanyMembersQuery),
    responses(
        (status = 200, description = "Members of the company", body = CompanyMembersResponse),
        (status = 403, description = "Company outside the caller's scope", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn users_by_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<CompanyMembersQuery>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let company_id = scope.resolve_company(query.company_id)?;
    let role_id = query.role_id;

    let (company, rows) = state
        .query(move |db| Ok((db.get_company(company_id)?, db.company_members(company_id, role_id)?)))
        .await?;
    if company.is_none() {
        return Err(ApiError::not_found("Company not found"));
    }

    Ok(Json(CompanyMembersResponse {
        company_id,
        total: rows.len(),
        users: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/user-company/my-companies",
    tag = "UserCompany",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Companies the caller belongs to", body = [Company]),
    )
)]
pub async fn my_companies(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user_id = Scope::load(&state, &claims).await?.user_id;
    let rows = state.query(move |db| db.list_companies_for_user(user_id)).await?;
    let companies: Vec<Company> = rows.into_iter().map(Into::into).collect();
    Ok(Json(companies))
}

#[utoipa::path(
    get,
    path = "/api/user-company/main-company",
    tag = "UserCompany",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's earliest membership", body = MainCompany),
        (status = 404, description = "Caller has no company", body = MessageResponse),
    )
)]
pub async fn main_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user_id = Scope::load(&state, &claims).await?.user_id;
    let company: MainCompany = state
        .query(move |db| db.main_company_for_user(user_id))
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::not_found("User has no company assigned"))?;
    Ok(Json(company))
}
