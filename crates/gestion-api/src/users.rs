use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use gestion_types::api::{
    ActionResponse, Claims, CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse,
    UsersResponse,
};
use gestion_types::models::RoleKind;

use crate::auth::{AppState, MIN_PASSWORD_LEN, duplicate_email, hash_password, normalize_email, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::tenancy::Scope;

/// Accounts eligible to administer a company.
#[utoipa::path(
    get,
    path = "/api/users/admins",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Super and company admins", body = UsersResponse),
        (status = 403, description = "Caller is not an administrator", body = MessageResponse),
    )
)]
pub async fn list_admins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    Scope::load(&state, &claims).await?.require_manager()?;

    let rows = state.query(|db| db.list_admins()).await?;
    Ok(Json(UsersResponse {
        users: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/users/create",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ActionResponse),
        (status = 400, description = "Missing fields, bad role or duplicate email", body = MessageResponse),
        (status = 403, description = "Role or company outside the caller's scope", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    scope.require_manager()?;

    let (Some(name), Some(email), Some(password), Some(role_id)) = (
        required(&req.name),
        required(&req.email),
        req.password.filter(|p| !p.is_empty()),
        req.role_id,
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let email = normalize_email(&email).ok_or_else(|| ApiError::bad_request("Invalid email"))?;
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.query(move |db| db.get_role(role_id)).await?.is_none() {
        return Err(ApiError::bad_request("Unknown role"));
    }
    scope.require_assignable_role(role_id)?;

    // Company admins always enroll new accounts somewhere they manage.
    let company_id = match (req.company_id, scope.role) {
        (Some(company_id), _) => Some(company_id),
        (None, RoleKind::CompanyAdmin) => Some(
            scope
                .primary_company()
                .ok_or_else(|| ApiError::forbidden("You must be assigned to a company before creating users"))?,
        ),
        (None, _) => None,
    };
    if let Some(company_id) = company_id {
        scope.require_manager_of(company_id)?;
        if state.query(move |db| db.get_company(company_id)).await?.is_none() {
            return Err(ApiError::not_found("Company not found"));
        }
    }

    let lookup = email.clone();
    if state.query(move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&password)?;
    let new_email = email.clone();
    let user_id = state
        .query(move |db| db.create_user(&name, &new_email, &password_hash, role_id, company_id))
        .await
        .map_err(duplicate_email)?;

    info!("User {} created user {} ({})", scope.user_id, user_id, email);

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::created("User created successfully", &scope.email).with_id(user_id)),
    ))
}

/// Everyone for super admins, otherwise people sharing a company with the caller.
#[utoipa::path(
    get,
    path = "/api/users/list",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible users", body = UsersResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let viewer = scope.user_id;

    let rows = if scope.is_super_admin() {
        state.query(|db| db.list_users()).await?
    } else {
        state.query(move |db| db.list_users_visible_to(viewer)).await?
    };

    Ok(Json(UsersResponse {
        users: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "User outside the caller's scope", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;

    let (row, companies) = state
        .query(move |db| Ok((db.get_user(id)?, db.company_ids_for_user(id)?)))
        .await?;
    let row = row.ok_or_else(|| ApiError::not_found("User not found"))?;

    if !scope.can_see_user(row.id, &companies) {
        return Err(ApiError::forbidden("Access denied to this user"));
    }

    Ok(Json(UserResponse { user: row.into() }))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ActionResponse),
        (status = 400, description = "Missing fields, bad role or duplicate email", body = MessageResponse),
        (status = 403, description = "Target or role outside the caller's scope", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;

    let (target, target_companies) = state
        .query(move |db| Ok((db.get_user(id)?, db.company_ids_for_user(id)?)))
        .await?;
    let target = target.ok_or_else(|| ApiError::not_found("User not found"))?;

    let (Some(name), Some(email), Some(role_id)) = (required(&req.name), required(&req.email), req.role_id)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let email = normalize_email(&email).ok_or_else(|| ApiError::bad_request("Invalid email"))?;
    let password = req.password.filter(|p| !p.trim().is_empty());
    if password.as_ref().is_some_and(|p| p.len() < MIN_PASSWORD_LEN) {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role_changes = role_id != target.role_id;
    if target.id == scope.user_id {
        if role_changes && !scope.is_super_admin() {
            return Err(ApiError::forbidden("You cannot change your own role"));
        }
    } else {
        scope.require_can_manage_user(RoleKind::from_id(target.role_id), &target_companies)?;
    }
    if role_changes {
        if state.query(move |db| db.get_role(role_id)).await?.is_none() {
            return Err(ApiError::bad_request("Unknown role"));
        }
        scope.require_assignable_role(role_id)?;
    }

    let lookup = email.clone();
    if let Some(existing) = state.query(move |db| db.get_user_by_email(&lookup)).await? {
        if existing.id != id {
            return Err(ApiError::bad_request("Email is already in use"));
        }
    }

    let password_hash = password.as_deref().map(hash_password).transpose()?;
    let updated = state
        .query(move |db| db.update_user(id, &name, &email, role_id, password_hash.as_deref()))
        .await
        .map_err(duplicate_email)?;
    if !updated {
        return Err(ApiError::not_found("User not found"));
    }

    info!("User {} updated user {}", scope.user_id, id);

    Ok(Json(ActionResponse::updated("User updated successfully", &scope.email)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = ActionResponse),
        (status = 400, description = "Caller tried to delete themselves", body = MessageResponse),
        (status = 403, description = "Target outside the caller's scope", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;

    let (target, target_companies) = state
        .query(move |db| Ok((db.get_user(id)?, db.company_ids_for_user(id)?)))
        .await?;
    let target = target.ok_or_else(|| ApiError::not_found("User not found"))?;

    if target.id == scope.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }
    scope.require_can_manage_user(RoleKind::from_id(target.role_id), &target_companies)?;

    state.query(move |db| db.delete_user(id)).await?;
    info!("User {} deleted user {}", scope.user_id, id);

    Ok(Json(ActionResponse::deleted("User deleted successfully", &scope.email)))
}
