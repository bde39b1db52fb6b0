use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};

use gestion_db::models::CompanyUpdate;
use gestion_types::api::{
    ChangeStatusRequest, Claims, CreateCompanyRequest, CreateCompanyResponse, LogoResponse,
    MessageResponse, UpdateCompanyRequest,
};
use gestion_types::models::{Company, CompanyStatus};
use utoipa::ToSchema;

use crate::auth::{AppState, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::logos::{LogoStorage, MAX_LOGO_SIZE};
use crate::tenancy::Scope;

struct CompanyFields {
    name: String,
    ruc: String,
    description: Option<String>,
    address: String,
}

fn validate_fields(
    name: &Option<String>,
    ruc: &Option<String>,
    description: &Option<String>,
    address: &Option<String>,
) -> ApiResult<CompanyFields> {
    let name = required(name).ok_or_else(|| ApiError::bad_request("Name is required"))?;
    let ruc = required(ruc).ok_or_else(|| ApiError::bad_request("RUC is required"))?;
    let address = required(address).ok_or_else(|| ApiError::bad_request("Address is required"))?;
    Ok(CompanyFields {
        name,
        ruc,
        description: required(description),
        address,
    })
}

fn parse_status(raw: &str) -> ApiResult<CompanyStatus> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid status, expected 'active' or 'inactive'"))
}

/// Multipart body of the logo upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct LogoForm {
    #[schema(value_type = String, format = Binary)]
    logo: Vec<u8>,
}

async fn load_company(state: &AppState, id: i64) -> ApiResult<Company> {
    state
        .query(move |db| db.get_company(id))
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::not_found("Company not found"))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible companies, newest first", body = [Company]),
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let user_id = scope.user_id;

    let rows = if scope.is_super_admin() {
        state.query(|db| db.list_companies()).await?
    } else {
        state.query(move |db| db.list_companies_for_user(user_id)).await?
    };

    let companies: Vec<Company> = rows.into_iter().map(Into::into).collect();
    Ok(Json(companies))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company with its admin's name", body = Company),
        (status = 403, description = "Company outside the caller's scope", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn get_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let company = load_company(&state, id).await?;
    scope.require_view(company.id)?;
    Ok(Json(company))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    security(("bearer_auth" = [])),
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CreateCompanyResponse),
        (status = 400, description = "Missing name, RUC or address", body = MessageResponse),
        (status = 403, description = "Caller is not an administrator", body = MessageResponse),
    )
)]
pub async fn create_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateCompanyRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    scope.require_manager()?;

    let fields = validate_fields(&req.name, &req.ruc, &req.description, &req.address)?;
    let admin_user_id = scope.user_id;

    let company_id = state
        .query(move |db| {
            db.create_company(
                &fields.name,
                &fields.ruc,
                fields.description.as_deref(),
                &fields.address,
                admin_user_id,
            )
        })
        .await?;

    info!("User {} created company {}", admin_user_id, company_id);

    Ok((
        StatusCode::CREATED,
        Json(CreateCompanyResponse {
            msg: "Company created successfully".into(),
            company_id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Companies",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = MessageResponse),
        (status = 400, description = "Invalid fields, status or admin", body = MessageResponse),
        (status = 403, description = "Out of scope, or admin/status change by a non super admin", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn update_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateCompanyRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let company = load_company(&state, id).await?;
    scope.require_manager_of(company.id)?;

    let fields = validate_fields(&req.name, &req.ruc, &req.description, &req.address)?;
    let status = req.status.as_deref().map(parse_status).transpose()?;

    let admin_changes = req.admin_user_id.is_some_and(|a| Some(a) != company.admin_user_id);
    let status_changes = status.is_some_and(|s| s != company.status);
    if admin_changes || status_changes {
        scope.require_super_admin()?;
    }
    if let Some(admin_user_id) = req.admin_user_id.filter(|_| admin_changes) {
        if state.query(move |db| db.get_user(admin_user_id)).await?.is_none() {
            return Err(ApiError::bad_request("Admin user does not exist"));
        }
    }

    let admin_user_id = req.admin_user_id;
    state
        .query(move |db| {
            db.update_company(
                id,
                &CompanyUpdate {
                    name: &fields.name,
                    ruc: &fields.ruc,
                    description: fields.description.as_deref(),
                    address: &fields.address,
                    admin_user_id,
                    status,
                },
            )
        })
        .await?;

    info!("User {} updated company {}", scope.user_id, id);
    Ok(Json(MessageResponse::new("Company updated successfully")))
}

#[utoipa::path(
    patch,
    path = "/api/companies/{id}/status",
    tag = "Companies",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Company id")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = MessageResponse),
        (status = 400, description = "Status is not active or inactive", body = MessageResponse),
        (status = 403, description = "Super administrator role required", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn change_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ChangeStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    scope.require_super_admin()?;

    let status = parse_status(req.status.as_deref().unwrap_or_default())?;

    if !state.query(move |db| db.set_company_status(id, status)).await? {
        return Err(ApiError::not_found("Company not found"));
    }

    info!("User {} set company {} {}", scope.user_id, id, status);
    Ok(Json(MessageResponse::new(format!("Company {status}"))))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deleted", body = MessageResponse),
        (status = 403, description = "Super administrator role required", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
    )
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    scope.require_super_admin()?;

    let company = load_company(&state, id).await?;
    state.query(move |db| db.delete_company(id)).await?;

    if let Some(logo) = company.logo {
        if let Err(e) = state.logos.delete(&logo).await {
            error!("Failed to remove logo of deleted company {}: {}", id, e);
        }
    }

    info!("User {} deleted company {}", scope.user_id, id);
    Ok(Json(MessageResponse::new("Company deleted")))
}

/// Write the file, then point the company at it. The new file is removed
/// again if the row cannot be updated.
async fn store_logo(state: &AppState, id: i64, ext: &str, data: &[u8]) -> ApiResult<String> {
    let logo = state.logos.save(id, ext, data).await?;

    let stored = logo.clone();
    let previous = match state.query(move |db| db.set_company_logo(id, &stored)).await {
        Ok(Some(previous)) => previous,
        Ok(None) => {
            discard_logo(state, &logo).await;
            return Err(ApiError::not_found("Company not found"));
        }
        Err(e) => {
            discard_logo(state, &logo).await;
            return Err(e);
        }
    };

    if let Some(previous) = previous {
        if let Err(e) = state.logos.delete(&previous).await {
            error!("Failed to remove previous logo {}: {}", previous, e);
        }
    }
    Ok(logo)
}

async fn discard_logo(state: &AppState, logo: &str) {
    if let Err(e) = state.logos.delete(logo).await {
        error!("Failed to remove unused logo {}: {}", logo, e);
    }
}

#[utoipa::path(
    post,
    path = "/api/companies/{id}/logo",
    tag = "Companies",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Company id")),
    request_body(content = LogoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Logo stored", body = LogoResponse),
        (status = 400, description = "Missing, empty or non-image file", body = MessageResponse),
        (status = 403, description = "Caller does not manage the company", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
        (status = 413, description = "Logo larger than 2 MiB", body = MessageResponse),
    )
)]
pub async fn upload_logo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let scope = Scope::load(&state, &claims).await?;
    let company = load_company(&state, id).await?;
    scope.require_manager_of(company.id)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("logo") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let ext = LogoStorage::allowed_extension(&file_name).ok_or_else(|| {
            ApiError::bad_request("Logo must be a png, jpg, jpeg, gif, webp or svg image")
        })?;
        let data = field.bytes().await?;
        upload = Some((ext, data));
        break;
    }

    let (ext, data) = upload.ok_or_else(|| ApiError::bad_request("Missing 'logo' file field"))?;
    if data.is_empty() {
        return Err(ApiError::bad_request("Logo file is empty"));
    }
    if data.len() > MAX_LOGO_SIZE {
        return Err(ApiError::PayloadTooLarge(format!(
            "Logo exceeds {} bytes",
            MAX_LOGO_SIZE
        )));
    }

    let logo = store_logo(&state, id, &ext, &data).await?;

    info!("User {} uploaded logo for company {}", scope.user_id, id);
    Ok(Json(LogoResponse {
        msg: "Logo updated successfully".into(),
        logo,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gestion_db::Database;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{AppStateInner, JwtSettings};

    async fn state() -> AppState {
        let dir = std::env::temp_dir().join(format!("gestion-companies-{}", Uuid::new_v4()));
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt: JwtSettings::new("test-secret", 5),
            logos: LogoStorage::new(dir).await.unwrap(),
        })
    }

    fn files(state: &AppState) -> usize {
        std::fs::read_dir(state.logos.dir()).unwrap().count()
    }

    #[tokio::test]
    async fn logo_for_missing_company_leaves_no_file() {
        let state = state().await;

        let err = store_logo(&state, 42, "png", b"\x89PNG").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(files(&state), 0);

        let _ = std::fs::remove_dir_all(state.logos.dir());
    }

    #[tokio::test]
    async fn replacing_a_logo_keeps_one_file() {
        let state = state().await;
        let admin = state.db.create_user("A", "a@example.com", "hash", 2, None).unwrap();
        let company = state.db.create_company("Acme", "1", None, "Lima", admin).unwrap();

        let first = store_logo(&state, company, "png", b"one").await.unwrap();
        let second = store_logo(&state, company, "png", b"two").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(files(&state), 1);

        let _ = std::fs::remove_dir_all(state.logos.dir());
    }
}
