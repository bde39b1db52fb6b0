use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{self, AppState};
use crate::logos::{MAX_LOGO_SIZE, PUBLIC_PREFIX};
use crate::middleware::require_auth;
use crate::openapi::ApiDoc;
use crate::{campanas, companies, dashboard, memberships, roles, users};

/// Full HTTP surface plus Swagger UI at `/api-docs`. CORS and request
/// tracing are layered on by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/roles", get(roles::list_roles))
        // Users
        .route("/api/users/admins", get(users::list_admins))
        .route("/api/users/create", post(users::create_user))
        .route("/api/users/list", get(users::list_users))
        .route(
            "/api/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        // Companies
        .route("/api/companies", get(companies::list_companies).post(companies::create_company))
        .route(
            "/api/companies/{id}",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route("/api/companies/{id}/status", patch(companies::change_status))
        .route(
            "/api/companies/{id}/logo",
            // Leave headroom for the multipart envelope around the file itself.
            post(companies::upload_logo).layer(DefaultBodyLimit::max(MAX_LOGO_SIZE + 64 * 1024)),
        )
        // User <-> Company
        .route("/api/user-company/assign-company", post(memberships::assign_company))
        .route("/api/user-company/remove-company", post(memberships::remove_company))
        .route("/api/user-company/by-company", get(memberships::users_by_company))
        .route("/api/user-company/my-companies", get(memberships::my_companies))
        .route("/api/user-company/main-company", get(memberships::main_company))
        // Campanas
        .route("/api/campanas", get(campanas::list_campanas).post(campanas::create_campana))
        .route("/api/campanas/assign-user", post(campanas::assign_user))
        .route("/api/campanas/{id}", get(campanas::get_campana))
        .route("/api/campanas/{id}/assignable-users", get(campanas::assignable_users))
        .route("/api/campanas/{id}/users", get(campanas::campana_users))
        .route("/api/campanas/{id}/users/{user_id}", delete(campanas::remove_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.logos.dir()))
        .with_state(state)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is up")),
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
