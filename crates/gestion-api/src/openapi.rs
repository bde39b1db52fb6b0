//! OpenAPI document served by the Swagger UI at `/api-docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "API de Gestión de Usuarios",
        version = "1.0.0",
        description = "Users, companies, roles and campaigns with per-company access control.",
    ),
    tags(
        (name = "Operations", description = "Liveness"),
        (name = "Auth", description = "Registration and login"),
        (name = "Dashboard", description = "Caller summary"),
        (name = "Roles", description = "Role catalogue"),
        (name = "Users", description = "User accounts"),
        (name = "Companies", description = "Companies and their logos"),
        (name = "UserCompany", description = "Company memberships"),
        (name = "Campanas", description = "Campaigns and their assigned users"),
    ),
    paths(
        crate::routes::health,
        // Auth
        crate::auth::register,
        crate::auth::login,
        crate::dashboard::dashboard,
        crate::roles::list_roles,
        // Users
        crate::users::list_admins,
        crate::users::create_user,
        crate::users::list_users,
        crate::users::get_user,
        crate::users::update_user,
        crate::users::delete_user,
        // Companies
        crate::companies::list_companies,
        crate::companies::get_company,
        crate::companies::create_company,
        crate::companies::update_company,
        crate::companies::change_status,
        crate::companies::delete_company,
        crate::companies::upload_logo,
        // Memberships
        crate::memberships::assign_company,
        crate::memberships::remove_company,
        crate::memberships::users_by_company,
        crate::memberships::my_companies,
        crate::memberships::main_company,
        // Campanas
        crate::campanas::list_campanas,
        crate::campanas::get_campana,
        crate::campanas::create_campana,
        crate::campanas::assign_user,
        crate::campanas::assignable_users,
        crate::campanas::campana_users,
        crate::campanas::remove_user,
    ),
    components(schemas(
        gestion_types::models::User,
        gestion_types::models::Role,
        gestion_types::models::CompanyStatus,
        gestion_types::models::Company,
        gestion_types::models::MainCompany,
        gestion_types::models::Member,
        gestion_types::models::Campana,
        gestion_types::api::MessageResponse,
        gestion_types::api::ActionResponse,
        gestion_types::api::RegisterRequest,
        gestion_types::api::RegisterResponse,
        gestion_types::api::LoginRequest,
        gestion_types::api::LoginUser,
        gestion_types::api::LoginResponse,
        gestion_types::api::RolesResponse,
        gestion_types::api::CreateUserRequest,
        gestion_types::api::UpdateUserRequest,
        gestion_types::api::UsersResponse,
        gestion_types::api::UserResponse,
        gestion_types::api::CreateCompanyRequest,
        gestion_types::api::UpdateCompanyRequest,
        gestion_types::api::ChangeStatusRequest,
        gestion_types::api::CreateCompanyResponse,
        gestion_types::api::LogoResponse,
        gestion_types::api::MembershipRequest,
        gestion_types::api::CompanyMembersResponse,
        gestion_types::api::CreateCampanaRequest,
        gestion_types::api::CreateCampanaResponse,
        gestion_types::api::CampanasResponse,
        gestion_types::api::AssignCampanaUserRequest,
        gestion_types::api::CampanaMembersResponse,
        gestion_types::api::DashboardResponse,
        crate::companies::LogoForm,
    )),
    modifiers(&BearerAuth),
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/users/{id}",
            "/api/companies/{id}/logo",
            "/api/user-company/main-company",
            "/api/campanas/{id}/users/{user_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.paths.paths.len(), 24);
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
