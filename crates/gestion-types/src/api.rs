use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Campana, MainCompany, Member, Role, User};

// -- JWT Claims --

/// JWT claims issued at login and decoded by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role_id: i64,
    pub exp: usize,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// `{ msg, <actor>By }` acknowledgement used by the mutating user endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_by: Option<String>,
}

impl ActionResponse {
    fn empty(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
            id: None,
            created_by: None,
            updated_by: None,
            deleted_by: None,
            assigned_by: None,
            removed_by: None,
        }
    }

    pub fn created(msg: &str, by: &str) -> Self {
        Self { created_by: Some(by.to_string()), ..Self::empty(msg) }
    }

    pub fn updated(msg: &str, by: &str) -> Self {
        Self { updated_by: Some(by.to_string()), ..Self::empty(msg) }
    }

    pub fn deleted(msg: &str, by: &str) -> Self {
        Self { deleted_by: Some(by.to_string()), ..Self::empty(msg) }
    }

    pub fn assigned(msg: &str, by: &str) -> Self {
        Self { assigned_by: Some(by.to_string()), ..Self::empty(msg) }
    }

    pub fn removed(msg: &str, by: &str) -> Self {
        Self { removed_by: Some(by.to_string()), ..Self::empty(msg) }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

// -- Auth --

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub msg: String,
    pub hint: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub msg: String,
    pub token: String,
    pub user: LoginUser,
}

// -- Roles --

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesResponse {
    pub roles: Vec<Role>,
}

// -- Users --

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<i64>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
}

// -- Companies --

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateCompanyRequest {
    pub name: Option<String>,
    pub ruc: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub ruc: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub admin_user_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ChangeStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCompanyResponse {
    pub msg: String,
    #[serde(rename = "companyId")]
    pub company_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoResponse {
    pub msg: String,
    pub logo: String,
}

// -- User <-> Company --

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct MembershipRequest {
    pub user_id: Option<i64>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct CompanyMembersQuery {
    pub company_id: Option<i64>,
    pub role_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompanyMembersResponse {
    pub company_id: i64,
    pub total: usize,
    pub users: Vec<Member>,
}

// -- Campanas --

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateCampanaRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCampanaResponse {
    pub msg: String,
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampanasResponse {
    pub total: usize,
    pub campanas: Vec<Campana>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AssignCampanaUserRequest {
    pub campana_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampanaMembersResponse {
    pub campana_id: i64,
    pub total: usize,
    pub users: Vec<Member>,
}

// -- Dashboard --

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub msg: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub role_id: i64,
    pub main_company: Option<MainCompany>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_fields_use_camel_case() {
        let json = serde_json::to_value(ActionResponse::created("ok", "a@example.com").with_id(4)).unwrap();
        assert_eq!(json["createdBy"], "a@example.com");
        assert_eq!(json["id"], 4);
        assert!(json.get("created_by").is_none());
        assert!(json.get("updatedBy").is_none());
    }

    #[test]
    fn company_and_dashboard_ids_use_camel_case() {
        let created = serde_json::to_value(CreateCompanyResponse { msg: "ok".into(), company_id: 9 }).unwrap();
        assert_eq!(created["companyId"], 9);

        let dashboard = serde_json::to_value(DashboardResponse {
            msg: "hi".into(),
            user_id: 3,
            role_id: 2,
            main_company: None,
        })
        .unwrap();
        assert_eq!(dashboard["userId"], 3);
        assert_eq!(dashboard["role_id"], 2);
    }
}
