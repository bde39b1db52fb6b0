//! Tenancy rules: which companies a caller may see or manage.
//!
//! A [`Scope`] is built once per request from the token claims plus the
//! caller's memberships. Super admins are unrestricted. Company admins manage
//! the companies they belong to. Regular users only read inside their
//! companies. Every check returns an `ApiError::Forbidden` on denial.

use gestion_types::api::Claims;
use gestion_types::models::RoleKind;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct Scope {
    pub user_id: i64,
    pub email: String,
    pub role: RoleKind,
    /// Membership order; the first entry is the primary company.
    pub companies: Vec<i64>,
}

impl Scope {
    pub fn new(user_id: i64, email: impl Into<String>, role: RoleKind, companies: Vec<i64>) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            companies,
        }
    }

    /// Load the caller's current role and memberships. The role is re-read
    /// from the store so a demotion takes effect before the token expires.
    pub async fn load(state: &AppState, claims: &Claims) -> ApiResult<Self> {
        let user_id = claims.sub;
        let (user, companies) = state
            .query(move |db| Ok((db.get_user(user_id)?, db.company_ids_for_user(user_id)?)))
            .await?;
        let user = user.ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
        Ok(Self::new(user_id, user.email, RoleKind::from_id(user.role_id), companies))
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == RoleKind::SuperAdmin
    }

    pub fn primary_company(&self) -> Option<i64> {
        self.companies.first().copied()
    }

    pub fn belongs_to(&self, company_id: i64) -> bool {
        self.companies.contains(&company_id)
    }

    pub fn can_view_company(&self, company_id: i64) -> bool {
        self.is_super_admin() || self.belongs_to(company_id)
    }

    pub fn require_view(&self, company_id: i64) -> ApiResult<()> {
        if self.can_view_company(company_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access denied to this company"))
        }
    }

    pub fn require_manager(&self) -> ApiResult<()> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Administrator role required"))
        }
    }

    pub fn require_super_admin(&self) -> ApiResult<()> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Super administrator role required"))
        }
    }

    /// Membership, user and campaign management inside `company_id`.
    pub fn require_manager_of(&self, company_id: i64) -> ApiResult<()> {
        match self.role {
            RoleKind::SuperAdmin => Ok(()),
            RoleKind::CompanyAdmin if self.companies.is_empty() => Err(ApiError::forbidden(
                "You must be assigned to a company before managing it",
            )),
            RoleKind::CompanyAdmin if self.belongs_to(company_id) => Ok(()),
            RoleKind::CompanyAdmin => Err(ApiError::forbidden("You can only manage your own company")),
            RoleKind::User => Err(ApiError::forbidden("Administrator role required")),
        }
    }

    /// Company an operation targets: the requested one if the caller may act
    /// on it, otherwise the caller's primary company.
    pub fn resolve_company(&self, requested: Option<i64>) -> ApiResult<i64> {
        match (requested, self.primary_company()) {
            (Some(company_id), _) => {
                self.require_view(company_id)?;
                Ok(company_id)
            }
            (None, Some(primary)) => Ok(primary),
            (None, None) if self.is_super_admin() => {
                Err(ApiError::bad_request("company_id is required"))
            }
            (None, None) => Err(ApiError::forbidden("User has no company assigned")),
        }
    }

    pub fn can_assign_role(&self, role_id: i64) -> bool {
        match self.role {
            RoleKind::SuperAdmin => true,
            RoleKind::CompanyAdmin => RoleKind::from_id(role_id) != RoleKind::SuperAdmin,
            RoleKind::User => false,
        }
    }

    pub fn require_assignable_role(&self, role_id: i64) -> ApiResult<()> {
        if self.can_assign_role(role_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("You cannot assign this role"))
        }
    }

    /// `target_companies` are the target user's memberships.
    pub fn shares_company_with(&self, target_companies: &[i64]) -> bool {
        target_companies.iter().any(|c| self.belongs_to(*c))
    }

    pub fn can_see_user(&self, target_id: i64, target_companies: &[i64]) -> bool {
        self.is_super_admin() || target_id == self.user_id || self.shares_company_with(target_companies)
    }

    /// Editing or deleting another user's account.
    pub fn require_can_manage_user(&self, target_role: RoleKind, target_companies: &[i64]) -> ApiResult<()> {
        match self.role {
            RoleKind::SuperAdmin => Ok(()),
            RoleKind::CompanyAdmin if target_role == RoleKind::SuperAdmin => {
                Err(ApiError::forbidden("You cannot manage a super administrator"))
            }
            RoleKind::CompanyAdmin if self.shares_company_with(target_companies) => Ok(()),
            RoleKind::CompanyAdmin => Err(ApiError::forbidden("User does not belong to your company")),
            RoleKind::User => Err(ApiError::forbidden("Administrator role required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn scope(role: RoleKind, companies: Vec<i64>) -> Scope {
        Scope::new(10, "caller@example.com", role, companies)
    }

    fn status<T: std::fmt::Debug>(result: ApiResult<T>) -> StatusCode {
        result.unwrap_err().status()
    }

    #[test]
    fn super_admin_is_unrestricted() {
        let s = scope(RoleKind::SuperAdmin, vec![]);
        assert!(s.require_manager_of(99).is_ok());
        assert!(s.require_view(99).is_ok());
        assert_eq!(s.resolve_company(Some(99)).unwrap(), 99);
        assert!(s.can_assign_role(1));
        assert!(s.require_can_manage_user(RoleKind::SuperAdmin, &[]).is_ok());
    }

    #[test]
    fn super_admin_without_membership_must_name_a_company() {
        let s = scope(RoleKind::SuperAdmin, vec![]);
        assert_eq!(status(s.resolve_company(None)), StatusCode::BAD_REQUEST);

        let member = scope(RoleKind::SuperAdmin, vec![4]);
        assert_eq!(member.resolve_company(None).unwrap(), 4);
    }

    #[test]
    fn company_admin_without_company_cannot_manage() {
        let s = scope(RoleKind::CompanyAdmin, vec![]);
        let err = s.require_manager_of(1).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("assigned to a company"));
    }

    #[test]
    fn company_admin_is_limited_to_member_companies() {
        let s = scope(RoleKind::CompanyAdmin, vec![3, 5]);
        assert!(s.require_manager_of(3).is_ok());
        assert!(s.require_manager_of(5).is_ok());
        assert_eq!(status(s.require_manager_of(4)), StatusCode::FORBIDDEN);
        assert_eq!(s.resolve_company(None).unwrap(), 3);
        assert_eq!(s.resolve_company(Some(5)).unwrap(), 5);
        assert_eq!(status(s.resolve_company(Some(4))), StatusCode::FORBIDDEN);
    }

    #[test]
    fn company_admin_cannot_grant_super_admin() {
        let s = scope(RoleKind::CompanyAdmin, vec![1]);
        assert!(!s.can_assign_role(1));
        assert!(s.can_assign_role(2));
        assert!(s.can_assign_role(3));
    }

    #[test]
    fn company_admin_manages_colleagues_but_not_super_admins() {
        let s = scope(RoleKind::CompanyAdmin, vec![1]);
        assert!(s.require_can_manage_user(RoleKind::User, &[2, 1]).is_ok());
        assert_eq!(status(s.require_can_manage_user(RoleKind::User, &[2])), StatusCode::FORBIDDEN);
        assert_eq!(
            status(s.require_can_manage_user(RoleKind::SuperAdmin, &[1])),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn regular_user_reads_only() {
        let s = scope(RoleKind::User, vec![7]);
        assert!(s.require_view(7).is_ok());
        assert_eq!(status(s.require_view(8)), StatusCode::FORBIDDEN);
        assert_eq!(status(s.require_manager_of(7)), StatusCode::FORBIDDEN);
        assert_eq!(status(s.require_manager()), StatusCode::FORBIDDEN);
        assert!(!s.can_assign_role(3));
        assert_eq!(status(s.require_can_manage_user(RoleKind::User, &[7])), StatusCode::FORBIDDEN);
    }

    #[test]
    fn user_without_company_cannot_resolve_one() {
        let s = scope(RoleKind::User, vec![]);
        assert_eq!(status(s.resolve_company(None)), StatusCode::FORBIDDEN);
    }

    #[test]
    fn user_visibility() {
        let s = scope(RoleKind::User, vec![7]);
        assert!(s.can_see_user(10, &[]));
        assert!(s.can_see_user(11, &[7]));
        assert!(!s.can_see_user(11, &[8]));
    }
}
