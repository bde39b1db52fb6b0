use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const ROLE_SUPER_ADMIN: i64 = 1;
pub const ROLE_COMPANY_ADMIN: i64 = 2;
pub const ROLE_USER: i64 = 3;

/// Coarse permission level derived from a `roles.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    SuperAdmin,
    CompanyAdmin,
    User,
}

impl RoleKind {
    /// Unknown role ids fall back to the least privileged kind.
    pub fn from_id(id: i64) -> Self {
        match id {
            ROLE_SUPER_ADMIN => Self::SuperAdmin,
            ROLE_COMPANY_ADMIN => Self::CompanyAdmin,
            _ => Self::User,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Self::SuperAdmin => ROLE_SUPER_ADMIN,
            Self::CompanyAdmin => ROLE_COMPANY_ADMIN,
            Self::User => ROLE_USER,
        }
    }

    /// Super admins and company admins may manage users, memberships and campaigns.
    pub fn is_manager(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::CompanyAdmin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub role_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Inactive,
}

impl CompanyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status '{0}', expected 'active' or 'inactive'")]
pub struct InvalidStatus(pub String);

impl FromStr for CompanyStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub ruc: String,
    pub description: Option<String>,
    pub address: String,
    pub admin_user_id: Option<i64>,
    pub admin_user_name: Option<String>,
    pub status: CompanyStatus,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The company shown in a user's header: their earliest membership.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MainCompany {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

/// A user as listed inside a company or campaign.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub role_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Campana {
    pub id: i64,
    pub company_id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_kind_from_unknown_id_is_user() {
        assert_eq!(RoleKind::from_id(1), RoleKind::SuperAdmin);
        assert_eq!(RoleKind::from_id(2), RoleKind::CompanyAdmin);
        assert_eq!(RoleKind::from_id(3), RoleKind::User);
        assert_eq!(RoleKind::from_id(42), RoleKind::User);
    }

    #[test]
    fn company_status_parses_only_known_values() {
        assert_eq!("active".parse::<CompanyStatus>(), Ok(CompanyStatus::Active));
        assert_eq!("inactive".parse::<CompanyStatus>(), Ok(CompanyStatus::Inactive));
        assert!("Active".parse::<CompanyStatus>().is_err());
        assert!("".parse::<CompanyStatus>().is_err());
    }

    #[test]
    fn invalid_status_names_the_value() {
        let err = "archived".parse::<CompanyStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid status 'archived', expected 'active' or 'inactive'");
    }

    #[test]
    fn role_kind_id_round_trips() {
        for kind in [RoleKind::SuperAdmin, RoleKind::CompanyAdmin, RoleKind::User] {
            assert_eq!(RoleKind::from_id(kind.id()), kind);
        }
    }
}
