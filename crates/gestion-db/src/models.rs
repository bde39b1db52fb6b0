//! Database row types. These map directly to SQLite rows.
//! Distinct from gestion-types API models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use gestion_types::models::{Campana, Company, CompanyStatus, MainCompany, Member, Role, User};

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: i64,
    pub role_name: Option<String>,
    pub created_at: String,
}

pub struct RoleRow {
    pub id: i64,
    pub name: String,
}

pub struct CompanyRow {
    pub id: i64,
    pub name: String,
    pub ruc: String,
    pub description: Option<String>,
    pub address: String,
    pub admin_user_id: Option<i64>,
    pub admin_user_name: Option<String>,
    pub status: String,
    pub logo: Option<String>,
    pub created_at: String,
}

pub struct MainCompanyRow {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

pub struct MemberRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub role_name: Option<String>,
}

pub struct CampanaRow {
    pub id: i64,
    pub company_id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub created_at: String,
}

/// Field set written by `Database::update_company`. `None` leaves the column untouched.
pub struct CompanyUpdate<'a> {
    pub name: &'a str,
    pub ruc: &'a str,
    pub description: Option<&'a str>,
    pub address: &'a str,
    pub admin_user_id: Option<i64>,
    pub status: Option<CompanyStatus>,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            role_id: row.role_id,
            role_name: row.role_name,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role { id: row.id, name: row.name }
    }
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|e| {
            warn!("Company {}: {}", row.id, e);
            CompanyStatus::Inactive
        });
        Company {
            id: row.id,
            name: row.name,
            ruc: row.ruc,
            description: row.description,
            address: row.address,
            admin_user_id: row.admin_user_id,
            admin_user_name: row.admin_user_name,
            status,
            logo: row.logo,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<MainCompanyRow> for MainCompany {
    fn from(row: MainCompanyRow) -> Self {
        MainCompany { id: row.id, name: row.name, logo: row.logo }
    }
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: row.id,
            name: row.name,
            email: row.email,
            role_id: row.role_id,
            role_name: row.role_name,
        }
    }
}

impl From<CampanaRow> for Campana {
    fn from(row: CampanaRow) -> Self {
        Campana {
            id: row.id,
            company_id: row.company_id,
            nombre: row.nombre,
            descripcion: row.descripcion,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let sqlite = parse_timestamp("2024-03-01 10:20:30");
        assert_eq!(sqlite.to_rfc3339(), "2024-03-01T10:20:30+00:00");

        let rfc = parse_timestamp("2024-03-01T10:20:30Z");
        assert_eq!(rfc, sqlite);

        assert_eq!(parse_timestamp("garbage"), DateTime::<Utc>::default());
    }
}
