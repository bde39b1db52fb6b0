use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::{MainCompanyRow, MemberRow};

impl Database {
    // -- User <-> Company --

    pub fn assign_user_to_company(&self, user_id: i64, company_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_companies (user_id, company_id) VALUES (?1, ?2)",
                (user_id, company_id),
            )?;
            Ok(())
        })
    }

    /// Returns false when the user was not a member of the company.
    pub fn remove_user_from_company(&self, user_id: i64, company_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM user_companies WHERE user_id = ?1 AND company_id = ?2",
                (user_id, company_id),
            )?;
            Ok(changed > 0)
        })
    }

    /// Company ids of `user_id` in membership order; the first is the primary company.
    pub fn company_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT company_id FROM user_companies
                 WHERE user_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    pub fn main_company_for_user(&self, user_id: i64) -> Result<Option<MainCompanyRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT c.id, c.name, c.logo
                 FROM user_companies uc
                 JOIN companies c ON c.id = uc.company_id
                 WHERE uc.user_id = ?1
                 ORDER BY uc.created_at ASC, uc.id ASC
                 LIMIT 1",
                [user_id],
                |row| {
                    Ok(MainCompanyRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        logo: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Members of `company_id`, optionally narrowed to one role.
    pub fn company_members(&self, company_id: i64, role_id: Option<i64>) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.email, u.role_id, r.name
                 FROM user_companies uc
                 JOIN users u ON u.id = uc.user_id
                 LEFT JOIN roles r ON r.id = u.role_id
                 WHERE uc.company_id = ?1
                   AND (?2 IS NULL OR u.role_id = ?2)
                 ORDER BY u.name ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![company_id, role_id], |row| {
                    Ok(MemberRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        role_id: row.get(3)?,
                        role_name: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_member(&self, user_id: i64, company_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM user_companies WHERE user_id = ?1 AND company_id = ?2",
                    (user_id, company_id),
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}
